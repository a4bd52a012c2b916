pub mod paths;
pub mod settings;

pub use paths::PathManager;
pub use settings::{GenerationSettings, Settings};

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Environment variable overriding the Gemini base URL.
pub const BASE_URL_ENV: &str = "GEMINI_BASE_URL";

/// Environment variable overriding the configured model.
pub const MODEL_ENV: &str = "DOCCHAT_MODEL";

/// Load environment variables from .env files.
/// First loads from ~/.env (home directory), then from ./.env (project directory).
/// Project directory values take precedence over home directory values.
/// Call this before parsing CLI args to ensure env vars are available.
pub fn load_env_file() {
    // Load from home directory first (lower precedence)
    if let Some(home) = dirs::home_dir() {
        let home_env_path = home.join(".env");
        dotenv::from_path(home_env_path).ok();
    }

    // dotenv::dotenv() loads from current directory's .env and overwrites home values
    dotenv::dotenv().ok();
}

/// API key from the environment, if one is set and non-empty.
pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
}
