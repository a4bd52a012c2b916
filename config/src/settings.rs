//! Application settings management

use crate::{BASE_URL_ENV, MODEL_ENV, PathManager};
use serde::Deserialize;
use std::fs;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Application settings stored in settings.toml
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Model used for new chat sessions (e.g., "gemini-1.5-pro")
    pub model: String,
    /// Base URL of the Generative Language API
    pub base_url: String,
    /// Delay between file status polls while the service processes an upload
    pub poll_interval_ms: u64,
    /// Number of status polls before an upload is abandoned
    pub max_poll_attempts: u32,
    pub generation: GenerationSettings,
}

/// Sampling parameters sent with every chat turn
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: 1000,
            max_poll_attempts: 300,
            generation: GenerationSettings::default(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = PathManager::settings_path() else {
            return Self::default();
        };

        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        Self::from_toml_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid settings file {}: {}", path.display(), e);
            Self::default()
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply GEMINI_BASE_URL and DOCCHAT_MODEL overrides from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = non_empty_env(BASE_URL_ENV) {
            self.base_url = url;
        }
        if let Some(model) = non_empty_env(MODEL_ENV) {
            self.model = model;
        }
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.model, "gemini-1.5-pro");
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            model = "gemini-2.0-flash"
            max_poll_attempts = 10

            [generation]
            temperature = 0.2
            "#,
        )
        .unwrap();

        assert_eq!(settings.model, "gemini-2.0-flash");
        assert_eq!(settings.max_poll_attempts, 10);
        assert_eq!(settings.poll_interval_ms, 1000);
        assert_eq!(settings.generation.temperature, 0.2);
        assert_eq!(settings.generation.top_k, 40);
        assert_eq!(settings.generation.max_output_tokens, 8192);
    }

    #[test]
    fn test_invalid_type_is_rejected() {
        assert!(Settings::from_toml_str("poll_interval_ms = \"soon\"").is_err());
    }
}
