//! Traffic logging for remote API calls
//!
//! Appends every request/response summary to traffic.log in the logs dir.
//! Content is truncated to avoid leaking document text or prompts in logs.

use config::PathManager;
use std::io::Write;

/// Maximum characters to log for content (to protect privacy)
const MAX_CONTENT_LOG_CHARS: usize = 200;

/// Truncate a string for logging, adding ellipsis if truncated
fn truncate_for_log(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}... ({} chars total)", truncated, char_count)
    }
}

fn summarize(value: &impl serde::Serialize) -> String {
    let json = serde_json::to_string(value).unwrap_or_else(|_| "<serialization error>".to_string());
    truncate_for_log(&json, MAX_CONTENT_LOG_CHARS)
}

/// Log a chat request (truncated summary only)
pub fn log_request(model: &str, request: &impl serde::Serialize) {
    log_traffic("REQUEST", &format!("[{}] {}", model, summarize(request)));
}

/// Log a chat response (truncated summary only)
pub fn log_response(model: &str, response: &impl serde::Serialize) {
    log_traffic("RESPONSE", &format!("[{}] {}", model, summarize(response)));
}

/// Log a failed call
pub fn log_error(target: &str, error: &str) {
    log_traffic("ERROR", &format!("[{}] {}", target, error));
}

/// Log a completed file upload
pub fn log_upload(file_name: &str, mime_type: &str, size: usize) {
    log_traffic(
        "UPLOAD",
        &format!("[{}] {} ({} bytes)", file_name, mime_type, size),
    );
}

/// Log an observed file state
pub fn log_file_state(file_name: &str, state: &str) {
    log_traffic("FILE_STATE", &format!("[{}] {}", file_name, state));
}

/// Internal function to write to the log file
fn log_traffic(event_type: &str, message: &str) {
    if let Some(log_path) = PathManager::traffic_log_path() {
        if let Some(parent) = log_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Ok(mut file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let _ = writeln!(file, "[{}] [TRAFFIC] [{}] {}", timestamp, event_type, message);
        }
    }
}
