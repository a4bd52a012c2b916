use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Assistant,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    /// Reference to a file held by the provider, sent by URI instead of inline
    FileRef { uri: String, mime_type: String },
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Default)]
pub struct ChatPayload {
    pub content: Vec<ContentBlock>,
}

impl From<&String> for ChatPayload {
    fn from(text: &String) -> Self {
        ChatPayload::text(text)
    }
}

impl From<String> for ChatPayload {
    fn from(text: String) -> Self {
        ChatPayload::text(text)
    }
}

impl From<&str> for ChatPayload {
    fn from(text: &str) -> Self {
        ChatPayload::text(text)
    }
}

impl ChatPayload {
    pub fn new(content: Vec<ContentBlock>) -> Self {
        ChatPayload { content }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ChatPayload {
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    /// A file reference followed by a text prompt about it
    pub fn file_with_text(file: &RemoteFile, text: impl Into<String>) -> Self {
        ChatPayload {
            content: vec![
                ContentBlock::FileRef {
                    uri: file.uri.clone(),
                    mime_type: file.mime_type.clone(),
                },
                ContentBlock::Text { text: text.into() },
            ],
        }
    }

    pub fn get_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }

    /// Get the URIs of all referenced files
    pub fn get_file_refs(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::FileRef { uri, .. } => Some(uri.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Default)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: Role,
    #[serde(flatten)]
    pub payload: ChatPayload,
}

impl ChatMessage {
    pub fn new(role: Role, payload: ChatPayload) -> Self {
        Self { role, payload }
    }

    pub fn user(payload: ChatPayload) -> Self {
        Self::new(Role::User, payload)
    }

    pub fn assistant(payload: ChatPayload) -> Self {
        Self::new(Role::Assistant, payload)
    }

    pub fn get_text(&self) -> String {
        self.payload.get_text()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatRequest {
    pub(crate) messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn new<'a>(messages: impl IntoIterator<Item = &'a ChatMessage>) -> Self {
        ChatRequest {
            messages: messages.into_iter().cloned().collect(),
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }
}

/// Sampling parameters attached to a chat model
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
}

impl From<&config::GenerationSettings> for GenerationConfig {
    fn from(settings: &config::GenerationSettings) -> Self {
        GenerationConfig {
            temperature: Some(settings.temperature),
            top_p: Some(settings.top_p),
            top_k: Some(settings.top_k),
            max_output_tokens: Some(settings.max_output_tokens),
            response_mime_type: Some(settings.response_mime_type.clone()),
        }
    }
}

/// Processing state of an uploaded file
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    Processing,
    Active,
    Failed,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl FileState {
    pub fn is_processing(&self) -> bool {
        matches!(self, FileState::Processing)
    }
}

impl std::fmt::Display for FileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileState::Processing => "processing",
            FileState::Active => "active",
            FileState::Failed => "failed",
            FileState::Unspecified => "unspecified",
        };
        write!(f, "{}", s)
    }
}

/// Handle to a file stored by the provider
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RemoteFile {
    /// Resource name, e.g. "files/abc-123"
    pub name: String,
    pub uri: String,
    pub mime_type: String,
    pub display_name: Option<String>,
    pub size_bytes: Option<u64>,
    pub state: FileState,
    /// Provider-reported reason when processing failed
    pub error: Option<String>,
}

impl RemoteFile {
    /// Name to show to the user, preferring the display name
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file() -> RemoteFile {
        RemoteFile {
            name: "files/abc".to_string(),
            uri: "https://example.test/v1beta/files/abc".to_string(),
            mime_type: "application/pdf".to_string(),
            display_name: Some("report.pdf".to_string()),
            size_bytes: Some(1024),
            state: FileState::Active,
            error: None,
        }
    }

    #[test]
    fn test_file_with_text_puts_file_first() {
        let payload = ChatPayload::file_with_text(&sample_file(), "Summarize");
        assert_eq!(payload.content.len(), 2);
        assert!(matches!(payload.content[0], ContentBlock::FileRef { .. }));
        assert_eq!(payload.get_text(), "Summarize");
        assert_eq!(
            payload.get_file_refs(),
            vec!["https://example.test/v1beta/files/abc"]
        );
    }

    #[test]
    fn test_file_state_parses_unknown_values() {
        let state: FileState = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(state, FileState::Active);
        let state: FileState = serde_json::from_str("\"PROCESSING\"").unwrap();
        assert!(state.is_processing());
        let state: FileState = serde_json::from_str("\"STATE_UNSPECIFIED\"").unwrap();
        assert_eq!(state, FileState::Unspecified);
        let state: FileState = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(state, FileState::Unspecified);
    }

    #[test]
    fn test_generation_config_from_settings() {
        let config = GenerationConfig::from(&config::GenerationSettings::default());
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["temperature"], 1.0);
        assert_eq!(json["topK"], 40);
        assert_eq!(json["maxOutputTokens"], 8192);
        assert_eq!(json["responseMimeType"], "text/plain");
    }

    #[test]
    fn test_label_falls_back_to_name() {
        let mut file = sample_file();
        assert_eq!(file.label(), "report.pdf");
        file.display_name = None;
        assert_eq!(file.label(), "files/abc");
    }
}
