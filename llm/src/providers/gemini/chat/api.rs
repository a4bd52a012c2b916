use serde::{Deserialize, Serialize};

use crate::{ChatPayload, ChatRequest, GenerationConfig};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ModelDefinition {
    pub(crate) name: String,

    pub(crate) version: Option<String>,

    pub(crate) display_name: Option<String>,

    pub(crate) description: Option<String>,

    pub(crate) input_token_limit: Option<u32>,

    pub(crate) output_token_limit: Option<u32>,

    pub(crate) supported_generation_methods: Option<Vec<String>>,
}

impl From<ModelDefinition> for crate::ModelDefinition {
    fn from(model: ModelDefinition) -> Self {
        let mut capabilities = Vec::new();

        for method in model.supported_generation_methods.iter().flatten() {
            let capability = match method.as_str() {
                "generateContent" => crate::ModelCapability::Text,
                "embedContent" => crate::ModelCapability::Embedding,
                _ => continue,
            };
            if !capabilities.contains(&capability) {
                capabilities.push(capability);
            }
        }

        match model.display_name {
            Some(display_name) => {
                crate::ModelDefinition::with_display_name(model.name, display_name, capabilities)
            }
            None => crate::ModelDefinition::new(model.name, capabilities),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListModelsResponse {
    #[serde(default)]
    pub(crate) models: Vec<ModelDefinition>,

    pub(crate) next_page_token: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[default]
    Model,
}

impl From<crate::Role> for Role {
    fn from(value: crate::Role) -> Self {
        match value {
            crate::Role::User => Role::User,
            crate::Role::Assistant => Role::Model,
        }
    }
}

impl From<Role> for crate::Role {
    fn from(value: Role) -> Self {
        match value {
            Role::User => crate::Role::User,
            Role::Model => crate::Role::Assistant,
        }
    }
}

/// Reference to a file uploaded through the Files API
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileData {
    pub(crate) mime_type: String,
    pub(crate) file_uri: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) enum PartType {
    Text(String),
    FileData(FileData),
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) thought: Option<bool>,

    #[serde(flatten)]
    pub(crate) data: PartType,
}

impl From<&crate::ContentBlock> for Part {
    fn from(block: &crate::ContentBlock) -> Self {
        let data = match block {
            crate::ContentBlock::Text { text } => PartType::Text(text.clone()),
            crate::ContentBlock::FileRef { uri, mime_type } => PartType::FileData(FileData {
                mime_type: mime_type.clone(),
                file_uri: uri.clone(),
            }),
        };
        Part {
            thought: None,
            data,
        }
    }
}

impl From<&Part> for Option<crate::ContentBlock> {
    fn from(part: &Part) -> Self {
        // Thought summaries are not part of the answer
        if part.thought == Some(true) {
            return None;
        }
        match &part.data {
            PartType::Text(t) => Some(crate::ContentBlock::Text { text: t.clone() }),
            PartType::FileData(data) => Some(crate::ContentBlock::FileRef {
                uri: data.file_uri.clone(),
                mime_type: data.mime_type.clone(),
            }),
        }
    }
}

// Gemini representation of messages.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct Content {
    #[serde(default)]
    pub(crate) role: Role,
    #[serde(default)]
    pub(crate) parts: Vec<Part>,
}

impl From<&Content> for crate::ChatMessage {
    fn from(content: &Content) -> Self {
        let blocks: Vec<crate::ContentBlock> = content
            .parts
            .iter()
            .filter_map(|p| Option::<crate::ContentBlock>::from(p))
            .collect();

        crate::ChatMessage::new(content.role.into(), ChatPayload::new(blocks))
    }
}

impl From<&crate::ChatMessage> for Content {
    fn from(msg: &crate::ChatMessage) -> Self {
        Content {
            role: msg.role.into(),
            parts: msg.payload.content.iter().map(Part::from).collect(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub(crate) contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub fn new(request: &ChatRequest, generation_config: &GenerationConfig) -> Self {
        let generation_config = if *generation_config == GenerationConfig::default() {
            None
        } else {
            Some(generation_config.clone())
        };
        GenerateContentRequest {
            contents: request.messages.iter().map(Content::from).collect(),
            generation_config,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub(crate) content: Option<Content>,

    pub(crate) finish_reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub(crate) block_reason: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,

    pub(crate) prompt_feedback: Option<PromptFeedback>,
}

impl TryFrom<GenerateContentResponse> for crate::ChatMessage {
    type Error = anyhow::Error;

    fn try_from(response: GenerateContentResponse) -> Result<Self, Self::Error> {
        let block_reason = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason);
        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(match block_reason {
                Some(reason) => anyhow::anyhow!("Prompt was blocked: {}", reason),
                None => anyhow::anyhow!("Response contained no candidates"),
            });
        };
        match candidate.content {
            Some(content) => Ok(crate::ChatMessage::from(&content)),
            None => Err(anyhow::anyhow!(
                "Response candidate has no content (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChatMessage, ContentBlock, FileState, RemoteFile};

    #[test]
    fn test_content_serialization() {
        let content = Content {
            role: Role::User,
            parts: vec![Part {
                thought: Some(true),
                data: PartType::Text("Hello, world!".to_string()),
            }],
        };
        let json = serde_json::to_string(&content).unwrap();
        assert_eq!(
            json,
            r#"{"role":"user","parts":[{"thought":true,"text":"Hello, world!"}]}"#
        );
    }

    #[test]
    fn test_file_and_prompt_become_file_data_and_text_parts() {
        let file = RemoteFile {
            name: "files/abc".to_string(),
            uri: "https://generativelanguage.googleapis.com/v1beta/files/abc".to_string(),
            mime_type: "application/pdf".to_string(),
            display_name: None,
            size_bytes: None,
            state: FileState::Active,
            error: None,
        };
        let message = ChatMessage::user(ChatPayload::file_with_text(&file, "What is this?"));
        let json = serde_json::to_value(Content::from(&message)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "role": "user",
                "parts": [
                    {"fileData": {
                        "mimeType": "application/pdf",
                        "fileUri": "https://generativelanguage.googleapis.com/v1beta/files/abc"
                    }},
                    {"text": "What is this?"}
                ]
            })
        );
    }

    #[test]
    fn test_request_carries_history_and_generation_config() {
        let history = vec![
            ChatMessage::user(ChatPayload::text("Hi")),
            ChatMessage::assistant(ChatPayload::text("Hello")),
        ];
        let config = GenerationConfig {
            temperature: Some(1.0),
            top_k: Some(40),
            ..Default::default()
        };
        let request = GenerateContentRequest::new(&ChatRequest::new(&history), &config);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["generationConfig"]["topK"], 40);
        assert!(json["generationConfig"].get("topP").is_none());
    }

    #[test]
    fn test_default_generation_config_is_omitted() {
        let request = GenerateContentRequest::new(
            &ChatRequest::new(&Vec::<ChatMessage>::new()),
            &GenerationConfig::default(),
        );
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_response_text_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "It is a report."}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        let message = ChatMessage::try_from(response).unwrap();
        assert_eq!(message.role, crate::Role::Assistant);
        assert_eq!(message.get_text(), "It is a report.");
        assert!(matches!(message.payload.content[0], ContentBlock::Text { .. }));
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();

        let err = ChatMessage::try_from(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_candidate_without_content_is_error() {
        let response: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "RECITATION"}]
        }))
        .unwrap();

        let err = ChatMessage::try_from(response).unwrap_err();
        assert!(err.to_string().contains("RECITATION"));
    }

    #[test]
    fn test_model_capabilities_from_methods() {
        let model: ModelDefinition = serde_json::from_value(serde_json::json!({
            "name": "models/gemini-1.5-pro",
            "displayName": "Gemini 1.5 Pro",
            "supportedGenerationMethods": ["generateContent", "countTokens"]
        }))
        .unwrap();

        let model = crate::ModelDefinition::from(model);
        assert_eq!(model.name(), "Gemini 1.5 Pro");
        assert!(model.has_capability(&crate::ModelCapability::Text));
        assert!(!model.has_capability(&crate::ModelCapability::Embedding));
    }
}
