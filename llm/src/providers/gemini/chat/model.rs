use super::api::{GenerateContentRequest, GenerateContentResponse};
use crate::client::Client;
use crate::traffic_log;
use crate::{ChatMessage, ChatModel, ChatRequest, GenerationConfig};
use async_trait::async_trait;

pub struct GeminiChatModel {
    client: Client,
    base_url: String,
    model_name: String,
    generation_config: GenerationConfig,
}

impl GeminiChatModel {
    pub fn new(
        client: Client,
        base_url: String,
        model_name: String,
        generation_config: GenerationConfig,
    ) -> Self {
        GeminiChatModel {
            client,
            base_url,
            model_name,
            generation_config,
        }
    }

    /// Model ids may be given bare ("gemini-1.5-pro") or as resource names
    /// ("models/gemini-1.5-pro").
    fn resource_name(&self) -> String {
        if self.model_name.starts_with("models/") {
            self.model_name.clone()
        } else {
            format!("models/{}", self.model_name)
        }
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        let url = format!("{}/{}:generateContent", self.base_url, self.resource_name());

        let api_request = GenerateContentRequest::new(request, &self.generation_config);
        traffic_log::log_request(&self.model_name, &api_request);

        match self.client.post(url, &api_request).await {
            Ok(response) => {
                let response: GenerateContentResponse = response;
                traffic_log::log_response(&self.model_name, &response);
                ChatMessage::try_from(response)
            }
            Err(e) => {
                traffic_log::log_error(&self.model_name, &e.to_string());
                Err(e)
            }
        }
    }
}
