use super::chat::api::ListModelsResponse;
use super::chat::model::GeminiChatModel;
use super::files::api::{CreateFileRequest, CreateFileResponse, File, NewFile, upload_url};
use crate::client::Client;
use crate::traffic_log;
use crate::{
    ChatModel, FileProvider, GenerationConfig, ModelCapability, ModelDefinition, ModelProvider,
    RemoteFile,
};
use async_trait::async_trait;
use reqwest::header;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

pub struct GeminiProvider {
    client: Client,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let mut key = header::HeaderValue::from_str(api_key.trim())
            .map_err(|_| anyhow::anyhow!("API key contains characters not allowed in a header"))?;
        key.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("x-goog-api-key", key);
        Ok(GeminiProvider {
            client: Client::with_headers(headers)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    async fn list_models(&self) -> anyhow::Result<Vec<ModelDefinition>> {
        let url = format!("{}/models", self.base_url);
        let url = url.as_str();
        let client = &self.client;

        collect_pages(move |page_token| async move {
            let query = page_query(page_token.as_deref());
            client.get_with_query(url, &query).await
        })
        .await
    }

    fn create_chat_model(
        &self,
        model_name: &str,
        generation: GenerationConfig,
    ) -> Option<Arc<dyn ChatModel + Send + Sync>> {
        if model_name.trim().is_empty() {
            return None;
        }
        Some(Arc::new(GeminiChatModel::new(
            self.client.clone(),
            self.base_url.clone(),
            model_name.trim().to_string(),
            generation,
        )))
    }
}

#[async_trait]
impl FileProvider for GeminiProvider {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: Option<&str>,
    ) -> anyhow::Result<RemoteFile> {
        let bytes = tokio::fs::read(path).await?;
        let size = bytes.len();
        let metadata = CreateFileRequest {
            file: NewFile {
                display_name: display_name.map(str::to_string),
            },
        };

        let response: CreateFileResponse = match self
            .client
            .upload_resumable(upload_url(&self.base_url), &metadata, bytes, mime_type)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                traffic_log::log_error("upload", &e.to_string());
                return Err(e);
            }
        };

        traffic_log::log_upload(&response.file.name, mime_type, size);
        tracing::info!(file = %response.file.name, size, "Uploaded file");
        Ok(response.file.into())
    }

    async fn get_file(&self, name: &str) -> anyhow::Result<RemoteFile> {
        let url = format!("{}/{}", self.base_url, name);
        let file: File = match self.client.get(&url).await {
            Ok(file) => file,
            Err(e) => {
                traffic_log::log_error("get_file", &e.to_string());
                return Err(e);
            }
        };
        traffic_log::log_file_state(&file.name, &file.state.to_string());
        Ok(file.into())
    }
}

fn page_query(page_token: Option<&str>) -> Vec<(&'static str, &str)> {
    page_token.map(|token| ("pageToken", token)).into_iter().collect()
}

/// Fetch pages until the listing has no `nextPageToken`, keeping the models
/// that can generate text
async fn collect_pages<F, Fut>(mut fetch: F) -> anyhow::Result<Vec<ModelDefinition>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = anyhow::Result<ListModelsResponse>>,
{
    let mut models = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let response = fetch(page_token.take()).await?;
        models.extend(
            response
                .models
                .into_iter()
                .map(ModelDefinition::from)
                .filter(|m| m.has_capability(&ModelCapability::Text)),
        );
        match response.next_page_token.filter(|t| !t.is_empty()) {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(models)
}
