use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

pub mod api;
mod client;
pub mod providers;
pub mod traffic_log;
pub use api::*;
pub use providers::GeminiProvider;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelCapability {
    Text,
    Embedding,
}

#[derive(Clone, Debug)]
pub struct ModelDefinition {
    pub id: String,
    pub display_name: Option<String>,
    pub capabilities: Vec<ModelCapability>,
}

impl ModelDefinition {
    pub fn new(id: impl Into<String>, capabilities: Vec<ModelCapability>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
            capabilities,
        }
    }

    pub fn with_display_name(
        id: impl Into<String>,
        display_name: impl Into<String>,
        capabilities: Vec<ModelCapability>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: Some(display_name.into()),
            capabilities,
        }
    }

    pub fn text_model(id: impl Into<String>) -> Self {
        Self::new(id, vec![ModelCapability::Text])
    }

    /// Get the display name, falling back to id if not set
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }

    pub fn has_capability(&self, capability: &ModelCapability) -> bool {
        self.capabilities.contains(capability)
    }
}

#[async_trait]
pub trait ChatModel {
    fn name(&self) -> &str;

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage>;
}

// Blanket implementation for Arc<dyn ChatModel> to make it easier to work with
#[async_trait]
impl ChatModel for Arc<dyn ChatModel + Send + Sync> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        (**self).chat(request).await
    }
}

#[async_trait]
pub trait ModelProvider {
    /// List available models from the provider with their capabilities
    async fn list_models(&self) -> anyhow::Result<Vec<ModelDefinition>>;

    /// Create a chat model by name, returned as Arc for sharing across threads
    fn create_chat_model(
        &self,
        model_name: &str,
        generation: GenerationConfig,
    ) -> Option<Arc<dyn ChatModel + Send + Sync>>;
}

/// Remote document storage that chat turns can reference by URI.
#[async_trait]
pub trait FileProvider {
    /// Upload a local file. The returned handle may still be processing.
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: Option<&str>,
    ) -> anyhow::Result<RemoteFile>;

    /// Fetch the current state of a previously uploaded file.
    async fn get_file(&self, name: &str) -> anyhow::Result<RemoteFile>;
}

/// A provider offering both file storage and chat models.
pub trait RemoteProvider: ModelProvider + FileProvider + Send + Sync {}

impl<T> RemoteProvider for T where T: ModelProvider + FileProvider + Send + Sync {}
