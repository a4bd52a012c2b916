//! Test doubles for the remote provider traits.

use async_trait::async_trait;
use llm::{
    ChatMessage, ChatModel, ChatPayload, ChatRequest, FileProvider, FileState, GenerationConfig,
    ModelDefinition, ModelProvider, RemoteFile, RemoteProvider,
};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use crate::Connector;

pub(crate) fn remote_file(name: &str, state: FileState) -> RemoteFile {
    RemoteFile {
        name: name.to_string(),
        uri: format!("https://files.test/v1beta/{}", name),
        mime_type: "application/pdf".to_string(),
        display_name: None,
        size_bytes: None,
        state,
        error: None,
    }
}

/// Scripted behaviour and call log shared by every fake handle
#[derive(Default)]
pub(crate) struct FakeState {
    calls: Mutex<Vec<String>>,
    states: Mutex<VecDeque<FileState>>,
    status_error: Mutex<Option<String>>,
    upload_error: Mutex<Option<String>>,
    hold_upload: AtomicBool,
    upload_started: Notify,
    replies: Mutex<VecDeque<anyhow::Result<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    staged_paths: Mutex<Vec<(PathBuf, bool)>>,
    connects: Mutex<Vec<String>>,
}

impl FakeState {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn provider(self: &Arc<Self>) -> FakeProvider {
        FakeProvider {
            state: Arc::clone(self),
        }
    }

    pub(crate) fn chat_model(self: &Arc<Self>, name: &str) -> Arc<dyn ChatModel + Send + Sync> {
        Arc::new(FakeChatModel {
            name: name.to_string(),
            state: Arc::clone(self),
        })
    }

    /// Connector handing out fakes and remembering each key it was given
    pub(crate) fn connector(self: &Arc<Self>) -> Connector {
        let state = Arc::clone(self);
        Arc::new(move |api_key: &str| {
            state.connects.lock().unwrap().push(api_key.to_string());
            Ok(Arc::new(state.provider()) as Arc<dyn RemoteProvider>)
        })
    }

    /// States returned by successive status checks; `Active` once exhausted
    pub(crate) fn push_states(&self, states: impl IntoIterator<Item = FileState>) {
        self.states.lock().unwrap().extend(states);
    }

    pub(crate) fn fail_status(&self, message: &str) {
        *self.status_error.lock().unwrap() = Some(message.to_string());
    }

    pub(crate) fn fail_upload(&self, message: &str) {
        *self.upload_error.lock().unwrap() = Some(message.to_string());
    }

    /// Make uploads hang until the caller gives up on them
    pub(crate) fn hold_upload(&self) {
        self.hold_upload.store(true, Ordering::SeqCst);
    }

    /// Resolves once an upload has received its staged file
    pub(crate) async fn upload_started(&self) {
        self.upload_started.notified().await;
    }

    /// Replies returned by successive chat calls; "ok" once exhausted
    pub(crate) fn push_reply(&self, reply: anyhow::Result<String>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_named(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Paths given to `upload_file`, with whether they existed at the time
    pub(crate) fn staged_paths(&self) -> Vec<(PathBuf, bool)> {
        self.staged_paths.lock().unwrap().clone()
    }

    pub(crate) fn connects(&self) -> Vec<String> {
        self.connects.lock().unwrap().clone()
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }
}

pub(crate) struct FakeProvider {
    state: Arc<FakeState>,
}

#[async_trait]
impl FileProvider for FakeProvider {
    async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
        display_name: Option<&str>,
    ) -> anyhow::Result<RemoteFile> {
        self.state.record("upload");
        self.state
            .staged_paths
            .lock()
            .unwrap()
            .push((path.to_path_buf(), path.exists()));
        self.state.upload_started.notify_one();
        if self.state.hold_upload.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if let Some(message) = self.state.upload_error.lock().unwrap().clone() {
            return Err(anyhow::anyhow!(message));
        }

        let count = self.state.calls_named("upload");
        let mut file = remote_file(&format!("files/doc-{}", count), FileState::Processing);
        file.mime_type = mime_type.to_string();
        file.display_name = display_name.map(str::to_string);
        Ok(file)
    }

    async fn get_file(&self, name: &str) -> anyhow::Result<RemoteFile> {
        self.state.record("get_file");
        if let Some(message) = self.state.status_error.lock().unwrap().clone() {
            return Err(anyhow::anyhow!(message));
        }
        let state = self
            .state
            .states
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(FileState::Active);
        Ok(remote_file(name, state))
    }
}

#[async_trait]
impl ModelProvider for FakeProvider {
    async fn list_models(&self) -> anyhow::Result<Vec<ModelDefinition>> {
        self.state.record("list_models");
        Ok(vec![
            ModelDefinition::text_model("models/gemini-test"),
            ModelDefinition::text_model("models/gemini-test-flash"),
        ])
    }

    fn create_chat_model(
        &self,
        model_name: &str,
        _generation: GenerationConfig,
    ) -> Option<Arc<dyn ChatModel + Send + Sync>> {
        if model_name.is_empty() {
            return None;
        }
        Some(self.state.chat_model(model_name))
    }
}

struct FakeChatModel {
    name: String,
    state: Arc<FakeState>,
}

#[async_trait]
impl ChatModel for FakeChatModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatMessage> {
        self.state.record("chat");
        self.state.requests.lock().unwrap().push(request.clone());
        let reply = self
            .state
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))?;
        Ok(ChatMessage::assistant(ChatPayload::text(reply)))
    }
}
