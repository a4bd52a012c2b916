use llm::{ChatMessage, ChatModel, ChatPayload, ChatRequest};
use std::fmt;
use std::sync::Arc;

/// A conversation with a remote chat model.
///
/// The generateContent API is stateless, so the context keeps every completed
/// turn and resends it with each new message. A failed send leaves the
/// history untouched.
pub struct ChatContext {
    model: Arc<dyn ChatModel + Send + Sync>,
    history: Vec<ChatMessage>,
}

impl ChatContext {
    /// Open a context with empty history
    pub fn new(model: Arc<dyn ChatModel + Send + Sync>) -> Self {
        Self {
            model,
            history: Vec::new(),
        }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Send a user turn and return the reply text
    pub async fn send(&mut self, payload: ChatPayload) -> anyhow::Result<String> {
        let turn = ChatMessage::user(payload);
        let request = ChatRequest::new(self.history.iter().chain(std::iter::once(&turn)));

        let reply = self.model.chat(&request).await?;
        let text = reply.get_text();

        self.history.push(turn);
        self.history.push(reply);
        Ok(text)
    }
}

impl fmt::Debug for ChatContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatContext")
            .field("model", &self.model.name())
            .field("turns", &self.history.len())
            .finish()
    }
}
