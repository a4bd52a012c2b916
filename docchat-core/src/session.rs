use crate::ChatContext;
use llm::{RemoteFile, Role};

/// One entry of the transcript shown to the user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    role: Role,
    text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The complete ephemeral state of one UI instance.
///
/// The remote file and chat context are set together by
/// `SessionController::start_session` and cleared together by `reset`, so a
/// chat context always belongs to the file stored next to it.
#[derive(Debug, Default)]
pub struct Session {
    transcript: Vec<Message>,
    file: Option<RemoteFile>,
    chat: Option<ChatContext>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.transcript
    }

    pub fn remote_file(&self) -> Option<&RemoteFile> {
        self.file.as_ref()
    }

    pub fn chat_context(&self) -> Option<&ChatContext> {
        self.chat.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.chat.is_some()
    }

    /// Drop the transcript, the file reference and the chat context
    pub fn reset(&mut self) {
        self.transcript.clear();
        self.file = None;
        self.chat = None;
    }

    /// Snapshot for rendering
    pub fn view(&self) -> SessionView {
        SessionView {
            messages: self.transcript.clone(),
            file: self.file.clone(),
            model: self.chat.as_ref().map(|c| c.model_name().to_string()),
        }
    }

    pub(crate) fn start(&mut self, file: RemoteFile, chat: ChatContext) {
        self.transcript.clear();
        self.file = Some(file);
        self.chat = Some(chat);
    }

    pub(crate) fn record(&mut self, message: Message) {
        self.transcript.push(message);
    }

    pub(crate) fn active_chat(&mut self) -> Option<(&RemoteFile, &mut ChatContext)> {
        match (&self.file, &mut self.chat) {
            (Some(file), Some(chat)) => Some((file, chat)),
            _ => None,
        }
    }
}

/// Immutable copy of a session, handed to the front end after each change
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionView {
    pub messages: Vec<Message>,
    pub file: Option<RemoteFile>,
    /// Model of the active chat context
    pub model: Option<String>,
}
