//! Session state and control flow for chatting with a remote model about a
//! single uploaded document.
//!
//! This crate provides:
//! - **State**: `Session`, `Message`, `SessionView`
//! - **Remote chat**: `ChatContext`, which carries the turn history for a chat model
//! - **Control**: `SessionController` (configure, start a session, prompt, reset)
//! - **Engine**: `ChatEngine`, a background task that runs controller operations for a UI
//!
//! # Example
//!
//! ```ignore
//! use docchat_core::{DocumentUpload, Session, SessionController};
//!
//! let mut controller = SessionController::gemini(&config::Settings::default());
//! controller.configure(api_key);
//! let mut session = Session::new();
//! let cancel = CancellationToken::new();
//! controller.start_session(&mut session, DocumentUpload::from_path(path).await?, &cancel).await?;
//! controller.send_prompt(&mut session, "What is this document about?", &cancel).await?;
//! ```
pub mod chat;
pub mod controller;
pub mod engine;
pub mod error;
pub mod poll;
pub mod session;
pub mod staging;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::ChatContext;
pub use controller::{Connector, SessionController};
pub use engine::{Activity, ChatEngine, EngineCommand, EngineEvent};
pub use error::SessionError;
pub use poll::PollPolicy;
pub use session::{Message, Session, SessionView};
pub use staging::{DocumentUpload, PDF_MIME_TYPE};
pub use tokio_util::sync::CancellationToken;
