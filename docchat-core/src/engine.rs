use crate::{DocumentUpload, Session, SessionController, SessionError, SessionView};
use llm::RemoteFile;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const MISSING_KEY_WARNING: &str = "Please enter your Gemini API key with /key <api-key>.";
pub const NO_DOCUMENT_INFO: &str = "Please open a PDF file with /open <path> to start chatting.";

pub enum EngineCommand {
    Configure(String),
    ClearCredential,
    OpenDocument(DocumentUpload),
    SendPrompt(String),
    Reset,
    SetModel(String),
    ListModels,
}

/// Long-running work the engine is doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Uploading(String),
    Thinking,
    ListingModels,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Uploading(name) => write!(f, "Uploading and processing {}", name),
            Activity::Thinking => write!(f, "Waiting for response"),
            Activity::ListingModels => write!(f, "Fetching models"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Busy(Activity),
    /// The current command finished
    Idle,
    /// Snapshot after the session changed; the front end re-renders from it
    SessionUpdated(SessionView),
    DocumentReady(RemoteFile),
    Models(Vec<String>),
    ModelChanged(String),
    CredentialChanged(bool),
    Notice(String),
    Warning(String),
    Error(String),
}

/// Runs controller operations on a background task, one command at a time.
///
/// The task owns the [`Session`]; the front end only sees [`SessionView`]
/// snapshots. Each command is queued with the token that was current when it
/// was sent, so [`ChatEngine::cancel`] also reaches commands still waiting in
/// the queue.
pub struct ChatEngine {
    cmd_tx: mpsc::UnboundedSender<(EngineCommand, CancellationToken)>,
    event_rx: mpsc::UnboundedReceiver<EngineEvent>,
    pending: Arc<Mutex<CancellationToken>>,
    #[allow(dead_code)]
    processor_handle: JoinHandle<()>,
}

impl ChatEngine {
    pub fn new(controller: SessionController) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let processor_handle = tokio::spawn(async move {
            Self::processor_loop(controller, cmd_rx, event_tx).await;
        });

        Self {
            cmd_tx,
            event_rx,
            pending: Arc::new(Mutex::new(CancellationToken::new())),
            processor_handle,
        }
    }

    async fn processor_loop(
        mut controller: SessionController,
        mut cmd_rx: mpsc::UnboundedReceiver<(EngineCommand, CancellationToken)>,
        event_tx: mpsc::UnboundedSender<EngineEvent>,
    ) {
        let mut session = Session::new();

        while let Some((cmd, cancel)) = cmd_rx.recv().await {
            match cmd {
                EngineCommand::Configure(credential) => {
                    controller.configure(&credential);
                    let configured = controller.is_configured();
                    let _ = event_tx.send(EngineEvent::CredentialChanged(configured));
                    let _ = event_tx.send(if configured {
                        EngineEvent::Notice("API key set".to_string())
                    } else {
                        EngineEvent::Warning(MISSING_KEY_WARNING.to_string())
                    });
                }
                EngineCommand::ClearCredential => {
                    controller.clear_credential();
                    let _ = event_tx.send(EngineEvent::CredentialChanged(false));
                    let _ = event_tx.send(EngineEvent::Warning(MISSING_KEY_WARNING.to_string()));
                }
                EngineCommand::OpenDocument(upload) => {
                    let _ = event_tx.send(EngineEvent::Busy(Activity::Uploading(
                        upload.label().to_string(),
                    )));
                    match controller.start_session(&mut session, upload, &cancel).await {
                        Ok(file) => {
                            let _ = event_tx.send(EngineEvent::DocumentReady(file));
                        }
                        Err(e) => report(&event_tx, "Error initializing chat", e),
                    }
                    let _ = event_tx.send(EngineEvent::SessionUpdated(session.view()));
                }
                EngineCommand::SendPrompt(text) => {
                    let _ = event_tx.send(EngineEvent::Busy(Activity::Thinking));
                    if let Err(e) = controller.send_prompt(&mut session, &text, &cancel).await {
                        report(&event_tx, "Error getting response", e);
                    }
                    let _ = event_tx.send(EngineEvent::SessionUpdated(session.view()));
                }
                EngineCommand::Reset => {
                    controller.reset(&mut session);
                    let _ = event_tx.send(EngineEvent::SessionUpdated(session.view()));
                    let _ = event_tx.send(EngineEvent::Notice("Chat history cleared".to_string()));
                }
                EngineCommand::SetModel(name) => match controller.set_model(&name) {
                    Ok(()) => {
                        let _ = event_tx.send(EngineEvent::ModelChanged(controller.model().to_string()));
                    }
                    Err(e) => report(&event_tx, "Error selecting model", e),
                },
                EngineCommand::ListModels => {
                    let _ = event_tx.send(EngineEvent::Busy(Activity::ListingModels));
                    match controller.list_models(&cancel).await {
                        Ok(models) => {
                            let _ = event_tx.send(EngineEvent::Models(models));
                        }
                        Err(e) => report(&event_tx, "Error listing models", e),
                    }
                }
            }

            let _ = event_tx.send(EngineEvent::Idle);
        }
    }

    pub fn send(&self, cmd: EngineCommand) {
        let cancel = lock(&self.pending).clone();
        let _ = self.cmd_tx.send((cmd, cancel));
    }

    pub fn configure(&self, credential: impl Into<String>) {
        self.send(EngineCommand::Configure(credential.into()));
    }

    pub fn open_document(&self, upload: DocumentUpload) {
        self.send(EngineCommand::OpenDocument(upload));
    }

    pub fn send_prompt(&self, text: impl Into<String>) {
        self.send(EngineCommand::SendPrompt(text.into()));
    }

    pub fn reset(&self) {
        self.send(EngineCommand::Reset);
    }

    /// Cancel the running command and every command queued behind it.
    /// Commands sent afterwards run normally.
    pub fn cancel(&self) {
        let mut slot = lock(&self.pending);
        slot.cancel();
        *slot = CancellationToken::new();
    }

    pub fn try_recv(&mut self) -> Option<EngineEvent> {
        match self.event_rx.try_recv() {
            Ok(event) => Some(event),
            Err(_) => None,
        }
    }

    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        self.event_rx.recv().await
    }
}

fn lock(slot: &Mutex<CancellationToken>) -> MutexGuard<'_, CancellationToken> {
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn report(event_tx: &mpsc::UnboundedSender<EngineEvent>, context: &str, error: SessionError) {
    let event = match error {
        SessionError::ConfigurationMissing => EngineEvent::Warning(MISSING_KEY_WARNING.to_string()),
        SessionError::NoActiveDocument => EngineEvent::Notice(NO_DOCUMENT_INFO.to_string()),
        SessionError::Cancelled => EngineEvent::Notice("Cancelled".to_string()),
        error => {
            tracing::error!(%error, "{}", context);
            EngineEvent::Error(format!("{}: {}", context, error))
        }
    };
    let _ = event_tx.send(event);
}
