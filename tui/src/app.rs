use crate::commands::{self, Command, HELP};
use crate::history::InputHistory;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use docchat_core::engine::{MISSING_KEY_WARNING, NO_DOCUMENT_INFO};
use docchat_core::{Activity, ChatEngine, DocumentUpload, EngineCommand, EngineEvent, SessionView};
use std::path::Path;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

/// One-line feedback shown under the chat
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Warning(String),
    Error(String),
}

pub struct App {
    pub input: Input,
    pub engine: ChatEngine,
    pub history: InputHistory,
    pub view: SessionView,
    /// Model for the next document
    pub model: String,
    pub configured: bool,
    pub busy: Option<Activity>,
    /// Prompt shown while its reply is outstanding
    pub pending_prompt: Option<String>,
    pub status: Option<Status>,
    /// Help text or model list drawn below the transcript
    pub notes: Vec<String>,
    pub spinner_frame: usize,
    pub scroll_offset: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(engine: ChatEngine, model: String) -> Self {
        Self {
            input: Input::default(),
            engine,
            history: InputHistory::new(),
            view: SessionView::default(),
            model,
            configured: false,
            busy: None,
            pending_prompt: None,
            status: None,
            notes: Vec::new(),
            spinner_frame: 0,
            scroll_offset: 0,
            should_quit: false,
        }
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            (KeyCode::Esc, _) => {
                if self.busy.is_some() {
                    self.engine.cancel();
                    self.status = Some(Status::Info("Cancelling...".to_string()));
                } else {
                    self.input.reset();
                    self.history.reset_position();
                }
            }
            (KeyCode::Up, _) => {
                let current = self.input.value().to_string();
                if let Some(prev) = self.history.prev(&current) {
                    self.input = Input::from(prev.to_string());
                }
            }
            (KeyCode::Down, _) => {
                if let Some(next) = self.history.next() {
                    self.input = Input::from(next.to_string());
                }
            }
            (KeyCode::PageUp, _) => self.scroll_up(10),
            (KeyCode::PageDown, _) => self.scroll_down(10),
            (KeyCode::Enter, _) => {
                let text = self.input.value().to_string();
                self.input.reset();
                self.submit(&text).await;
            }
            _ => {
                self.history.reset_position();
                self.input.handle_event(&Event::Key(key));
            }
        }
    }

    /// Handle a submitted input line
    pub async fn submit(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !commands::is_secret(text) {
            self.history.push(text);
        }

        if text.starts_with('/') {
            match Command::parse(text) {
                Ok(command) => self.run_command(command).await,
                Err(e) => self.status = Some(Status::Error(e.to_string())),
            }
        } else {
            self.send_prompt(text);
        }
    }

    async fn run_command(&mut self, command: Command) {
        self.notes.clear();
        match command {
            Command::Key(Some(key)) => self.engine.configure(key),
            Command::Key(None) => self.engine.send(EngineCommand::ClearCredential),
            Command::Open(path) => self.open(&path).await,
            Command::Clear => {
                if self.busy.is_some() {
                    self.status = Some(Status::Error(
                        "Cannot clear while a request is running (Esc cancels it)".to_string(),
                    ));
                } else {
                    self.scroll_offset = 0;
                    self.engine.reset();
                }
            }
            Command::Model(Some(name)) => self.engine.send(EngineCommand::SetModel(name)),
            Command::Model(None) => {
                self.status = Some(Status::Info(format!("Model: {}", self.model)));
            }
            Command::Models => self.engine.send(EngineCommand::ListModels),
            Command::Help => {
                self.notes = HELP.lines().map(str::to_string).collect();
            }
            Command::Quit => self.should_quit = true,
        }
    }

    /// Read a document from disk and hand it to the engine
    pub async fn open(&mut self, path: &Path) {
        if self.busy.is_some() {
            self.status = Some(Status::Error("Wait for the current request or press Esc".to_string()));
            return;
        }

        match DocumentUpload::from_path(path).await {
            Ok(upload) => {
                self.scroll_offset = 0;
                self.busy = Some(Activity::Uploading(upload.label().to_string()));
                self.engine.open_document(upload);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Could not read document");
                self.status = Some(Status::Error(format!(
                    "Could not read {}: {}",
                    path.display(),
                    e
                )));
            }
        }
    }

    fn send_prompt(&mut self, text: &str) {
        if self.busy.is_some() {
            self.status = Some(Status::Error("Wait for the current request or press Esc".to_string()));
            return;
        }
        self.status = None;
        self.notes.clear();
        self.scroll_offset = 0;
        self.pending_prompt = Some(text.to_string());
        self.busy = Some(Activity::Thinking);
        self.engine.send_prompt(text);
    }

    pub fn check_engine_events(&mut self) {
        while let Some(event) = self.engine.try_recv() {
            self.apply_event(event);
        }
    }

    pub fn apply_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Busy(activity) => {
                self.spinner_frame = 0;
                self.busy = Some(activity);
            }
            EngineEvent::Idle => {
                self.busy = None;
                self.pending_prompt = None;
            }
            EngineEvent::SessionUpdated(view) => {
                self.pending_prompt = None;
                self.view = view;
            }
            EngineEvent::DocumentReady(file) => {
                self.status = Some(Status::Info(format!(
                    "{} is ready. Ask something about the PDF...",
                    file.label()
                )));
            }
            EngineEvent::Models(models) => {
                self.notes = std::iter::once("Available models:".to_string())
                    .chain(models.into_iter().map(|m| format!("  {}", m)))
                    .collect();
            }
            EngineEvent::ModelChanged(model) => {
                self.status = Some(Status::Info(format!(
                    "Model set to {} (applies to the next document)",
                    model
                )));
                self.model = model;
            }
            EngineEvent::CredentialChanged(configured) => self.configured = configured,
            EngineEvent::Notice(msg) => self.status = Some(Status::Info(msg)),
            EngineEvent::Warning(msg) => self.status = Some(Status::Warning(msg)),
            EngineEvent::Error(msg) => self.status = Some(Status::Error(msg)),
        }
    }

    /// Passive hint shown in place of an empty chat
    pub fn placeholder(&self) -> Option<Status> {
        if !self.configured {
            Some(Status::Warning(MISSING_KEY_WARNING.to_string()))
        } else if self.view.file.is_none() && self.busy.is_none() {
            Some(Status::Info(NO_DOCUMENT_INFO.to_string()))
        } else {
            None
        }
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = self.spinner_frame.wrapping_add(1);
    }
}
