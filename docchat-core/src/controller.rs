use crate::poll::{self, PollPolicy};
use crate::staging::{DocumentUpload, PDF_MIME_TYPE, StagedDocument};
use crate::{ChatContext, Message, Session, SessionError};
use llm::{ChatPayload, GeminiProvider, GenerationConfig, RemoteFile, RemoteProvider};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Builds a remote provider for an API key
pub type Connector =
    Arc<dyn Fn(&str) -> anyhow::Result<Arc<dyn RemoteProvider>> + Send + Sync>;

/// Drives the upload, poll and chat cycle for a [`Session`].
///
/// The controller owns the credential and the model settings; the session
/// owns the transcript and the remote references. Every operation validates
/// local preconditions before touching the network.
pub struct SessionController {
    credential: Option<SecretString>,
    provider: Option<Arc<dyn RemoteProvider>>,
    connector: Connector,
    model: String,
    generation: GenerationConfig,
    poll: PollPolicy,
}

impl SessionController {
    pub fn new(connector: Connector, settings: &config::Settings) -> Self {
        Self {
            credential: None,
            provider: None,
            connector,
            model: settings.model.clone(),
            generation: GenerationConfig::from(&settings.generation),
            poll: PollPolicy::from(settings),
        }
    }

    /// Controller talking to the Gemini API at the configured base URL
    pub fn gemini(settings: &config::Settings) -> Self {
        let base_url = settings.base_url.clone();
        let connector: Connector = Arc::new(move |api_key: &str| {
            let provider = GeminiProvider::new(&base_url, api_key)?;
            Ok(Arc::new(provider) as Arc<dyn RemoteProvider>)
        });
        Self::new(connector, settings)
    }

    /// Store the API key. Blank input clears it.
    pub fn configure(&mut self, credential: &str) {
        let credential = credential.trim();
        self.provider = None;
        if credential.is_empty() {
            self.credential = None;
        } else {
            self.credential = Some(SecretString::from(credential.to_string()));
            tracing::info!("API key configured");
        }
    }

    pub fn clear_credential(&mut self) {
        self.credential = None;
        self.provider = None;
    }

    pub fn is_configured(&self) -> bool {
        self.credential.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Model used by the next session. The active chat keeps its model.
    pub fn set_model(&mut self, name: &str) -> Result<(), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::UnknownModel(name.to_string()));
        }
        self.model = name.strip_prefix("models/").unwrap_or(name).to_string();
        tracing::info!(model = %self.model, "Model selected");
        Ok(())
    }

    /// Upload a PDF, wait until the service has processed it, and open a
    /// fresh chat about it.
    ///
    /// The chat model is resolved before anything is staged. After that the
    /// session is reset before the upload starts, so on any later error it is
    /// left empty.
    pub async fn start_session(
        &mut self,
        session: &mut Session,
        upload: DocumentUpload,
        cancel: &CancellationToken,
    ) -> Result<RemoteFile, SessionError> {
        let provider = self.provider()?;
        upload.ensure_pdf()?;
        let model = provider
            .create_chat_model(&self.model, self.generation.clone())
            .ok_or_else(|| SessionError::UnknownModel(self.model.clone()))?;
        session.reset();

        tracing::info!(
            document = upload.label(),
            bytes = upload.bytes().len(),
            "Uploading document"
        );
        let uploaded = {
            let staged = StagedDocument::write(upload.bytes())?;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SessionError::Cancelled),
                result = provider.upload_file(staged.path(), PDF_MIME_TYPE, upload.file_name()) => {
                    result.map_err(SessionError::request_failed)?
                }
            }
        };
        tracing::info!(file = %uploaded.name, state = %uploaded.state, "Upload accepted");

        let file = poll::wait_for_active(&*provider, &uploaded.name, &self.poll, cancel).await?;
        session.start(file.clone(), ChatContext::new(model));
        Ok(file)
    }

    /// Ask a question about the active document and return the reply.
    ///
    /// The user message is recorded before the request goes out and stays in
    /// the transcript when the request fails.
    pub async fn send_prompt(
        &mut self,
        session: &mut Session,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SessionError> {
        if !self.is_configured() {
            return Err(SessionError::ConfigurationMissing);
        }
        if !session.is_active() {
            return Err(SessionError::NoActiveDocument);
        }

        session.record(Message::user(text));
        let (file, chat) = session
            .active_chat()
            .ok_or(SessionError::NoActiveDocument)?;
        let payload = ChatPayload::file_with_text(file, text);

        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            result = chat.send(payload) => result.map_err(SessionError::request_failed)?,
        };
        session.record(Message::assistant(reply.clone()));
        Ok(reply)
    }

    pub fn reset(&self, session: &mut Session) {
        session.reset();
        tracing::debug!("Session reset");
    }

    /// Ids of the models that can chat, without the `models/` prefix
    pub async fn list_models(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, SessionError> {
        let provider = self.provider()?;
        let models = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            result = provider.list_models() => result.map_err(SessionError::request_failed)?,
        };

        let mut ids: Vec<String> = models
            .into_iter()
            .map(|m| m.id.strip_prefix("models/").unwrap_or(&m.id).to_string())
            .collect();
        ids.sort();
        ids.dedup();
        Ok(ids)
    }

    fn provider(&mut self) -> Result<Arc<dyn RemoteProvider>, SessionError> {
        let credential = self
            .credential
            .as_ref()
            .ok_or(SessionError::ConfigurationMissing)?;
        if let Some(provider) = &self.provider {
            return Ok(Arc::clone(provider));
        }

        let provider =
            (self.connector)(credential.expose_secret()).map_err(SessionError::request_failed)?;
        self.provider = Some(Arc::clone(&provider));
        Ok(provider)
    }
}
