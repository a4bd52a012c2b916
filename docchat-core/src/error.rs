use thiserror::Error;

/// Failures surfaced to the user by session operations.
///
/// None of these are fatal: the session stays usable and the user may retry.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no API key configured")]
    ConfigurationMissing,

    #[error(
        "file {file} failed to process{}",
        .reason.as_deref().map(|r| format!(": {}", r)).unwrap_or_default()
    )]
    UploadFailed { file: String, reason: Option<String> },

    #[error("file {file} was still processing after {attempts} status checks")]
    PollTimeout { file: String, attempts: u32 },

    #[error("unsupported document: {0}")]
    UnsupportedDocument(String),

    #[error("no document loaded; open a PDF first")]
    NoActiveDocument,

    #[error("unknown model: {0:?}")]
    UnknownModel(String),

    #[error("could not stage upload: {0}")]
    Staging(#[from] std::io::Error),

    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("cancelled")]
    Cancelled,
}

impl SessionError {
    pub(crate) fn request_failed(error: anyhow::Error) -> Self {
        SessionError::RequestFailed(format!("{:#}", error))
    }
}
