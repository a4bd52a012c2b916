use serde::{Deserialize, Serialize};

use crate::FileState;

/// Metadata sent when starting an upload
#[derive(Clone, Debug, Serialize)]
pub(crate) struct CreateFileRequest {
    pub(crate) file: NewFile,
}

#[derive(Clone, Debug, Serialize)]
pub(crate) struct NewFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) display_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct Status {
    pub(crate) code: Option<i32>,
    pub(crate) message: Option<String>,
}

/// Files API `File` resource
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct File {
    pub(crate) name: String,

    pub(crate) display_name: Option<String>,

    #[serde(default)]
    pub(crate) mime_type: String,

    /// int64 values are encoded as strings
    pub(crate) size_bytes: Option<String>,

    #[serde(default)]
    pub(crate) uri: String,

    #[serde(default)]
    pub(crate) state: FileState,

    pub(crate) error: Option<Status>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct CreateFileResponse {
    pub(crate) file: File,
}

impl From<File> for crate::RemoteFile {
    fn from(file: File) -> Self {
        crate::RemoteFile {
            size_bytes: file.size_bytes.as_deref().and_then(|s| s.parse().ok()),
            error: file.error.and_then(|status| status.message),
            name: file.name,
            uri: file.uri,
            mime_type: file.mime_type,
            display_name: file.display_name,
            state: file.state,
        }
    }
}

/// Upload endpoint for a REST base URL: `https://host/v1beta` becomes
/// `https://host/upload/v1beta/files`.
pub(crate) fn upload_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match base.rsplit_once('/') {
        Some((origin, version)) if !origin.ends_with('/') => {
            format!("{}/upload/{}/files", origin, version)
        }
        _ => format!("{}/upload/files", base),
    }
}
