use crate::SessionError;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub const PDF_MIME_TYPE: &str = "application/pdf";

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Readers accept the header anywhere in the first kilobyte
const PDF_HEADER_WINDOW: usize = 1024;

/// A document picked by the user, not yet uploaded
#[derive(Clone, Debug)]
pub struct DocumentUpload {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: Option<String>, bytes: Vec<u8>) -> Self {
        Self { file_name, bytes }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Name for status lines
    pub fn label(&self) -> &str {
        self.file_name.as_deref().unwrap_or("document")
    }

    pub fn is_pdf(&self) -> bool {
        let window = &self.bytes[..self.bytes.len().min(PDF_HEADER_WINDOW)];
        window.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
    }

    pub(crate) fn ensure_pdf(&self) -> Result<(), SessionError> {
        if self.bytes.is_empty() {
            return Err(SessionError::UnsupportedDocument(format!(
                "{} is empty",
                self.label()
            )));
        }
        if !self.is_pdf() {
            return Err(SessionError::UnsupportedDocument(format!(
                "{} is not a PDF",
                self.label()
            )));
        }
        Ok(())
    }
}

/// Transient on-disk copy of an upload. The file is deleted on drop.
pub(crate) struct StagedDocument {
    file: NamedTempFile,
}

impl StagedDocument {
    pub(crate) fn write(bytes: &[u8]) -> std::io::Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("docchat-")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub(crate) fn path(&self) -> &Path {
        self.file.path()
    }

    #[cfg(test)]
    pub(crate) fn path_buf(&self) -> std::path::PathBuf {
        self.file.path().to_path_buf()
    }
}

impl Drop for StagedDocument {
    fn drop(&mut self) {
        tracing::debug!(path = %self.file.path().display(), "Releasing staged upload");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_detection() {
        let pdf = DocumentUpload::new(Some("a.pdf".into()), b"%PDF-1.7\n...".to_vec());
        assert!(pdf.is_pdf());
        assert!(pdf.ensure_pdf().is_ok());

        let padded = DocumentUpload::new(None, b"\xef\xbb\xbf%PDF-1.4".to_vec());
        assert!(padded.is_pdf());

        let text = DocumentUpload::new(Some("notes.txt".into()), b"hello".to_vec());
        assert!(matches!(
            text.ensure_pdf(),
            Err(SessionError::UnsupportedDocument(msg)) if msg == "notes.txt is not a PDF"
        ));

        let empty = DocumentUpload::new(None, Vec::new());
        assert!(matches!(
            empty.ensure_pdf(),
            Err(SessionError::UnsupportedDocument(msg)) if msg == "document is empty"
        ));
    }

    #[test]
    fn test_staged_file_is_removed_on_drop() {
        let staged = StagedDocument::write(b"%PDF-1.7").unwrap();
        let path = staged.path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_from_path_keeps_file_name() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"%PDF-1.5").unwrap();

        let upload = DocumentUpload::from_path(file.path()).await.unwrap();
        assert!(upload.is_pdf());
        assert!(upload.file_name().unwrap().ends_with(".pdf"));
    }
}
