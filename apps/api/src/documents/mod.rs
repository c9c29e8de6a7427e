//! Cover-letter and answer text extraction.
//!
//! Files arrive as raw bytes downloaded from object storage; the kind is
//! decided by the object key's extension, never by sniffing content.

mod docx;
mod hwp;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to extract text from PDF: {0}")]
    Pdf(String),

    #[error("Failed to read DOCX: {0}")]
    Docx(String),

    #[error("Failed to read HWP: {0}")]
    Hwp(String),

    #[error("Text file is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("Document contains no text")]
    EmptyDocument,

    #[error("Extraction task failed: {0}")]
    Extraction(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
    Hwp,
}

impl DocumentKind {
    /// Detects the document kind from an object key such as `text/a.PDF`.
    pub fn from_key(key: &str) -> Result<Self, DocumentError> {
        let extension = key
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .ok_or_else(|| DocumentError::UnsupportedFormat(key.to_string()))?;

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            "txt" => Ok(Self::Txt),
            "hwp" => Ok(Self::Hwp),
            _ => Err(DocumentError::UnsupportedFormat(key.to_string())),
        }
    }
}

/// Extracts plain text from a downloaded document.
/// CPU-bound; async callers should run it inside `spawn_blocking`.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, DocumentError> {
    let text = match kind {
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| DocumentError::Pdf(e.to_string()))?,
        DocumentKind::Docx => docx::extract(bytes)?,
        DocumentKind::Txt => extract_plain(bytes)?,
        DocumentKind::Hwp => hwp::extract(bytes)?,
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(DocumentError::EmptyDocument);
    }
    Ok(text)
}

fn extract_plain(bytes: &[u8]) -> Result<String, DocumentError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    Ok(String::from_utf8(bytes.to_vec())?)
}
