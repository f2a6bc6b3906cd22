//! PDF validation and text extraction.
//!
//! Validation happens before any extraction is attempted. Extraction itself is
//! delegated to `pdf-extract` on the blocking pool.

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("Please upload a PDF file")]
    NotPdf,

    #[error("Uploaded file is empty")]
    Empty,

    #[error("File is {size} bytes; the limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Text extraction failed: {0}")]
    Failed(String),

    #[error("No text could be extracted from the PDF")]
    NoText,
}

impl ExtractError {
    /// Rejections that happen before extraction is attempted.
    pub fn is_invalid_file(&self) -> bool {
        matches!(
            self,
            ExtractError::NotPdf | ExtractError::Empty | ExtractError::TooLarge { .. }
        )
    }
}

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Accepts only non-empty PDFs within `limit` bytes. The declared content type
/// (or, without one, the file extension) must say PDF and the bytes must start
/// with the PDF magic.
pub fn validate_upload(upload: &Upload, limit: usize) -> Result<(), ExtractError> {
    if upload.bytes.is_empty() {
        return Err(ExtractError::Empty);
    }
    if upload.bytes.len() > limit {
        return Err(ExtractError::TooLarge {
            size: upload.bytes.len(),
            limit,
        });
    }

    let declared_pdf = match upload.content_type.as_deref() {
        Some(content_type) if !content_type.is_empty() => {
            content_type.to_ascii_lowercase().contains("pdf")
        }
        _ => upload
            .file_name
            .as_deref()
            .map(|name| name.to_ascii_lowercase().ends_with(".pdf"))
            .unwrap_or(false),
    };
    if !declared_pdf || !upload.bytes.starts_with(PDF_MAGIC) {
        warn!(
            file_name = ?upload.file_name,
            content_type = ?upload.content_type,
            "Rejected non-PDF upload"
        );
        return Err(ExtractError::NotPdf);
    }
    Ok(())
}

/// Extracts plain text from PDF bytes.
pub async fn extract_text(bytes: Bytes) -> Result<String, ExtractError> {
    let size = bytes.len();
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ExtractError::Failed(format!("extraction task aborted: {e}")))?
        .map_err(|e| ExtractError::Failed(e.to_string()))?;

    if text.trim().is_empty() {
        return Err(ExtractError::NoText);
    }
    debug!(bytes = size, chars = text.len(), "Extracted text from PDF");
    Ok(text)
}
