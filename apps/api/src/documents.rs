//! Text extraction — turns a path, raw text, or uploaded bytes into plain text.
//! The matching pipeline only ever sees the string this module returns.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// Inputs at most this long that are not an existing file are rejected
/// rather than treated as raw text.
const MIN_RAW_TEXT_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported format: {0}. Allowed: .pdf, .txt, .md")]
    UnsupportedFormat(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract PDF text: {0}")]
    Pdf(String),

    #[error("File is not valid UTF-8 text")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Text,
    Pdf,
}

fn kind_for(name: &str) -> Result<DocumentKind, ExtractionError> {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "txt" | "md" => Ok(DocumentKind::Text),
        "pdf" => Ok(DocumentKind::Pdf),
        "" => Err(ExtractionError::UnsupportedFormat("(no extension)".to_string())),
        other => Err(ExtractionError::UnsupportedFormat(format!(".{other}"))),
    }
}

async fn is_file(input: &str) -> bool {
    tokio::fs::metadata(input)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Loads text from `input`: a path to an existing `.txt`/`.md`/`.pdf` file, or
/// raw text longer than 50 characters. The result is trimmed.
pub async fn load_text(input: &str) -> Result<String, ExtractionError> {
    if is_file(input).await {
        return load_file(Path::new(input)).await;
    }

    if input.chars().count() > MIN_RAW_TEXT_CHARS {
        return Ok(input.trim().to_string());
    }

    Err(ExtractionError::InvalidInput(format!(
        "'{input}' is neither an existing file nor raw text"
    )))
}

/// Like `load_text`, but any input that is not a file is taken as raw text.
pub async fn load_text_or_raw(input: &str) -> Result<String, ExtractionError> {
    if is_file(input).await {
        return load_file(Path::new(input)).await;
    }
    Ok(input.trim().to_string())
}

async fn load_file(path: &Path) -> Result<String, ExtractionError> {
    let shown = path.display().to_string();
    let kind = kind_for(&shown)?;
    let bytes = tokio::fs::read(path).await.map_err(|source| ExtractionError::Io {
        path: shown.clone(),
        source,
    })?;
    debug!("Read {} bytes from {shown}", bytes.len());
    decode(kind, bytes)
}

/// Extracts text from an uploaded file's bytes, dispatching on its extension.
pub fn extract_upload(filename: &str, bytes: Vec<u8>) -> Result<String, ExtractionError> {
    decode(kind_for(filename)?, bytes)
}

fn decode(kind: DocumentKind, bytes: Vec<u8>) -> Result<String, ExtractionError> {
    let text = match kind {
        DocumentKind::Text => String::from_utf8(bytes)?,
        DocumentKind::Pdf => pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?,
    };
    Ok(text.trim().to_string())
}

/// Reduces a client-supplied file name to its final path component.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    let cleaned: String = last
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
