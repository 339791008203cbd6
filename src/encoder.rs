use std::path::{Path, PathBuf};

use base64::Engine;
use futures::future::try_join_all;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::AttachedDocument;

pub const PDF_MIME: &str = "application/pdf";
pub const MAX_PDF_BYTES: u64 = 32 * 1024 * 1024;
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("File too large. Maximum size: {}MB", .limit / (1024 * 1024))]
    TooLarge { name: String, size: u64, limit: u64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Failed to read {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed data URI")]
    MalformedDataUri,

    #[error("Document type {declared} does not match data URI type {embedded}")]
    MimeMismatch { declared: String, embedded: String },
}

/// Which upstream content block a MIME type is routed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Document,
    Image,
}

impl BlockKind {
    pub fn for_mime(mime: &str) -> Result<Self, EncodeError> {
        let mime = mime.trim().to_ascii_lowercase();
        if mime == PDF_MIME {
            Ok(Self::Document)
        } else if mime.starts_with("image/") && mime.len() > "image/".len() {
            Ok(Self::Image)
        } else {
            Err(EncodeError::UnsupportedType(mime))
        }
    }

    pub fn size_limit(self) -> u64 {
        match self {
            Self::Document => MAX_PDF_BYTES,
            Self::Image => MAX_IMAGE_BYTES,
        }
    }
}

pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some(PDF_MIME),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

fn check_size(name: &str, kind: BlockKind, size: u64) -> Result<(), EncodeError> {
    let limit = kind.size_limit();
    if size > limit {
        warn!("Rejecting {} ({} bytes, limit {})", name, size, limit);
        return Err(EncodeError::TooLarge { name: name.to_string(), size, limit });
    }
    Ok(())
}

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, base64::engine::general_purpose::STANDARD.encode(bytes))
}

/// Splits `data:<mime>;base64,<payload>` into `(mime, payload)`.
pub fn split_data_uri(uri: &str) -> Result<(&str, &str), EncodeError> {
    let (header, payload) = uri.split_once(',').ok_or(EncodeError::MalformedDataUri)?;
    let mime = header
        .strip_prefix("data:")
        .and_then(|h| h.strip_suffix(";base64"))
        .filter(|m| !m.is_empty())
        .ok_or(EncodeError::MalformedDataUri)?;
    Ok((mime, payload))
}

/// Encodes bytes that are already in memory.
pub fn encode_bytes(name: &str, mime: &str, bytes: &[u8]) -> Result<AttachedDocument, EncodeError> {
    let kind = BlockKind::for_mime(mime)?;
    let size = bytes.len() as u64;
    check_size(name, kind, size)?;
    Ok(AttachedDocument {
        name: name.to_string(),
        mime_type: mime.to_string(),
        data: data_uri(mime, bytes),
        size_bytes: size,
    })
}

/// Reads and encodes a file; the MIME type comes from its extension.
pub async fn encode_file(path: impl AsRef<Path>) -> Result<AttachedDocument, EncodeError> {
    let path = path.as_ref();
    let mime = mime_from_extension(path)
        .ok_or_else(|| EncodeError::UnsupportedType(path.display().to_string()))?;
    encode_file_as(path, mime).await
}

/// Like [`encode_file`] with an explicit MIME type. The size ceiling is
/// checked against file metadata before any bytes are read.
pub async fn encode_file_as(path: &Path, mime: &str) -> Result<AttachedDocument, EncodeError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let kind = BlockKind::for_mime(mime)?;

    let io_err = |source: std::io::Error| EncodeError::Io { name: name.clone(), source };
    let metadata = tokio::fs::metadata(path).await.map_err(io_err)?;
    check_size(&name, kind, metadata.len())?;

    let bytes = tokio::fs::read(path).await.map_err(io_err)?;
    debug!("Encoded {} ({} bytes, {})", name, bytes.len(), mime);
    encode_bytes(&name, mime, &bytes)
}

/// Encodes several files concurrently. One failure fails the batch.
pub async fn encode_all(paths: &[PathBuf]) -> Result<Vec<AttachedDocument>, EncodeError> {
    try_join_all(paths.iter().map(encode_file)).await
}
