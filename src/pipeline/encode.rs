//! Document encoding: file bytes → base64 text for the JSON request body.
//!
//! The Gemini API accepts documents as `inlineData` parts, which carry the
//! raw bytes as standard base64 with the media type in a separate field, so
//! no `data:` URI prefix is produced here.

use crate::backend::{DocumentPart, PDF_MEDIA_TYPE};
use crate::error::ExtractionError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A document read from disk and encoded for transport.
#[derive(Debug, Clone)]
pub struct EncodedDocument {
    pub path: PathBuf,
    /// Size of the raw file in bytes.
    pub byte_len: usize,
    /// Standard base64 of the file contents.
    pub data: String,
}

impl EncodedDocument {
    /// The document as a request attachment.
    pub fn to_part(&self) -> DocumentPart {
        DocumentPart {
            media_type: PDF_MEDIA_TYPE.to_string(),
            data: self.data.clone(),
        }
    }
}

/// Read `path` once and base64-encode its contents.
///
/// Fails with a read error if the file cannot be read or is empty.
pub async fn encode_document(path: &Path) -> Result<EncodedDocument, ExtractionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ExtractionError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if bytes.is_empty() {
        return Err(ExtractionError::EmptyDocument {
            path: path.to_path_buf(),
        });
    }

    let data = encode_bytes(&bytes);
    debug!(
        "Encoded {} → {} bytes, {} bytes base64",
        path.display(),
        bytes.len(),
        data.len()
    );

    Ok(EncodedDocument {
        path: path.to_path_buf(),
        byte_len: bytes.len(),
        data,
    })
}

/// Standard base64 with padding.
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
