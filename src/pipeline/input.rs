//! Input selection: validate a user-supplied path before it can be extracted.
//!
//! Only PDFs are accepted. The check looks at the `%PDF` magic bytes rather
//! than the file extension, so a statement saved as `statement.PDF` or with
//! no extension still passes, while a renamed image does not. Rejections are
//! [`SelectionError`] notices; the session state is never touched.

use crate::error::SelectionError;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A file accepted as the source for the next extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedInput {
    pub path: PathBuf,
    /// File name shown to the user.
    pub file_name: String,
    pub size_bytes: u64,
}

/// Validate that `path` is an existing, readable PDF.
pub fn select_input(path: impl AsRef<Path>) -> Result<SelectedInput, SelectionError> {
    let path = path.as_ref().to_path_buf();

    if !path.is_file() {
        return Err(SelectionError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SelectionError::PermissionDenied { path });
        }
        Err(_) => return Err(SelectionError::FileNotFound { path }),
    };

    let mut magic = Vec::with_capacity(PDF_MAGIC.len());
    if let Err(e) = (&mut file).take(PDF_MAGIC.len() as u64).read_to_end(&mut magic) {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            return Err(SelectionError::PermissionDenied { path });
        }
        return Err(SelectionError::FileNotFound { path });
    }
    if magic.as_slice() != PDF_MAGIC {
        return Err(SelectionError::NotAPdf { path, magic });
    }

    let size_bytes = file.metadata().map(|m| m.len()).unwrap_or(0);
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Selected PDF: {} ({} bytes)", path.display(), size_bytes);
    Ok(SelectedInput {
        path,
        file_name,
        size_bytes,
    })
}
