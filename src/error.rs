//! Error types for the statement-parser library.
//!
//! Three error types reflect three distinct audiences:
//!
//! * [`ExtractionError`]: anything that stops a statement from being
//!   extracted (unreadable file, missing API key, network failure, reply that
//!   does not match the schema). The session collapses it into its display
//!   message; callers that need the cause use [`ExtractionError::kind`].
//!
//! * [`SelectionError`]: a user-visible notice raised when a chosen file
//!   cannot become the selected input (not a PDF, missing, unreadable).
//!
//! * [`IllegalTransition`]: an intent that is not valid in the current
//!   phase. The state machine rejects it and keeps its state untouched.

use crate::state::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure class of an [`ExtractionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The document could not be read from disk.
    Read,
    /// The service credential is missing or the configuration is invalid.
    Config,
    /// The service call failed: connection, timeout or non-success status.
    Transport,
    /// The reply was not parseable or did not match the statement schema.
    Schema,
}

/// All errors that can end an extraction attempt.
#[derive(Debug, Error)]
pub enum ExtractionError {
    // ── Read errors ───────────────────────────────────────────────────────
    /// The selected file could not be read.
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The selected file has no content.
    #[error("Failed to read '{path}': file is empty")]
    EmptyDocument { path: PathBuf },

    // ── Config errors ─────────────────────────────────────────────────────
    /// No API key was configured for the service.
    #[error("Gemini API key is not configured.\nSet {var} (or API_KEY) in the environment.")]
    MissingCredential { var: &'static str },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Transport errors ──────────────────────────────────────────────────
    /// The HTTP request could not be completed.
    #[error("Failed to parse statement: request to {service} failed: {detail}")]
    Transport { service: String, detail: String },

    /// The HTTP request did not finish within the configured timeout.
    #[error("Failed to parse statement: {service} did not respond within {secs}s")]
    Timeout { service: String, secs: u64 },

    /// The service answered with a non-success status.
    #[error("Failed to parse statement: {service} returned HTTP {status}: {body}")]
    HttpStatus {
        service: String,
        status: u16,
        body: String,
    },

    // ── Schema errors ─────────────────────────────────────────────────────
    /// The reply carried no text to decode.
    #[error("Failed to parse statement: the service returned no content ({detail})")]
    EmptyReply { detail: String },

    /// The reply text is not JSON.
    #[error("Failed to parse statement: reply is not valid JSON: {detail}")]
    MalformedReply { detail: String },

    /// A required field is absent.
    #[error("Failed to parse statement: reply is missing required field '{field}'")]
    MissingField { field: String },

    /// A field is present but has the wrong JSON type.
    #[error("Failed to parse statement: field '{field}' must be a {expected}, got {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A text field that must carry a value is blank.
    #[error("Failed to parse statement: field '{field}' is empty")]
    EmptyField { field: String },
}

impl ExtractionError {
    /// The failure class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::Read { .. } | ExtractionError::EmptyDocument { .. } => ErrorKind::Read,
            ExtractionError::MissingCredential { .. } | ExtractionError::InvalidConfig(_) => {
                ErrorKind::Config
            }
            ExtractionError::Transport { .. }
            | ExtractionError::Timeout { .. }
            | ExtractionError::HttpStatus { .. } => ErrorKind::Transport,
            ExtractionError::EmptyReply { .. }
            | ExtractionError::MalformedReply { .. }
            | ExtractionError::MissingField { .. }
            | ExtractionError::WrongType { .. }
            | ExtractionError::EmptyField { .. } => ErrorKind::Schema,
        }
    }
}

/// A notice raised when a file cannot be selected.
#[derive(Debug, Clone, Error)]
pub enum SelectionError {
    /// The path does not exist.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The process may not read the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file is readable but is not a PDF.
    #[error("Please upload a PDF file. '{path}' is not a PDF (first bytes: {magic:?})")]
    NotAPdf { path: PathBuf, magic: Vec<u8> },

    /// A file can only be chosen while idle.
    #[error("Cannot select a file while {phase}")]
    Busy { phase: Phase },
}

/// An event that has no edge out of the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{event}' is not allowed while {from}")]
pub struct IllegalTransition {
    pub from: Phase,
    pub event: &'static str,
}
