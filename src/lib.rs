//! # statement-parser
//!
//! Extract structured data from credit-card statement PDFs with Google Gemini.
//!
//! The PDF is sent as-is to the model together with a fixed instruction and
//! a strict JSON response schema. The reply is validated field by field
//! before it becomes a [`StatementRecord`]; anything incomplete or mistyped
//! is an error, never a partially filled record.
//!
//! ## Flow
//!
//! ```text
//! select_file ──▶ Idle (file selected)
//!                   │ start_extraction
//!                   ▼
//!               Processing ── encode (base64) ── Gemini ── validate
//!                   │
//!          ┌────────┴────────┐
//!          ▼                 ▼
//!       Success            Error
//!          └───── reset ─────┴──▶ Idle
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use statement_parser::{render_state, ExtractionConfig, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GEMINI_API_KEY (or API_KEY)
//!     let mut session = Session::new(ExtractionConfig::from_env())?;
//!     session.select_file("statement.pdf")?;
//!     let state = session.extract().await?;
//!     print!("{}", render_state(state));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `statement-parser` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod schema;
pub mod session;
pub mod state;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{DocumentPart, ExtractionBackend, ExtractionRequest};
pub use client::ExtractionClient;
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ErrorKind, ExtractionError, IllegalTransition, SelectionError};
pub use model::{StatementRecord, TransactionEntry};
pub use pipeline::encode::{encode_document, EncodedDocument};
pub use pipeline::gemini::GeminiBackend;
pub use pipeline::input::{select_input, SelectedInput};
pub use progress::{NoopObserver, Observer, SessionObserver};
pub use schema::decode_statement;
pub use session::{PendingExtraction, Session};
pub use state::{transition, AppState, Event, Phase, StateMachine};
pub use view::{format_currency, render_record, render_state};
