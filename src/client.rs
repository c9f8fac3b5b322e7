//! Extraction client: encoded document in, validated [`StatementRecord`] out.
//!
//! The client owns the request contract (prompt + schema) and the decode
//! step. The transport is an [`ExtractionBackend`], by default
//! [`GeminiBackend`]; tests and embedders can inject their own through
//! [`ExtractionConfig::backend`].
//!
//! ## No retry, no cancel
//!
//! Each call to [`ExtractionClient::extract`] makes exactly one backend
//! call. A failed attempt is reported and the user decides whether to start
//! again. The future can be dropped like any other, but nothing in this
//! crate does so once an extraction has started.

use crate::backend::{ExtractionBackend, ExtractionRequest};
use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use crate::model::StatementRecord;
use crate::pipeline::encode::EncodedDocument;
use crate::pipeline::gemini::GeminiBackend;
use crate::prompts::EXTRACTION_PROMPT;
use crate::schema::{decode_statement, statement_schema};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runs one extraction per call against the configured backend.
pub struct ExtractionClient {
    config: ExtractionConfig,
    backend: Arc<dyn ExtractionBackend>,
}

impl std::fmt::Debug for ExtractionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionClient")
            .field("config", &self.config)
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl ExtractionClient {
    /// Create a client, using the injected backend if one is configured.
    pub fn new(config: ExtractionConfig) -> Result<Self, ExtractionError> {
        let backend: Arc<dyn ExtractionBackend> = match config.backend.clone() {
            Some(b) => b,
            None => Arc::new(GeminiBackend::new(&config)?),
        };
        Ok(Self { config, backend })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Build the request sent for `document`.
    pub fn build_request(document: &EncodedDocument) -> ExtractionRequest {
        ExtractionRequest {
            document: document.to_part(),
            instructions: EXTRACTION_PROMPT.to_string(),
            output_schema: statement_schema(),
        }
    }

    /// Extract a statement from an encoded document.
    ///
    /// Fails with a config error before touching the backend when no API key
    /// is configured.
    pub async fn extract(
        &self,
        document: &EncodedDocument,
    ) -> Result<StatementRecord, ExtractionError> {
        let api_key = self.config.require_api_key()?;

        let start = Instant::now();
        let request = Self::build_request(document);
        info!(
            "Extracting {} ({} bytes) via {}",
            document.path.display(),
            document.byte_len,
            self.backend.name()
        );

        let reply = self.backend.generate(api_key, &request).await?;
        let record = decode_statement(&reply).inspect_err(|e| {
            warn!("Reply from {} rejected: {}", self.backend.name(), e);
        })?;

        info!(
            "Extracted {} {} with {} transactions in {}ms",
            record.issuer_name,
            record.card_variant,
            record.transactions.len(),
            start.elapsed().as_millis()
        );
        Ok(record)
    }
}
