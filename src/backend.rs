//! The seam between the extraction client and the AI service.
//!
//! [`ExtractionRequest`] is the service-neutral shape of one call: the
//! document, the instruction prompt, and the output schema. An
//! [`ExtractionBackend`] turns it into a wire request and hands back the raw
//! reply text; validation stays in [`crate::client`].

use crate::error::ExtractionError;
use serde::Serialize;
use serde_json::Value;

/// Media type declared for every uploaded document.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// A document attached inline to a request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPart {
    pub media_type: String,
    /// Standard base64 of the raw file bytes.
    pub data: String,
}

/// One extraction call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    pub document: DocumentPart,
    pub instructions: String,
    pub output_schema: Value,
}

/// Something that can run an [`ExtractionRequest`] against an AI service.
///
/// Implementations make exactly one attempt per call. Transport problems are
/// reported as transport errors; an envelope that carries no reply text is a
/// schema error.
#[async_trait::async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Send the request and return the structured-text reply.
    async fn generate(
        &self,
        api_key: &str,
        request: &ExtractionRequest,
    ) -> Result<String, ExtractionError>;
}
