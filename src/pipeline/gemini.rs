//! Gemini `generateContent` backend.
//!
//! Maps an [`ExtractionRequest`] onto the REST wire format:
//!
//! ```text
//! POST {endpoint}/models/{model}:generateContent
//! x-goog-api-key: …
//! {
//!   "contents": [{ "parts": [ { "inlineData": { "mimeType", "data" } }, { "text": prompt } ] }],
//!   "generationConfig": { "responseMimeType": "application/json", "responseSchema": … }
//! }
//! ```
//!
//! The reply text is the concatenation of every text part of the first
//! candidate. One attempt per call, no retry.

use crate::backend::{ExtractionBackend, ExtractionRequest};
use crate::config::ExtractionConfig;
use crate::error::ExtractionError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const SERVICE: &str = "gemini";

/// Longest slice of an error body carried into an error message.
const MAX_ERROR_BODY: usize = 300;

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
    Text {
        text: &'a str,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

// ── Backend ───────────────────────────────────────────────────────────────

/// HTTP client for the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: Option<f32>,
    timeout_secs: u64,
}

impl GeminiBackend {
    /// Build a backend from the endpoint, model and timeout in `config`.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ExtractionError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.api_timeout_secs,
        })
    }

    /// Full URL of the `generateContent` method for the configured model.
    pub fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn body<'a>(&self, request: &'a ExtractionRequest) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: &request.document.media_type,
                            data: &request.document.data,
                        },
                    },
                    Part::Text {
                        text: &request.instructions,
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &request.output_schema,
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait::async_trait]
impl ExtractionBackend for GeminiBackend {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn generate(
        &self,
        api_key: &str,
        request: &ExtractionRequest,
    ) -> Result<String, ExtractionError> {
        let start = Instant::now();
        info!("Calling {} model {}", SERVICE, self.model);

        let response = self
            .http
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        debug!(
            "{} answered HTTP {} with {} bytes in {:?}",
            SERVICE,
            status.as_u16(),
            body.len(),
            start.elapsed()
        );

        if !status.is_success() {
            warn!("{} returned HTTP {}", SERVICE, status.as_u16());
            return Err(ExtractionError::HttpStatus {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                body: truncate(body.trim(), MAX_ERROR_BODY),
            });
        }

        reply_text(&body)
    }
}

impl GeminiBackend {
    fn transport_error(&self, e: reqwest::Error) -> ExtractionError {
        warn!("{} request failed: {}", SERVICE, e);
        if e.is_timeout() {
            ExtractionError::Timeout {
                service: SERVICE.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            ExtractionError::Transport {
                service: SERVICE.to_string(),
                detail: e.to_string(),
            }
        }
    }
}

/// Pull the reply text out of a `generateContent` response envelope.
fn reply_text(body: &str) -> Result<String, ExtractionError> {
    let envelope: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ExtractionError::MalformedReply {
            detail: format!("unexpected response envelope: {e}"),
        })?;

    let Some(candidate) = envelope.candidates.first() else {
        let detail = envelope
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map(|r| format!("request blocked: {r}"))
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(ExtractionError::EmptyReply { detail });
    };

    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|p| p.text.as_deref())
        .collect();
    let text = text.trim();

    if text.is_empty() {
        let detail = candidate
            .finish_reason
            .as_deref()
            .map(|r| format!("finish reason {r}"))
            .unwrap_or_else(|| "candidate has no text".to_string());
        return Err(ExtractionError::EmptyReply { detail });
    }

    Ok(text.to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max).collect();
        format!("{cut}\u{2026}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DocumentPart;
    use crate::error::ErrorKind;
    use crate::prompts::EXTRACTION_PROMPT;
    use crate::schema::statement_schema;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn request() -> ExtractionRequest {
        ExtractionRequest {
            document: DocumentPart {
                media_type: "application/pdf".into(),
                data: "JVBERi0=".into(),
            },
            instructions: EXTRACTION_PROMPT.into(),
            output_schema: statement_schema(),
        }
    }

    fn backend() -> GeminiBackend {
        let config = ExtractionConfig::builder()
            .endpoint("http://127.0.0.1:9/v1beta")
            .model("gemini-test")
            .build()
            .unwrap();
        GeminiBackend::new(&config).unwrap()
    }

    /// Answer one request on a local port after `delay`. The handle yields
    /// the request head (request line and headers) as received.
    async fn serve_once(
        status_line: &'static str,
        body: String,
        delay: Duration,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let head = read_request(&mut sock).await;
            tokio::time::sleep(delay).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = sock.write_all(response.as_bytes()).await;
            let _ = sock.shutdown().await;
            head
        });
        (format!("http://{addr}/v1beta"), handle)
    }

    async fn read_request(sock: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = sock.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let content_length = head
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                return head;
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    fn backend_at(endpoint: &str, timeout_secs: u64) -> GeminiBackend {
        let config = ExtractionConfig::builder()
            .endpoint(endpoint)
            .model("gemini-test")
            .api_timeout_secs(timeout_secs)
            .build()
            .unwrap();
        GeminiBackend::new(&config).unwrap()
    }

    #[test]
    fn url_includes_model() {
        assert_eq!(
            backend().url(),
            "http://127.0.0.1:9/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn body_wire_format() {
        let req = request();
        let body = serde_json::to_value(backend().body(&req)).unwrap();
        let parts = &body["contents"][0]["parts"];
        assert_eq!(parts[0]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(parts[0]["inlineData"]["data"], "JVBERi0=");
        assert_eq!(parts[1]["text"], EXTRACTION_PROMPT);
        let gen = &body["generationConfig"];
        assert_eq!(gen["responseMimeType"], "application/json");
        assert_eq!(gen["responseSchema"], statement_schema());
        assert!(gen.get("temperature").is_none());
    }

    #[test]
    fn reply_text_joins_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":" {\"a\":"},{"text":"1} "}]},"finishReason":"STOP"}]}"#;
        assert_eq!(reply_text(body).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn reply_without_candidates_is_schema_error() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = reply_text(body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn reply_with_empty_candidate_reports_finish_reason() {
        let body = r#"{"candidates":[{"finishReason":"MAX_TOKENS"}]}"#;
        let err = reply_text(body).unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"));
    }

    #[test]
    fn non_json_envelope_is_malformed() {
        let err = reply_text("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, ExtractionError::MalformedReply { .. }));
    }

    #[test]
    fn truncate_long_bodies() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc\u{2026}");
    }

    #[tokio::test]
    async fn generate_returns_candidate_text() {
        let envelope = r#"{"candidates":[{"content":{"parts":[{"text":"{\"ok\":true}"}]},"finishReason":"STOP"}]}"#;
        let (endpoint, server) =
            serve_once("200 OK", envelope.to_string(), Duration::ZERO).await;

        let reply = backend_at(&endpoint, 5)
            .generate("secret-key", &request())
            .await
            .unwrap();
        assert_eq!(reply, r#"{"ok":true}"#);

        let head = server.await.unwrap().to_ascii_lowercase();
        assert!(head.starts_with("post /v1beta/models/gemini-test:generatecontent"));
        assert!(head.contains("x-goog-api-key: secret-key"));
    }

    #[tokio::test]
    async fn error_status_keeps_code_and_truncated_body() {
        let (endpoint, server) =
            serve_once("500 Internal Server Error", "boom".repeat(200), Duration::ZERO).await;

        let err = backend_at(&endpoint, 5)
            .generate("key", &request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        match &err {
            ExtractionError::HttpStatus { status, body, .. } => {
                assert_eq!(*status, 500);
                assert!(body.starts_with("boom"));
                assert_eq!(body.chars().count(), MAX_ERROR_BODY + 1);
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
        assert!(err.to_string().contains("HTTP 500"));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn slow_service_is_timeout() {
        let (endpoint, _server) =
            serve_once("200 OK", "{}".to_string(), Duration::from_millis(2500)).await;

        let err = backend_at(&endpoint, 1)
            .generate("key", &request())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(
            matches!(err, ExtractionError::Timeout { secs: 1, .. }),
            "got {err:?}"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        // Port 9 (discard) is closed on test machines; the connect fails fast.
        let err = backend().generate("key", &request()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
