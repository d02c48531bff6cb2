use crate::config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Every way the external call can fail collapses into this one kind.
#[derive(Debug, Error)]
#[error("completion service unavailable: {reason}")]
pub struct ServiceUnavailable {
    reason: String,
}

impl ServiceUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<reqwest::Error> for ServiceUnavailable {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(format!("request timed out: {err}"))
        } else {
            Self::new(err.to_string())
        }
    }
}

/// One request to the completion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub content: String,
}

/// Service reply; `text` is absent when the model produced nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: Option<String>,
}

impl Completion {
    #[allow(dead_code)]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// External text-completion collaborator
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ServiceUnavailable>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Instruction<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Instruction<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenate the text parts of the first candidate.
    fn into_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn request_body(request: &CompletionRequest) -> GenerateContentRequest<'_> {
    GenerateContentRequest {
        system_instruction: Instruction {
            parts: vec![Part {
                text: &request.system_instruction,
            }],
        },
        contents: vec![Content {
            role: "user",
            parts: vec![Part {
                text: &request.content,
            }],
        }],
    }
}

/// Google Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self, ServiceUnavailable> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion, ServiceUnavailable> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceUnavailable::new("no API key configured"))?;

        let url = self.endpoint();
        debug!(model = %self.model, %url, "dispatching completion request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json")
            .json(&request_body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "completion service returned an error status");
            return Err(ServiceUnavailable::new(format!(
                "Gemini API error {status}: {body}"
            )));
        }

        let body = response.text().await?;
        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceUnavailable::new(format!("malformed response: {e}")))?;

        Ok(Completion {
            text: parsed.into_text(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;

    fn question() -> CompletionRequest {
        CompletionRequest {
            system_instruction: "be brief".to_string(),
            content: "What are your hours?".to_string(),
        }
    }

    fn client_for(base_url: String, timeout_secs: u64) -> GeminiClient {
        let config = Config {
            api_key: Some("test-key".to_string()),
            base_url,
            request_timeout_secs: timeout_secs,
            ..Config::default()
        };
        GeminiClient::new(&config).unwrap()
    }

    /// Read one full HTTP request (headers plus `Content-Length` body).
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut raw = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&raw);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if raw.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&raw).into_owned()
    }

    /// Answer a single request with a canned response. Returns the base URL
    /// and a receiver for the raw request the server saw.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (seen_tx, seen_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            let _ = seen_tx.send(request);
        });

        (format!("http://{addr}/v1beta"), seen_rx)
    }

    #[tokio::test]
    async fn reply_text_comes_back_over_http() {
        let (base_url, seen) = serve_once(
            "200 OK",
            r#"{"candidates":[{"content":{"parts":[{"text":"Mon-Thu 9-5, Fri 9-3."}]}}]}"#,
        )
        .await;
        let completion = client_for(base_url, 5).complete(question()).await.unwrap();
        assert_eq!(completion.text.as_deref(), Some("Mon-Thu 9-5, Fri 9-3."));

        let request = seen.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/gemini-3-flash-preview:generateContent "));
        assert!(request.to_lowercase().contains("x-goog-api-key: test-key"));
        assert!(!request.contains("key=test-key"));
        assert!(request.contains(r#""systemInstruction""#));
    }

    #[tokio::test]
    async fn error_status_is_unavailable() {
        let (base_url, _seen) =
            serve_once("500 Internal Server Error", r#"{"error":{"message":"boom"}}"#).await;
        let err = client_for(base_url, 5).complete(question()).await.unwrap_err();
        assert!(err.reason().contains("500"), "{}", err.reason());
    }

    #[tokio::test]
    async fn undecodable_body_is_unavailable() {
        let (base_url, _seen) = serve_once("200 OK", "not json").await;
        let err = client_for(base_url, 5).complete(question()).await.unwrap_err();
        assert!(err.reason().starts_with("malformed response"), "{}", err.reason());
    }

    #[tokio::test]
    async fn body_without_candidates_has_no_text() {
        let (base_url, _seen) = serve_once("200 OK", "{}").await;
        let completion = client_for(base_url, 5).complete(question()).await.unwrap();
        assert_eq!(completion, Completion::default());
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        // Connections queue in the backlog but are never answered.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());

        let err = client_for(base_url, 1).complete(question()).await.unwrap_err();
        assert!(err.reason().starts_with("request timed out"), "{}", err.reason());
        drop(listener);
    }

    #[test]
    fn request_body_matches_generate_content_shape() {
        let request = CompletionRequest {
            system_instruction: "be brief".to_string(),
            content: "What are your hours?".to_string(),
        };
        let body = serde_json::to_value(request_body(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "systemInstruction": { "parts": [{ "text": "be brief" }] },
                "contents": [{ "role": "user", "parts": [{ "text": "What are your hours?" }] }]
            })
        );
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let raw = json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Mon-Thu 9-5, " }, { "text": "Fri 9-3." }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        });
        let parsed: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.into_text().as_deref(), Some("Mon-Thu 9-5, Fri 9-3."));
    }

    #[test]
    fn response_without_text_is_absent() {
        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap();
        assert_eq!(blocked.into_text(), None);

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.into_text(), None);
    }

    #[test]
    fn endpoint_uses_model_and_trims_base() {
        let config = Config {
            api_key: Some("test-key".to_string()),
            base_url: "https://example.test/v1beta/".to_string(),
            model: "gemini-test".to_string(),
            ..Config::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
    }

    #[tokio::test]
    async fn missing_api_key_is_unavailable() {
        let mut client = client_for(Config::default().base_url, 5);
        client.api_key = None;

        let err = client
            .complete(CompletionRequest {
                system_instruction: String::new(),
                content: "hi".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.reason(), "no API key configured");
    }
}
