use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::DispatchError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/ask";

/// Shown when the endpoint answers with neither `answer` nor `error`
pub const NO_ANSWER: &str = "No answer returned.";

#[derive(Serialize)]
struct AskRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize, Debug, Default)]
struct AskResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl AskResponse {
    fn into_text(self) -> String {
        self.answer
            .filter(|a| !a.is_empty())
            .or(self.error.filter(|e| !e.is_empty()))
            .unwrap_or_else(|| NO_ANSWER.to_string())
    }
}

/// Something that can answer a single question.
#[async_trait]
pub trait AskBackend: Send + Sync {
    async fn ask(&self, query: &str) -> Result<String, DispatchError>;
}

/// HTTP client for the notes `/ask` endpoint
#[derive(Clone)]
pub struct AskClient {
    client: Client,
    endpoint: String,
}

impl AskClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, DispatchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Post `query` and return the cleaned answer text.
    ///
    /// The status code is deliberately not checked: the endpoint reports bad
    /// requests as a JSON `error` field, which is shown as the answer.
    pub async fn query(&self, query: &str) -> Result<String, DispatchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AskRequest { query })
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        let parsed: AskResponse = serde_json::from_slice(&body)?;

        tracing::debug!(%status, bytes = body.len(), "ask endpoint responded");
        Ok(clean_answer(&parsed.into_text()))
    }
}

#[async_trait]
impl AskBackend for AskClient {
    async fn ask(&self, query: &str) -> Result<String, DispatchError> {
        self.query(query).await
    }
}

fn think_block() -> &'static Regex {
    static THINK: OnceLock<Regex> = OnceLock::new();
    THINK.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think regex"))
}

/// Strip `<think>...</think>` reasoning blocks and surrounding whitespace
pub fn clean_answer(raw: &str) -> String {
    think_block().replace_all(raw, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(json: &str) -> String {
        let parsed: AskResponse = serde_json::from_str(json).unwrap();
        clean_answer(&parsed.into_text())
    }

    #[test]
    fn test_think_block_is_removed() {
        assert_eq!(
            text_of(r#"{"answer": "<think>ignore</think> The answer is 42"}"#),
            "The answer is 42"
        );
    }

    #[test]
    fn test_multiline_think_blocks_are_non_greedy() {
        let raw = "<think>\nstep one\nstep two\n</think>Keep this <think>and drop\nthis</think> too";
        assert_eq!(clean_answer(raw), "Keep this  too");
    }

    #[test]
    fn test_unterminated_think_is_kept() {
        assert_eq!(clean_answer("  <think>dangling "), "<think>dangling");
    }

    #[test]
    fn test_error_field_used_without_answer() {
        assert_eq!(text_of(r#"{"error": "bad request"}"#), "bad request");
    }

    #[test]
    fn test_empty_answer_falls_back_to_error() {
        assert_eq!(text_of(r#"{"answer": "", "error": "No query provided"}"#), "No query provided");
    }

    #[test]
    fn test_missing_fields_use_placeholder() {
        assert_eq!(text_of("{}"), NO_ANSWER);
        assert_eq!(text_of(r#"{"answer": null, "error": ""}"#), NO_ANSWER);
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(AskRequest { query: "what is a drone?" }).unwrap();
        assert_eq!(body, serde_json::json!({"query": "what is a drone?"}));
    }
}
