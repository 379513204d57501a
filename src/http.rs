//! Minimal HTTP plumbing shared by the Notion and note.com transports.
//!
//! Transports hand back a fully-buffered [`HttpResponse`] instead of a live
//! `reqwest::Response`, so retry and status-classification logic can be
//! exercised against scripted responses in tests.

use reqwest::header::{CONTENT_TYPE, RETRY_AFTER};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("notion2note/", env!("CARGO_PKG_VERSION"));

/// A buffered HTTP response.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// Parsed `Retry-After` header, when given in seconds.
    pub retry_after_secs: Option<u64>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Response with the given status and a JSON body.
    pub fn json_body(status: u16, body: &Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".to_string()),
            retry_after_secs: None,
            body: body.to_string().into_bytes(),
        }
    }

    /// Any 2xx status, including 204 No Content.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// First few hundred characters of the body, for error messages.
    pub fn body_snippet(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        let snippet: String = text.chars().take(300).collect();
        snippet.trim().to_string()
    }

    /// Buffer a live reqwest response.
    pub async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let status = response.status().as_u16();
        let headers = response.headers();
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let retry_after_secs = headers
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.bytes().await?.to_vec();
        Ok(Self {
            status,
            content_type,
            retry_after_secs,
            body,
        })
    }
}

/// Build the shared reqwest client.
pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_range_includes_no_content() {
        let mut r = HttpResponse::default();
        for status in [200, 201, 204] {
            r.status = status;
            assert!(r.is_success(), "{status} should succeed");
        }
        for status in [301, 400, 429, 500] {
            r.status = status;
            assert!(!r.is_success(), "{status} should fail");
        }
    }

    #[test]
    fn json_body_round_trips() {
        let r = HttpResponse::json_body(200, &json!({"ok": true}));
        assert_eq!(r.json().unwrap()["ok"], json!(true));
    }

    #[test]
    fn body_snippet_is_bounded() {
        let r = HttpResponse {
            status: 500,
            body: "x".repeat(1000).into_bytes(),
            ..Default::default()
        };
        assert_eq!(r.body_snippet().len(), 300);
    }
}
