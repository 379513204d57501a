//! HTTP transport for the Notion API.

use crate::error::SourceError;
use crate::http::{build_client, HttpResponse};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

/// One request to Notion or to a Notion-hosted file URL.
#[derive(Debug, Clone)]
pub struct SourceRequest {
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    pub body: Option<Value>,
    /// Attach the integration token and `Notion-Version` header. File
    /// downloads use pre-signed URLs and must not carry the token.
    pub authenticated: bool,
}

impl SourceRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            body: None,
            authenticated: true,
        }
    }

    pub fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body: Some(body),
            authenticated: true,
        }
    }

    pub fn download(url: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            ..Self::get(url)
        }
    }
}

/// Sends a request and buffers the response. Non-2xx statuses are returned
/// as `Ok`; only connection-level failures are errors.
#[async_trait]
pub trait SourceTransport: Send + Sync {
    async fn send(&self, request: SourceRequest) -> Result<HttpResponse, SourceError>;
}

/// reqwest-backed transport.
pub struct HttpSourceTransport {
    client: reqwest::Client,
    token: String,
    notion_version: String,
}

impl HttpSourceTransport {
    pub fn new(
        token: impl Into<String>,
        notion_version: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, SourceError> {
        let client = build_client(timeout_secs).map_err(|e| SourceError::Network(e.to_string()))?;
        Ok(Self {
            client,
            token: token.into(),
            notion_version: notion_version.into(),
        })
    }
}

#[async_trait]
impl SourceTransport for HttpSourceTransport {
    async fn send(&self, request: SourceRequest) -> Result<HttpResponse, SourceError> {
        debug!("{} {}", request.method, request.url);
        let mut builder = self.client.request(request.method, &request.url);
        if request.authenticated {
            builder = builder
                .bearer_auth(&self.token)
                .header("Notion-Version", &self.notion_version);
        }
        if let Some(body) = request.body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;
        HttpResponse::read(response)
            .await
            .map_err(|e| SourceError::Network(e.to_string()))
    }
}
