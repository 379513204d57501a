//! HTTP transport for note.com and its image storage.

use crate::error::DestinationError;
use crate::http::{build_client, HttpResponse};
use crate::pipeline::multipart::MultipartBody;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(Value),
    Multipart(MultipartBody),
}

/// One request to note.com or to the storage endpoint it hands out.
#[derive(Debug, Clone)]
pub struct DestinationRequest {
    pub method: Method,
    pub url: String,
    pub body: RequestBody,
    /// Attach the note.com session cookie. Storage uploads are signed by
    /// their policy and must go without it.
    pub with_session: bool,
}

impl DestinationRequest {
    pub fn json(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body: RequestBody::Json(body),
            with_session: true,
        }
    }

    pub fn multipart(url: impl Into<String>, body: MultipartBody, with_session: bool) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            body: RequestBody::Multipart(body),
            with_session,
        }
    }
}

/// Sends a request and buffers the response; non-2xx statuses are `Ok`.
#[async_trait]
pub trait DestinationTransport: Send + Sync {
    async fn send(&self, request: DestinationRequest) -> Result<HttpResponse, DestinationError>;
}

/// reqwest-backed transport carrying the note.com session.
pub struct HttpDestinationTransport {
    client: reqwest::Client,
    session: String,
    xsrf_token: Option<String>,
}

impl HttpDestinationTransport {
    pub fn new(
        session: impl Into<String>,
        xsrf_token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, DestinationError> {
        let client =
            build_client(timeout_secs).map_err(|e| DestinationError::Network(e.to_string()))?;
        Ok(Self {
            client,
            session: session.into(),
            xsrf_token,
        })
    }
}

#[async_trait]
impl DestinationTransport for HttpDestinationTransport {
    async fn send(&self, request: DestinationRequest) -> Result<HttpResponse, DestinationError> {
        debug!("{} {}", request.method, request.url);
        let mut builder = self.client.request(request.method, &request.url);
        if request.with_session {
            builder = builder
                .header("Cookie", format!("_note_session_v5={}", self.session))
                .header("X-Requested-With", "XMLHttpRequest");
            if let Some(ref token) = self.xsrf_token {
                builder = builder.header("X-XSRF-TOKEN", token);
            }
        }
        builder = match request.body {
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(body) => builder
                .header(CONTENT_TYPE, body.content_type)
                .body(body.bytes),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| DestinationError::Network(e.to_string()))?;
        HttpResponse::read(response)
            .await
            .map_err(|e| DestinationError::Network(e.to_string()))
    }
}
