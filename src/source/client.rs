//! Notion REST client: page metadata, paginated block trees, file downloads.
//!
//! ## Retry Strategy
//!
//! Notion allows roughly three requests per second per integration and
//! answers bursts with HTTP 429. Rate-limit responses and connection
//! failures are retried with exponential backoff (`initial_backoff_ms *
//! 2^(retry-1)`, capped at `max_backoff_ms`, never shorter than a
//! `Retry-After` hint up to that cap). `max_retries` bounds the total number
//! of attempts. Auth, permission and not-found responses are final.
//!
//! Block children are fetched one request at a time, depth-first, so the
//! tree walk never bursts past the rate limit on its own.

use super::model::{DocumentInfo, DownloadedImage, SourceBlock};
use super::transport::{HttpSourceTransport, SourceRequest, SourceTransport};
use super::DocumentSource;
use crate::config::ImportConfig;
use crate::error::{ImportError, SourceError};
use crate::http::HttpResponse;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Url;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Backoff parameters for transient Notion failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            initial_backoff_ms: config.initial_backoff_ms,
            max_backoff_ms: config.max_backoff_ms,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32, retry_after_secs: Option<u64>) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        let backoff = self.initial_backoff_ms.saturating_mul(1u64 << exp);
        let hinted = retry_after_secs.map_or(0, |s| s.saturating_mul(1000));
        Duration::from_millis(backoff.max(hinted).min(self.max_backoff_ms))
    }
}

/// Client for one Notion integration.
pub struct NotionClient {
    transport: Arc<dyn SourceTransport>,
    api_base: String,
    retry: RetryPolicy,
    page_size: u32,
    max_depth: usize,
}

impl NotionClient {
    pub fn new(transport: Arc<dyn SourceTransport>, config: &ImportConfig) -> Self {
        Self {
            transport,
            api_base: config.notion_api_base.trim_end_matches('/').to_string(),
            retry: RetryPolicy::from_config(config),
            page_size: config.page_size,
            max_depth: config.max_depth,
        }
    }

    /// Build an HTTP-backed client from the configured integration token.
    pub fn from_config(config: &ImportConfig) -> Result<Self, ImportError> {
        let token = config
            .notion_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ImportError::NotAuthenticated {
                service: "Notion".into(),
                hint: "Set NOTION_TOKEN to an internal integration token shared with the page."
                    .into(),
            })?;
        let transport = HttpSourceTransport::new(
            token,
            &config.notion_version,
            config.request_timeout_secs,
        )?;
        Ok(Self::new(Arc::new(transport), config))
    }

    /// Send `request`, retrying transient failures.
    ///
    /// `subject` names the object for not-found / no-access errors.
    async fn execute(
        &self,
        request: SourceRequest,
        subject: &str,
    ) -> Result<HttpResponse, SourceError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let err = match self.transport.send(request.clone()).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => classify_status(&response, subject, attempt),
                Err(e) => e,
            };

            if !err.is_transient() || attempt >= self.retry.max_attempts {
                if err.is_transient() {
                    warn!(
                        "Giving up on {} after {} attempts: {}",
                        request.url, attempt, err
                    );
                }
                return Err(err);
            }

            let retry_after = match &err {
                SourceError::RateLimited {
                    retry_after_secs, ..
                } => *retry_after_secs,
                _ => None,
            };
            let delay = self.retry.delay_for(attempt, retry_after);
            warn!(
                "{} {}: attempt {}/{} failed ({}), retrying in {}ms",
                request.method,
                request.url,
                attempt,
                self.retry.max_attempts,
                err.code(),
                delay.as_millis()
            );
            sleep(delay).await;
        }
    }

    async fn execute_json(
        &self,
        request: SourceRequest,
        subject: &str,
    ) -> Result<Value, SourceError> {
        let response = self.execute(request, subject).await?;
        response
            .json()
            .map_err(|e| SourceError::InvalidResponse(format!("invalid JSON: {e}")))
    }

    fn endpoint(&self, path: &str) -> Result<Url, SourceError> {
        Url::parse(&format!("{}/{}", self.api_base, path))
            .map_err(|e| SourceError::InvalidResponse(format!("bad endpoint URL: {e}")))
    }

    /// One level of children, following `next_cursor` until exhausted.
    pub async fn get_children(&self, block_id: &str) -> Result<Vec<SourceBlock>, SourceError> {
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut url = self.endpoint(&format!("blocks/{block_id}/children"))?;
            {
                let mut query = url.query_pairs_mut();
                query.append_pair("page_size", &self.page_size.to_string());
                if let Some(ref c) = cursor {
                    query.append_pair("start_cursor", c);
                }
            }

            let page = self
                .execute_json(SourceRequest::get(url.as_str()), block_id)
                .await?;
            let results = page
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    SourceError::InvalidResponse(format!(
                        "children of {block_id}: missing 'results'"
                    ))
                })?;
            for raw in results {
                blocks.push(SourceBlock::from_json(raw)?);
            }

            match next_cursor(&page) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!("Fetched {} children of {}", blocks.len(), block_id);
        Ok(blocks)
    }

    /// Children of `block_id` with their own children spliced in, depth-first.
    ///
    /// Blocks at `max_depth` are returned without their children; the parser
    /// replaces them with a placeholder anyway.
    fn fetch_tree<'a>(
        &'a self,
        block_id: &'a str,
        depth: usize,
    ) -> BoxFuture<'a, Result<Vec<SourceBlock>, SourceError>> {
        async move {
            let mut blocks = self.get_children(block_id).await?;
            for block in blocks.iter_mut() {
                if !block.has_children || block.is_page_boundary() || depth + 1 > self.max_depth {
                    continue;
                }
                let source_id = block.children_source_id().to_string();
                block.children = self.fetch_tree(&source_id, depth + 1).await?;
            }
            Ok(blocks)
        }
        .boxed()
    }

    async fn query_database(&self, database_id: &str) -> Result<Vec<DocumentInfo>, SourceError> {
        let url = self.endpoint(&format!("databases/{database_id}/query"))?;
        let mut documents = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = json!({ "page_size": self.page_size });
            if let Some(ref c) = cursor {
                body["start_cursor"] = json!(c);
            }
            let page = self
                .execute_json(SourceRequest::post(url.as_str(), body), database_id)
                .await?;
            let results = page
                .get("results")
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    SourceError::InvalidResponse(format!(
                        "query of {database_id}: missing 'results'"
                    ))
                })?;
            for raw in results {
                documents.push(DocumentInfo::from_page_json(raw)?);
            }
            match next_cursor(&page) {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        Ok(documents)
    }
}

#[async_trait]
impl DocumentSource for NotionClient {
    async fn get_document(&self, id: &str) -> Result<DocumentInfo, SourceError> {
        let url = self.endpoint(&format!("pages/{id}"))?;
        let page = self.execute_json(SourceRequest::get(url.as_str()), id).await?;
        let info = DocumentInfo::from_page_json(&page)?;
        info!("Fetched Notion page '{}' ({})", info.title, info.id);
        Ok(info)
    }

    async fn get_blocks(&self, id: &str, recursive: bool) -> Result<Vec<SourceBlock>, SourceError> {
        if recursive {
            let blocks = self.fetch_tree(id, 0).await?;
            info!(
                "Fetched {} blocks under {}",
                SourceBlock::count_tree(&blocks),
                id
            );
            Ok(blocks)
        } else {
            self.get_children(id).await
        }
    }

    async fn download_image(&self, url: &str) -> Result<DownloadedImage, SourceError> {
        let response = self.execute(SourceRequest::download(url), url).await?;
        let mime_type = response
            .content_type
            .as_deref()
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
            .filter(|ct| ct.starts_with("image/"))
            .or_else(|| mime_from_url(url))
            .unwrap_or_else(|| "application/octet-stream".to_string());
        debug!("Downloaded {} bytes ({}) from {}", response.body.len(), mime_type, url);
        Ok(DownloadedImage {
            bytes: response.body,
            mime_type,
        })
    }

    async fn list_documents(&self, database_id: &str) -> Result<Vec<DocumentInfo>, SourceError> {
        self.query_database(database_id).await
    }
}

fn next_cursor(page: &Value) -> Option<String> {
    if page.get("has_more").and_then(Value::as_bool) != Some(true) {
        return None;
    }
    page.get("next_cursor")
        .and_then(Value::as_str)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Map a non-2xx Notion response to a typed error.
fn classify_status(response: &HttpResponse, subject: &str, attempt: u32) -> SourceError {
    let message = response
        .json()
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| response.body_snippet());

    match response.status {
        401 if message.to_ascii_lowercase().contains("expired") => {
            SourceError::TokenExpired { detail: message }
        }
        401 => SourceError::InvalidToken { detail: message },
        403 => SourceError::NoAccess {
            id: subject.to_string(),
        },
        404 => SourceError::PageNotFound {
            id: subject.to_string(),
        },
        429 => SourceError::RateLimited {
            attempts: attempt,
            retry_after_secs: response.retry_after_secs,
        },
        status if status >= 500 => SourceError::Server { status, message },
        status => SourceError::InvalidResponse(format!("HTTP {status}: {message}")),
    }
}

/// Guess an image MIME type from a URL's file extension.
pub(crate) fn mime_from_url(url: &str) -> Option<String> {
    let path = Url::parse(url).ok()?.path().to_ascii_lowercase();
    let ext = path.rsplit('.').next()?;
    let mime = match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime.to_string())
}
