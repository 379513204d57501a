//! In-memory Notion and note.com doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use notion2note::destination::{DestinationRequest, DestinationTransport, RequestBody};
use notion2note::error::{DestinationError, SourceError};
use notion2note::http::HttpResponse;
use notion2note::source::DownloadedImage;
use notion2note::{DocumentInfo, DocumentSource, ImportConfig, SourceBlock};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const PAGE_ID: &str = "0123abcd-4567-89ef-0123-456789abcdef";
pub const PAGE_URL: &str = "https://www.notion.so/acme/My-Post-0123abcd456789ef0123456789abcdef";

// ── Blocks ──────────────────────────────────────────────────────────────────

fn text(content: &str) -> Value {
    json!([{ "type": "text", "plain_text": content, "text": { "content": content } }])
}

pub fn heading(id: &str, level: u8, content: &str) -> SourceBlock {
    SourceBlock::new(id, format!("heading_{level}"), json!({ "rich_text": text(content) }))
}

pub fn paragraph(id: &str, content: &str) -> SourceBlock {
    SourceBlock::new(id, "paragraph", json!({ "rich_text": text(content) }))
}

pub fn bullet(id: &str, content: &str) -> SourceBlock {
    SourceBlock::new(id, "bulleted_list_item", json!({ "rich_text": text(content) }))
}

pub fn image(id: &str, url: &str) -> SourceBlock {
    SourceBlock::new(
        id,
        "image",
        json!({ "type": "file", "file": { "url": url }, "caption": [] }),
    )
}

// ── Notion double ───────────────────────────────────────────────────────────

/// A page held in memory. Counts every call so tests can assert that
/// nothing was fetched.
pub struct FakeSource {
    pub document: DocumentInfo,
    pub blocks: Vec<SourceBlock>,
    /// URL → (bytes, MIME type).
    pub files: HashMap<String, (Vec<u8>, String)>,
    pub database: Vec<DocumentInfo>,
    pub fail_fetch: Option<SourceError>,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(title: &str, blocks: Vec<SourceBlock>) -> Self {
        Self {
            document: DocumentInfo {
                id: PAGE_ID.to_string(),
                title: title.to_string(),
                url: format!("https://www.notion.so/{}", PAGE_ID.replace('-', "")),
                created_time: Some("2026-01-02T03:04:00.000Z".into()),
                last_edited_time: Some("2026-01-03T03:04:00.000Z".into()),
            },
            blocks,
            files: HashMap::new(),
            database: Vec::new(),
            fail_fetch: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_png(mut self, url: &str) -> Self {
        self.files
            .insert(url.to_string(), (vec![0x89, b'P', b'N', b'G'], "image/png".into()));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for FakeSource {
    async fn get_document(&self, id: &str) -> Result<DocumentInfo, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(ref err) = self.fail_fetch {
            return Err(err.clone());
        }
        assert_eq!(id, PAGE_ID, "page id should be canonicalised");
        Ok(self.document.clone())
    }

    async fn get_blocks(&self, _id: &str, _recursive: bool) -> Result<Vec<SourceBlock>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.blocks.clone())
    }

    async fn download_image(&self, url: &str) -> Result<DownloadedImage, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(url)
            .map(|(bytes, mime_type)| DownloadedImage {
                bytes: bytes.clone(),
                mime_type: mime_type.clone(),
            })
            .ok_or_else(|| SourceError::Network(format!("no such file: {url}")))
    }

    async fn list_documents(&self, _database_id: &str) -> Result<Vec<DocumentInfo>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.database.clone())
    }
}

// ── note.com double ─────────────────────────────────────────────────────────

/// Answers presign, storage and post-creation requests the way note.com
/// and S3 do. The n-th presigned upload (0-based) goes to
/// `https://bucket.example/{n}` and its image ends up at
/// `https://assets.example/{n}.png`.
#[derive(Default)]
pub struct FakeNote {
    pub requests: Mutex<Vec<DestinationRequest>>,
    pub presigned: AtomicUsize,
    /// Presign numbers whose storage upload is refused.
    pub reject_storage: HashSet<usize>,
    pub reject_post: bool,
}

impl FakeNote {
    pub fn rejecting_storage(uploads: impl IntoIterator<Item = usize>) -> Self {
        Self {
            reject_storage: uploads.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn rejecting_post() -> Self {
        Self {
            reject_post: true,
            ..Default::default()
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.url.clone())
            .collect()
    }

    /// JSON body of the post-creation request, if one was made.
    pub fn post_body(&self) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.url.ends_with("/api/v1/text_notes"))
            .and_then(|r| match r.body {
                RequestBody::Json(ref value) => Some(value.clone()),
                RequestBody::Multipart(_) => None,
            })
    }

    /// Field names of each storage upload, in the order they were sent.
    pub fn storage_fields(&self) -> Vec<Vec<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.starts_with("https://bucket.example/"))
            .filter_map(|r| match r.body {
                RequestBody::Multipart(ref form) => Some(form.field_names.clone()),
                RequestBody::Json(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl DestinationTransport for FakeNote {
    async fn send(&self, request: DestinationRequest) -> Result<HttpResponse, DestinationError> {
        let url = request.url.clone();
        self.requests.lock().unwrap().push(request);

        if url.ends_with("/api/v3/images/upload/presigned_post") {
            let n = self.presigned.fetch_add(1, Ordering::SeqCst);
            return Ok(HttpResponse::json_body(
                200,
                &json!({ "data": {
                    "url": format!("https://assets.example/{n}.png"),
                    "action": format!("https://bucket.example/{n}"),
                    "post": {
                        "success_action_status": "201",
                        "x-amz-signature": "sig",
                        "key": format!("uploads/{n}.png"),
                        "policy": "cG9saWN5",
                        "x-amz-credential": "cred",
                        "acl": "public-read",
                        "Content-Type": "image/png",
                        "x-amz-algorithm": "AWS4-HMAC-SHA256",
                        "x-amz-date": "20260101T000000Z",
                        "Expires": "2026-01-01T01:00:00Z"
                    }
                }}),
            ));
        }

        if let Some(n) = url.strip_prefix("https://bucket.example/") {
            let rejected = n
                .parse::<usize>()
                .map(|n| self.reject_storage.contains(&n))
                .unwrap_or(false);
            let status = if rejected { 403 } else { 204 };
            return Ok(HttpResponse {
                status,
                body: if rejected {
                    b"<Error><Code>AccessDenied</Code></Error>".to_vec()
                } else {
                    Vec::new()
                },
                ..Default::default()
            });
        }

        if url.ends_with("/api/v1/text_notes") {
            if self.reject_post {
                return Ok(HttpResponse::json_body(
                    500,
                    &json!({ "error": "internal server error" }),
                ));
            }
            return Ok(HttpResponse::json_body(
                201,
                &json!({ "data": { "id": 4242, "key": "n0123abcd" } }),
            ));
        }

        Ok(HttpResponse {
            status: 404,
            ..Default::default()
        })
    }
}

/// A config wired to the two doubles.
pub fn config(source: &Arc<FakeSource>, note: &Arc<FakeNote>) -> ImportConfig {
    ImportConfig::builder()
        .source(source.clone())
        .destination_transport(note.clone())
        .note_base_url("https://note.test")
        .build()
        .unwrap()
}
