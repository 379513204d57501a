//! note.com client: two-phase image upload and post creation.
//!
//! ## Image upload
//!
//! 1. `POST /api/v3/images/upload/presigned_post` with the file name returns
//!    a storage endpoint, a set of policy fields and the image's final URL.
//! 2. The file is POSTed to the storage endpoint as `multipart/form-data`,
//!    policy fields first (see [`super::model::STORAGE_FIELD_ORDER`]), `file`
//!    last, without the session cookie. Any 2xx (S3 answers 204) means
//!    stored.

use super::model::{CreatedPost, PostDraft, PresignedPost};
use super::transport::{DestinationRequest, DestinationTransport, HttpDestinationTransport};
use crate::config::ImportConfig;
use crate::error::{DestinationError, ImportError};
use crate::http::HttpResponse;
use crate::pipeline::multipart::MultipartBuilder;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

pub const PRESIGN_PATH: &str = "/api/v3/images/upload/presigned_post";
pub const TEXT_NOTES_PATH: &str = "/api/v1/text_notes";

pub struct NoteClient {
    transport: Arc<dyn DestinationTransport>,
    base_url: String,
}

impl NoteClient {
    pub fn new(transport: Arc<dyn DestinationTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Use the configured transport, or build an HTTP one from the session
    /// cookie.
    pub fn from_config(config: &ImportConfig) -> Result<Self, ImportError> {
        if !config.has_destination_credentials() {
            return Err(ImportError::NotAuthenticated {
                service: "note.com".into(),
                hint: "Set NOTE_SESSION to the _note_session_v5 cookie of a logged-in browser."
                    .into(),
            });
        }
        if let Some(ref transport) = config.destination_transport {
            return Ok(Self::new(transport.clone(), config.note_base_url.as_str()));
        }
        let transport = HttpDestinationTransport::new(
            config.note_session.as_deref().unwrap_or_default(),
            config.note_xsrf_token.clone(),
            config.request_timeout_secs,
        )
        .map_err(ImportError::Publish)?;
        Ok(Self::new(Arc::new(transport), config.note_base_url.as_str()))
    }

    async fn send(&self, request: DestinationRequest) -> Result<HttpResponse, DestinationError> {
        let response = self.transport.send(request).await?;
        match response.status {
            s if (200..300).contains(&s) => Ok(response),
            401 | 403 => Err(DestinationError::Unauthorized {
                status: response.status,
            }),
            status => Err(DestinationError::Http {
                status,
                body: response.body_snippet(),
            }),
        }
    }

    fn parse_json(response: &HttpResponse) -> Result<Value, DestinationError> {
        response
            .json()
            .map_err(|e| DestinationError::InvalidResponse(format!("invalid JSON: {e}")))
    }

    /// Phase 1: ask note.com where to put `file_name`.
    pub async fn presign(&self, file_name: &str) -> Result<PresignedPost, DestinationError> {
        let form = MultipartBuilder::new().text("filename", file_name).build();
        let url = format!("{}{}", self.base_url, PRESIGN_PATH);
        let response = self
            .send(DestinationRequest::multipart(url, form, true))
            .await?;
        let raw = Self::parse_json(&response)?;
        PresignedPost::from_json(&raw).ok_or_else(|| {
            DestinationError::InvalidResponse(format!(
                "presign response for {file_name} lacks an upload URL: {}",
                response.body_snippet()
            ))
        })
    }

    /// Phase 2: POST the file to storage under the presigned policy.
    pub async fn upload_to_storage(
        &self,
        presigned: &PresignedPost,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), DestinationError> {
        let form = presigned
            .fields
            .iter()
            .fold(MultipartBuilder::new(), |form, (k, v)| form.text(k.as_str(), v.as_str()))
            .file("file", file_name, mime_type, bytes)
            .build();
        debug!(
            "Uploading {} to storage with fields {:?}",
            file_name, form.field_names
        );
        self.send(DestinationRequest::multipart(
            presigned.upload_url.as_str(),
            form,
            false,
        ))
        .await?;
        Ok(())
    }

    /// Both phases; returns the public URL of the stored image.
    pub async fn upload_image(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, DestinationError> {
        let presigned = self.presign(file_name).await?;
        self.upload_to_storage(&presigned, file_name, mime_type, bytes)
            .await?;
        Ok(presigned.final_url)
    }

    pub async fn create_post(&self, draft: &PostDraft) -> Result<CreatedPost, DestinationError> {
        let body = serde_json::to_value(draft)
            .map_err(|e| DestinationError::InvalidResponse(e.to_string()))?;
        let url = format!("{}{}", self.base_url, TEXT_NOTES_PATH);
        let response = self.send(DestinationRequest::json(url, body)).await?;
        let raw = Self::parse_json(&response)?;
        let created = CreatedPost::from_json(&raw, &self.base_url);
        info!(
            "Created note.com post {} ({:?})",
            created.key.as_deref().or(created.id.as_deref()).unwrap_or("?"),
            draft.status
        );
        Ok(created)
    }
}
