//! Error types for the notion2note library.
//!
//! Failures fall into two groups:
//!
//! * [`ImportError`]: **Fatal**. The import cannot proceed at all (missing
//!   credentials, the Notion page cannot be fetched, note.com rejected the
//!   post). [`crate::import::import_document`] folds it into
//!   [`crate::output::ImportResult::error`]; the other entry points return it
//!   as `Err`.
//!
//! * [`ImageError`]: **Non-fatal**. One image could not be downloaded or
//!   uploaded. The post is still created without that image, and the error
//!   is reported as a warning.
//!
//! The transport-level errors [`SourceError`] (Notion) and
//! [`DestinationError`] (note.com) carry the HTTP cause so callers can
//! branch on it through [`ErrorKind`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Cause taxonomy shared by every error in the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    AuthInvalid,
    AuthExpired,
    NotFound,
    AccessDenied,
    RateLimited,
    NetworkFailure,
    ServerFailure,
    /// Never raised; unsupported blocks are encoded as IR nodes and counted.
    UnsupportedBlock,
    ImageDownloadFailed,
    ImageUploadFailed,
}

/// Errors returned by the Notion client.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// 401 from Notion: the integration token is wrong or revoked.
    #[error("Notion rejected the integration token: {detail}\nCheck NOTION_TOKEN.")]
    InvalidToken { detail: String },

    /// 401 from Notion whose message says the token expired.
    #[error("Notion integration token has expired: {detail}")]
    TokenExpired { detail: String },

    /// 404 from Notion.
    #[error("Notion object '{id}' was not found")]
    PageNotFound { id: String },

    /// 403 from Notion: the page is not shared with the integration.
    #[error("No access to Notion object '{id}'\nShare the page with your integration.")]
    NoAccess { id: String },

    /// 429 from Notion after every attempt was used.
    #[error("Notion rate limit exceeded after {attempts} attempts")]
    RateLimited {
        attempts: u32,
        retry_after_secs: Option<u64>,
    },

    /// Connection, TLS or timeout failure.
    #[error("Network error talking to Notion: {0}")]
    Network(String),

    /// 5xx from Notion.
    #[error("Notion server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Unexpected response from Notion: {0}")]
    InvalidResponse(String),
}

impl SourceError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidToken { .. } => "INVALID_TOKEN",
            Self::TokenExpired { .. } => "TOKEN_EXPIRED",
            Self::PageNotFound { .. } => "PAGE_NOT_FOUND",
            Self::NoAccess { .. } => "NO_ACCESS",
            Self::RateLimited { .. } => "RATE_LIMITED",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Server { .. } => "SERVER_ERROR",
            Self::InvalidResponse(_) => "SERVER_ERROR",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidToken { .. } => ErrorKind::AuthInvalid,
            Self::TokenExpired { .. } => ErrorKind::AuthExpired,
            Self::PageNotFound { .. } => ErrorKind::NotFound,
            Self::NoAccess { .. } => ErrorKind::AccessDenied,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Network(_) => ErrorKind::NetworkFailure,
            Self::Server { .. } | Self::InvalidResponse(_) => ErrorKind::ServerFailure,
        }
    }

    /// Whether the client may try the same request again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network(_))
    }
}

/// Errors returned by the note.com client.
#[derive(Debug, Clone, Error)]
pub enum DestinationError {
    /// 401/403 from note.com: the session cookie is missing or stale.
    #[error("note.com rejected the session (HTTP {status})\nLog in again and refresh NOTE_SESSION.")]
    Unauthorized { status: u16 },

    /// Any other non-success status.
    #[error("note.com returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error talking to note.com: {0}")]
    Network(String),

    #[error("Unexpected response from note.com: {0}")]
    InvalidResponse(String),
}

impl DestinationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::AuthInvalid,
            Self::Http { status, .. } if *status == 429 => ErrorKind::RateLimited,
            Self::Http { status, .. } if *status == 404 => ErrorKind::NotFound,
            Self::Http { .. } | Self::InvalidResponse(_) => ErrorKind::ServerFailure,
            Self::Network(_) => ErrorKind::NetworkFailure,
        }
    }
}

/// All fatal errors returned by the notion2note library.
///
/// Per-image failures use [`ImageError`] and end up as warnings in
/// [`crate::output::ImportResult`] rather than here.
#[derive(Debug, Error)]
pub enum ImportError {
    /// A credential the operation needs was not configured.
    #[error("{service} credentials are not configured.\n{hint}")]
    NotAuthenticated { service: String, hint: String },

    /// The document id or URL could not be understood.
    #[error("Invalid document reference '{input}': expected a Notion page URL or 32-character id")]
    InvalidInput { input: String },

    /// Fetching the page or its blocks failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Creating the post on note.com failed.
    #[error("Failed to publish to note.com: {0}")]
    Publish(#[source] DestinationError),

    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ImportError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::NotAuthenticated { .. } => Some(ErrorKind::AuthInvalid),
            Self::Source(e) => Some(e.kind()),
            Self::Publish(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// A non-fatal error for a single image.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum ImageError {
    /// Fetching the image from Notion failed, or the file was rejected.
    #[error("{file_name}: download failed: {detail}")]
    DownloadFailed { file_name: String, detail: String },

    /// Either the presign call or the storage upload failed.
    #[error("{file_name}: upload failed: {detail}")]
    UploadFailed { file_name: String, detail: String },
}

impl ImageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DownloadFailed { .. } => ErrorKind::ImageDownloadFailed,
            Self::UploadFailed { .. } => ErrorKind::ImageUploadFailed,
        }
    }

    pub fn file_name(&self) -> &str {
        match self {
            Self::DownloadFailed { file_name, .. } | Self::UploadFailed { file_name, .. } => {
                file_name
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_error_codes() {
        assert_eq!(
            SourceError::InvalidToken { detail: "x".into() }.code(),
            "INVALID_TOKEN"
        );
        assert_eq!(
            SourceError::PageNotFound { id: "abc".into() }.code(),
            "PAGE_NOT_FOUND"
        );
        assert_eq!(
            SourceError::RateLimited {
                attempts: 3,
                retry_after_secs: None
            }
            .code(),
            "RATE_LIMITED"
        );
        assert_eq!(SourceError::Network("reset".into()).code(), "NETWORK_ERROR");
    }

    #[test]
    fn only_rate_limit_and_network_are_transient() {
        assert!(SourceError::Network("timeout".into()).is_transient());
        assert!(SourceError::RateLimited {
            attempts: 1,
            retry_after_secs: Some(2)
        }
        .is_transient());
        assert!(!SourceError::NoAccess { id: "p".into() }.is_transient());
        assert!(!SourceError::Server {
            status: 502,
            message: "bad gateway".into()
        }
        .is_transient());
    }

    #[test]
    fn not_found_display_names_the_id() {
        let e = SourceError::PageNotFound { id: "1234".into() };
        assert!(e.to_string().contains("1234"));
        assert_eq!(e.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn import_error_wraps_source_kind() {
        let e: ImportError = SourceError::TokenExpired {
            detail: "expired".into(),
        }
        .into();
        assert_eq!(e.kind(), Some(ErrorKind::AuthExpired));
    }

    #[test]
    fn image_error_display_names_file() {
        let e = ImageError::UploadFailed {
            file_name: "image_2.png".into(),
            detail: "HTTP 500".into(),
        };
        assert!(e.to_string().contains("image_2.png"));
        assert!(e.to_string().contains("HTTP 500"));
        assert_eq!(e.kind(), ErrorKind::ImageUploadFailed);
    }
}
