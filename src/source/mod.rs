//! Remote document client for Notion.
//!
//! [`DocumentSource`] is the seam the import pipeline depends on;
//! [`NotionClient`] implements it over a [`SourceTransport`].

pub mod client;
pub mod model;
pub mod transport;

pub use client::{NotionClient, RetryPolicy};
pub use model::{DocumentInfo, DownloadedImage, SourceBlock};
pub use transport::{HttpSourceTransport, SourceRequest, SourceTransport};

use crate::error::SourceError;
use async_trait::async_trait;

/// Read access to a document platform.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Page metadata.
    async fn get_document(&self, id: &str) -> Result<DocumentInfo, SourceError>;

    /// Top-level blocks of a page, in document order. With `recursive`,
    /// nested blocks are filled into `children`, depth-first.
    async fn get_blocks(&self, id: &str, recursive: bool) -> Result<Vec<SourceBlock>, SourceError>;

    /// Raw bytes and MIME type of a hosted file.
    async fn download_image(&self, url: &str) -> Result<DownloadedImage, SourceError>;

    /// Pages in a database / collection.
    async fn list_documents(&self, database_id: &str) -> Result<Vec<DocumentInfo>, SourceError>;
}
