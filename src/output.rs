//! Result types returned by the public entry points.

use crate::error::{ErrorKind, ImageError, ImportError};
use crate::pipeline::format::ImageSlot;
use crate::pipeline::parse::BlockStats;
use crate::source::DocumentInfo;
use serde::{Deserialize, Serialize};

/// Counters for one import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub blocks_total: usize,
    pub blocks_converted: usize,
    /// Always `blocks_total - blocks_converted`.
    pub blocks_skipped: usize,
    pub images_total: usize,
    pub images_success: usize,
    pub images_failed: usize,
}

impl ImportStats {
    pub fn from_blocks(blocks: BlockStats) -> Self {
        Self {
            blocks_total: blocks.total,
            blocks_converted: blocks.converted,
            blocks_skipped: blocks.skipped,
            ..Default::default()
        }
    }
}

/// Outcome of [`crate::import::import_document`].
///
/// `success` is false only when credentials were missing, the page could not
/// be fetched, or note.com refused the post. Image failures leave it true and
/// show up in `warnings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub success: bool,
    /// Notion page id (dashed UUID) once resolved.
    pub document_id: Option<String>,
    pub title: Option<String>,
    pub note_id: Option<String>,
    pub note_key: Option<String>,
    pub note_url: Option<String>,
    pub stats: ImportStats,
    /// Human-readable, one per failed image.
    pub warnings: Vec<String>,
    pub image_errors: Vec<ImageError>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub duration_ms: u64,
}

impl ImportResult {
    /// Record a fatal error, keeping whatever was collected before it.
    pub fn fail(&mut self, err: &ImportError) {
        self.success = false;
        self.error = Some(err.to_string());
        self.error_kind = err.kind();
    }
}

/// Output of [`crate::import::preview_document`]: the body as it would be
/// posted, before image relocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewOutput {
    pub document: DocumentInfo,
    pub markdown: String,
    /// Placeholders in order of appearance.
    pub image_references: Vec<String>,
    pub images: Vec<ImageSlot>,
    pub stats: BlockStats,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
}

/// Headings of a page, for a quick look before importing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentOutline {
    pub document: DocumentInfo,
    pub headings: Vec<OutlineEntry>,
    pub block_count: usize,
}
