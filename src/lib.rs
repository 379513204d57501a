//! # notion2note
//!
//! Import Notion pages into note.com posts, moving embedded images from
//! Notion's file storage to note.com's.
//!
//! ## Why this crate?
//!
//! Copy-pasting a Notion page into note.com's editor loses nested lists,
//! tables and callouts, and leaves images pointing at Notion's signed file
//! URLs, which expire within the hour. This crate reads the page through the
//! Notion API, converts its block tree to the restricted markdown-with-HTML
//! note.com accepts, re-uploads every image through note.com's presigned
//! storage, and creates the post.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Notion page
//!  │
//!  ├─ 1. Input    resolve page URL or id
//!  ├─ 2. Fetch    page metadata + block tree (paginated, rate-limit aware)
//!  ├─ 3. Parse    blocks → IR (merged lists, tables, depth cap)
//!  ├─ 4. Format   IR → note.com markup with image placeholders
//!  ├─ 5. Images   download → presign → S3 upload, one at a time
//!  ├─ 6. Replace  placeholders → uploaded URLs
//!  └─ 7. Publish  draft or public post + stats and warnings
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notion2note::{import_document, ImportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ImportConfig::builder()
//!         .notion_token(std::env::var("NOTION_TOKEN")?)
//!         .note_session(std::env::var("NOTE_SESSION")?)
//!         .build()?;
//!     let result = import_document(
//!         "https://www.notion.so/acme/My-Post-0123abcd456789ef0123456789abcdef",
//!         &["rust".to_string()],
//!         true,
//!         &config,
//!     )
//!     .await;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `notion2note` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! notion2note = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod destination;
pub mod error;
pub mod extract;
pub mod http;
pub mod import;
pub mod ir;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod source;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ImportConfig, ImportConfigBuilder};
pub use destination::{DestinationTransport, NoteClient};
pub use error::{DestinationError, ErrorKind, ImageError, ImportError, SourceError};
pub use import::{
    document_outline, import_document, import_document_sync, list_documents, preview_document,
    preview_to_file,
};
pub use ir::{IrNode, NodeKind, RichTextSpan};
pub use output::{DocumentOutline, ImportResult, ImportStats, OutlineEntry, PreviewOutput};
pub use pipeline::format::{extract_image_references, format_to_markdown, FormatOutput};
pub use pipeline::images::replace_image_references;
pub use pipeline::parse::{BlockParser, BlockStats, ParseOutput};
pub use progress::{ImportProgressCallback, NoopProgressCallback, ProgressCallback};
pub use source::{DocumentInfo, DocumentSource, NotionClient, SourceBlock};
