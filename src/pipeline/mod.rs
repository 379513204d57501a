//! Pipeline stages for Notion-to-note.com conversion.
//!
//! Each submodule implements exactly one transformation step. Only
//! `images` talks to the network; every other stage is a pure function
//! over in-memory data and is tested on crafted inputs.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ parse ──▶ format ──▶ postprocess ──▶ images ──▶ replace
//! (URL/id)  (IR)      (markup)   (cleanup)       (upload)   (final URLs)
//! ```
//!
//! 1. [`input`]:  canonicalise the user-supplied URL or id to a page id
//! 2. [`parse`]:  Notion block tree to IR, with [`rich_text`] for spans
//! 3. [`format`]: IR to note.com markup with image placeholders
//! 4. [`postprocess`]: deterministic whitespace and Unicode cleanup
//! 5. [`images`]: validate, upload through presigned POST (encoded by
//!    [`multipart`]), and substitute the final URLs

pub mod format;
pub mod images;
pub mod input;
pub mod multipart;
pub mod parse;
pub mod postprocess;
pub mod rich_text;
