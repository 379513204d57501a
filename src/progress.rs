//! Progress-callback trait for import events.
//!
//! Inject an [`Arc<dyn ImportProgressCallback>`] via
//! [`crate::config::ImportConfigBuilder::progress_callback`] to be told when
//! an import starts, as each image is relocated, and when the post is
//! created. The CLI uses it to drive its progress bar.
//!
//! # Example
//!
//! ```rust
//! use notion2note::{ImportConfig, ImportProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     uploaded: AtomicUsize,
//! }
//!
//! impl ImportProgressCallback for CountingCallback {
//!     fn on_image_complete(&self, index: usize, total: usize, file_name: &str) {
//!         self.uploaded.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("image {}/{} uploaded: {}", index + 1, total, file_name);
//!     }
//! }
//!
//! let cb = Arc::new(CountingCallback { uploaded: AtomicUsize::new(0) });
//! let config = ImportConfig::builder()
//!     .progress_callback(cb as Arc<dyn ImportProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the import pipeline as it progresses.
///
/// All methods have no-op defaults so implementors only override what they
/// need. Implementations must be `Send + Sync`; the config that carries
/// them is shared across tasks.
pub trait ImportProgressCallback: Send + Sync {
    /// Called once the Notion page has been fetched and parsed.
    ///
    /// * `title`:  page title
    /// * `blocks`: number of source blocks in the tree
    fn on_import_start(&self, title: &str, blocks: usize) {
        let _ = (title, blocks);
    }

    /// Called before the first image is downloaded.
    fn on_images_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when an image has been stored on note.com.
    ///
    /// `index` is 0-based in document order.
    fn on_image_complete(&self, index: usize, total: usize, file_name: &str) {
        let _ = (index, total, file_name);
    }

    /// Called when an image could not be downloaded or uploaded.
    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once with the final outcome.
    ///
    /// * `success`:       whether the post was created
    /// * `images_failed`: images left out of the post
    fn on_import_complete(&self, success: bool, images_failed: usize) {
        let _ = (success, images_failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ImportProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ImportConfig`].
pub type ProgressCallback = Arc<dyn ImportProgressCallback>;
