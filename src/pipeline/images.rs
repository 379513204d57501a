//! Image relocation: validate downloaded images, upload them to note.com,
//! and swap placeholders for the uploaded URLs.
//!
//! Uploads run one at a time. A failed image is recorded and the batch
//! moves on; the post is still published without it.

use crate::config::ImportConfig;
use crate::destination::NoteClient;
use crate::error::ImageError;
use crate::progress::ProgressCallback;
use crate::source::DownloadedImage;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, warn};

static RE_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"src="(__IMAGE_PLACEHOLDER_\d+__)"|(__IMAGE_PLACEHOLDER_\d+__)"#)
        .expect("valid regex")
});

/// A downloaded image ready for upload.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Position among the document's images, 0-based.
    pub index: usize,
    /// Placeholder this image replaces.
    pub reference: String,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Check a download against the configured type and size limits.
pub fn prepare_image(
    index: usize,
    reference: &str,
    downloaded: DownloadedImage,
    config: &ImportConfig,
) -> Result<ImageData, ImageError> {
    let mime_type = downloaded
        .mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let file_name = format!("notion_image_{index}.{}", extension_for(&mime_type));

    if !config.accepts_image_type(&mime_type) {
        return Err(ImageError::DownloadFailed {
            file_name,
            detail: format!("unsupported image type '{mime_type}'"),
        });
    }
    if downloaded.bytes.is_empty() {
        return Err(ImageError::DownloadFailed {
            file_name,
            detail: "empty file".into(),
        });
    }
    if downloaded.bytes.len() > config.max_image_bytes {
        return Err(ImageError::DownloadFailed {
            file_name,
            detail: format!(
                "{} bytes exceeds the {} byte limit",
                downloaded.bytes.len(),
                config.max_image_bytes
            ),
        });
    }

    Ok(ImageData {
        index,
        reference: reference.to_string(),
        file_name,
        bytes: downloaded.bytes,
        mime_type,
    })
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    pub reference: String,
    pub file_name: String,
    pub url: String,
}

/// Outcome of one upload batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadReport {
    /// Stored images, in upload order.
    pub uploaded: Vec<UploadedImage>,
    pub failures: Vec<ImageError>,
}

impl UploadReport {
    /// Placeholder → uploaded URL, for [`replace_image_references`].
    pub fn reference_map(&self) -> HashMap<String, String> {
        self.uploaded
            .iter()
            .map(|u| (u.reference.clone(), u.url.clone()))
            .collect()
    }
}

/// Uploads a batch of images through a [`NoteClient`].
pub struct ImageRelocator<'a> {
    client: &'a NoteClient,
    progress: Option<ProgressCallback>,
    total: Option<usize>,
}

impl<'a> ImageRelocator<'a> {
    pub fn new(client: &'a NoteClient) -> Self {
        Self {
            client,
            progress: None,
            total: None,
        }
    }

    /// Report per-image progress. `total` is the document's image count,
    /// which may exceed the batch when some downloads failed.
    pub fn with_progress(mut self, progress: Option<ProgressCallback>, total: usize) -> Self {
        self.progress = progress;
        self.total = Some(total);
        self
    }

    pub async fn upload_images(&self, images: &[ImageData]) -> UploadReport {
        let total = self.total.unwrap_or(images.len());
        let mut report = UploadReport::default();

        for image in images {
            match self
                .client
                .upload_image(&image.file_name, &image.mime_type, image.bytes.clone())
                .await
            {
                Ok(url) => {
                    info!("Uploaded {} → {}", image.file_name, url);
                    if let Some(ref cb) = self.progress {
                        cb.on_image_complete(image.index, total, &image.file_name);
                    }
                    report.uploaded.push(UploadedImage {
                        reference: image.reference.clone(),
                        file_name: image.file_name.clone(),
                        url,
                    });
                }
                Err(e) => {
                    let error = ImageError::UploadFailed {
                        file_name: image.file_name.clone(),
                        detail: e.to_string(),
                    };
                    warn!("{}", error);
                    if let Some(ref cb) = self.progress {
                        cb.on_image_error(image.index, total, &error.to_string());
                    }
                    report.failures.push(error);
                }
            }
        }

        report
    }
}

/// Swap placeholders for uploaded URLs.
///
/// A placeholder inside `src="…"` has just its value replaced; a bare one
/// becomes a full `<figure>`. Placeholders missing from `urls` are left as
/// they are.
pub fn replace_image_references(markdown: &str, urls: &HashMap<String, String>) -> String {
    RE_REFERENCE
        .replace_all(markdown, |caps: &Captures| {
            if let Some(reference) = caps.get(1) {
                if let Some(url) = urls.get(reference.as_str()) {
                    return format!("src=\"{url}\"");
                }
            } else if let Some(reference) = caps.get(2) {
                if let Some(url) = urls.get(reference.as_str()) {
                    return format!("<figure><img src=\"{url}\"></figure>");
                }
            }
            caps[0].to_string()
        })
        .into_owned()
}
