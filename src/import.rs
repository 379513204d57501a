//! Import entry points: publish a Notion page to note.com, or inspect it
//! without publishing.
//!
//! [`import_document`] never returns `Err`. Every failure is folded into the
//! returned [`ImportResult`]: fatal ones set `success: false` and `error`,
//! per-image ones become `warnings`. The inspection helpers
//! ([`preview_document`], [`document_outline`], [`list_documents`]) make no
//! note.com calls and return `Result` like ordinary library functions.

use crate::config::ImportConfig;
use crate::destination::{NoteClient, PostDraft, PostStatus};
use crate::error::{ImageError, ImportError};
use crate::ir::{IrNode, NodeKind};
use crate::output::{DocumentOutline, ImportResult, ImportStats, OutlineEntry, PreviewOutput};
use crate::pipeline::format::{extract_image_references, format_to_markdown, ImageSlot};
use crate::pipeline::images::{prepare_image, replace_image_references, ImageData, ImageRelocator};
use crate::pipeline::input;
use crate::pipeline::parse::{BlockParser, ParseOutput};
use crate::source::{DocumentInfo, DocumentSource, NotionClient};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Convert a Notion page and create a note.com post from it.
///
/// # Arguments
/// * `document_id`: Notion page URL, dashed UUID or 32-character id
/// * `tags`: hashtags attached to the post
/// * `save_as_draft`: create a draft instead of publishing immediately
/// * `config`: credentials and tuning
///
/// # Example
/// ```rust,no_run
/// use notion2note::{import_document, ImportConfig};
///
/// # #[tokio::main]
/// # async fn main() {
/// let config = ImportConfig::builder()
///     .notion_token("secret_abc")
///     .note_session("cookie")
///     .build()
///     .unwrap();
/// let result = import_document("0123abcd456789ef0123456789abcdef", &[], true, &config).await;
/// if !result.success {
///     eprintln!("{}", result.error.unwrap_or_default());
/// }
/// # }
/// ```
pub async fn import_document(
    document_id: impl AsRef<str>,
    tags: &[String],
    save_as_draft: bool,
    config: &ImportConfig,
) -> ImportResult {
    let start = Instant::now();
    let document_id = document_id.as_ref();
    info!("Starting import: {}", document_id);

    let mut result = ImportResult::default();
    match run_import(document_id, tags, save_as_draft, config, &mut result).await {
        Ok(()) => {
            result.success = true;
            info!(
                "Import complete: {} images uploaded, {} failed, {}ms",
                result.stats.images_success,
                result.stats.images_failed,
                start.elapsed().as_millis()
            );
        }
        Err(e) => {
            warn!("Import of {} failed: {}", document_id, e);
            result.fail(&e);
        }
    }
    result.duration_ms = start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_import_complete(result.success, result.stats.images_failed);
    }
    result
}

async fn run_import(
    input_str: &str,
    tags: &[String],
    save_as_draft: bool,
    config: &ImportConfig,
    result: &mut ImportResult,
) -> Result<(), ImportError> {
    // ── Step 1: Credentials (no network before this passes) ──────────────
    let note = NoteClient::from_config(config)?;
    let source = resolve_source(config)?;

    // ── Step 2: Resolve page id ──────────────────────────────────────────
    let id = input::resolve_document_id(input_str)?;
    result.document_id = Some(id.clone());

    // ── Step 3: Fetch and parse ──────────────────────────────────────────
    let (document, parsed) = fetch_and_parse(source.as_ref(), &id, config).await?;
    result.title = Some(document.title.clone());
    result.stats = ImportStats::from_blocks(parsed.stats);
    if let Some(ref cb) = config.progress_callback {
        cb.on_import_start(&document.title, parsed.stats.total);
    }

    // ── Step 4: Format ───────────────────────────────────────────────────
    let formatted = format_to_markdown(&parsed.nodes, 0);
    let slots = referenced_slots(&formatted.markdown, &formatted.images);
    let total = slots.len();
    result.stats.images_total = total;

    // ── Step 5: Download images ──────────────────────────────────────────
    if total > 0 {
        info!("Relocating {} images", total);
        if let Some(ref cb) = config.progress_callback {
            cb.on_images_start(total);
        }
    }
    let (images, download_errors) = download_images(source.as_ref(), &slots, config).await;

    // ── Step 6: Upload images ────────────────────────────────────────────
    let report = ImageRelocator::new(&note)
        .with_progress(config.progress_callback.clone(), total)
        .upload_images(&images)
        .await;

    result.stats.images_success = report.uploaded.len();
    result.stats.images_failed = total - report.uploaded.len();
    result.image_errors = download_errors
        .into_iter()
        .chain(report.failures.iter().cloned())
        .collect();
    result.warnings = result.image_errors.iter().map(|e| e.to_string()).collect();

    // ── Step 7: Substitute final URLs ────────────────────────────────────
    let body = replace_image_references(&formatted.markdown, &report.reference_map());

    // ── Step 8: Publish ──────────────────────────────────────────────────
    let draft = PostDraft {
        title: document.title.clone(),
        body,
        status: if save_as_draft {
            PostStatus::Draft
        } else {
            PostStatus::Published
        },
        tags: tags.to_vec(),
    };
    // Images already in storage stay there if this fails.
    let created = note
        .create_post(&draft)
        .await
        .map_err(ImportError::Publish)?;

    result.note_id = created.id;
    result.note_key = created.key;
    result.note_url = created.url;
    Ok(())
}

/// Synchronous wrapper around [`import_document`].
///
/// Creates a temporary tokio runtime internally.
pub fn import_document_sync(
    document_id: impl AsRef<str>,
    tags: &[String],
    save_as_draft: bool,
    config: &ImportConfig,
) -> ImportResult {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(import_document(document_id, tags, save_as_draft, config)),
        Err(e) => {
            let mut result = ImportResult::default();
            result.fail(&ImportError::Internal(format!(
                "Failed to create tokio runtime: {e}"
            )));
            result
        }
    }
}

/// Render a page as it would be posted, without touching note.com.
///
/// Images keep their placeholders.
pub async fn preview_document(
    document_id: impl AsRef<str>,
    config: &ImportConfig,
) -> Result<PreviewOutput, ImportError> {
    let source = resolve_source(config)?;
    let id = input::resolve_document_id(document_id.as_ref())?;
    let (document, parsed) = fetch_and_parse(source.as_ref(), &id, config).await?;

    let formatted = format_to_markdown(&parsed.nodes, 0);
    let image_references = extract_image_references(&formatted.markdown);

    let mut warnings = Vec::new();
    if parsed.stats.skipped > 0 {
        warnings.push(format!(
            "{} of {} blocks could not be converted and appear as placeholders",
            parsed.stats.skipped, parsed.stats.total
        ));
    }
    for slot in formatted.images.iter().filter(|s| s.source_url.is_none()) {
        warnings.push(format!("{} has no file URL", slot.reference));
    }

    Ok(PreviewOutput {
        document,
        markdown: formatted.markdown,
        image_references,
        images: formatted.images,
        stats: parsed.stats,
        warnings,
    })
}

/// Preview a page and write the markup to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn preview_to_file(
    document_id: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ImportConfig,
) -> Result<PreviewOutput, ImportError> {
    let preview = preview_document(document_id, config).await?;
    let path = output_path.as_ref();
    let write_err = |e: std::io::Error| ImportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, &preview.markdown)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    info!("Wrote preview to {}", path.display());
    Ok(preview)
}

/// Headings of a page, in document order.
pub async fn document_outline(
    document_id: impl AsRef<str>,
    config: &ImportConfig,
) -> Result<DocumentOutline, ImportError> {
    let source = resolve_source(config)?;
    let id = input::resolve_document_id(document_id.as_ref())?;
    let (document, parsed) = fetch_and_parse(source.as_ref(), &id, config).await?;

    let mut headings = Vec::new();
    collect_headings(&parsed.nodes, &mut headings);
    Ok(DocumentOutline {
        document,
        headings,
        block_count: parsed.stats.total,
    })
}

/// Pages of a Notion database.
pub async fn list_documents(
    database_id: impl AsRef<str>,
    config: &ImportConfig,
) -> Result<Vec<DocumentInfo>, ImportError> {
    let source = resolve_source(config)?;
    let id = input::resolve_document_id(database_id.as_ref())?;
    let documents = source.list_documents(&id).await?;
    info!("Database {} lists {} pages", id, documents.len());
    Ok(documents)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Use the caller's pre-built source, or build a Notion client from the
/// token in `config`.
pub fn resolve_source(config: &ImportConfig) -> Result<Arc<dyn DocumentSource>, ImportError> {
    if let Some(ref source) = config.source {
        return Ok(Arc::clone(source));
    }
    Ok(Arc::new(NotionClient::from_config(config)?))
}

async fn fetch_and_parse(
    source: &dyn DocumentSource,
    id: &str,
    config: &ImportConfig,
) -> Result<(DocumentInfo, ParseOutput), ImportError> {
    let document = source.get_document(id).await?;
    let blocks = source.get_blocks(id, true).await?;
    let parsed = BlockParser::new(config.max_depth).parse(&blocks);
    debug!(
        "'{}': {} blocks, {} converted, {} skipped",
        document.title, parsed.stats.total, parsed.stats.converted, parsed.stats.skipped
    );
    Ok((document, parsed))
}

/// Slots for the placeholders present in `markdown`, each once, in order of
/// first appearance. Matching is by placeholder, never by source URL, so two
/// images sharing a URL stay distinct.
fn referenced_slots<'a>(markdown: &str, images: &'a [ImageSlot]) -> Vec<&'a ImageSlot> {
    let by_reference: HashMap<&str, &ImageSlot> =
        images.iter().map(|s| (s.reference.as_str(), s)).collect();
    let mut seen = HashSet::new();
    extract_image_references(markdown)
        .into_iter()
        .filter_map(|r| by_reference.get(r.as_str()).copied())
        .filter(|slot| seen.insert(slot.index))
        .collect()
}

/// Download every slot's image, one at a time. Failures are returned, not
/// raised.
async fn download_images(
    source: &dyn DocumentSource,
    slots: &[&ImageSlot],
    config: &ImportConfig,
) -> (Vec<ImageData>, Vec<ImageError>) {
    let total = slots.len();
    let mut images = Vec::with_capacity(total);
    let mut errors = Vec::new();

    for slot in slots {
        let outcome = match slot.source_url.as_deref() {
            None => Err(ImageError::DownloadFailed {
                file_name: format!("notion_image_{}", slot.index),
                detail: "image block has no file URL".into(),
            }),
            Some(url) => match source.download_image(url).await {
                Ok(downloaded) => prepare_image(slot.index, &slot.reference, downloaded, config),
                Err(e) => Err(ImageError::DownloadFailed {
                    file_name: format!("notion_image_{}", slot.index),
                    detail: e.to_string(),
                }),
            },
        };

        match outcome {
            Ok(image) => {
                debug!("Downloaded {} ({} bytes)", image.file_name, image.bytes.len());
                images.push(image);
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_error(slot.index, total, &e.to_string());
                }
                errors.push(e);
            }
        }
    }

    (images, errors)
}

fn collect_headings(nodes: &[IrNode], out: &mut Vec<OutlineEntry>) {
    for node in nodes {
        if node.kind == NodeKind::Heading {
            out.push(OutlineEntry {
                level: node.attributes.level.unwrap_or(1),
                text: node.plain_text().trim().to_string(),
            });
        }
        collect_headings(&node.children, out);
    }
}
