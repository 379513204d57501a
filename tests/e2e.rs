//! End-to-end tests against the live Notion API.
//!
//! They read a real page shared with your integration and never publish to
//! note.com. Gated behind `E2E_ENABLED` so they do not run in CI unless
//! explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 NOTION_TOKEN=secret_... E2E_NOTION_PAGE=<url-or-id> \
//!     cargo test --test e2e -- --nocapture

use notion2note::{document_outline, preview_document, preview_to_file, ImportConfig};
use std::path::PathBuf;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn output_dir() -> PathBuf {
    let d = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/e2e-output");
    std::fs::create_dir_all(&d).ok();
    d
}

/// Skip this test unless E2E_ENABLED, NOTION_TOKEN and E2E_NOTION_PAGE are
/// all set; evaluates to `(config, page)`.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let Ok(token) = std::env::var("NOTION_TOKEN") else {
            println!("SKIP: NOTION_TOKEN is not set");
            return;
        };
        let Ok(page) = std::env::var("E2E_NOTION_PAGE") else {
            println!("SKIP: E2E_NOTION_PAGE is not set");
            return;
        };
        let config = ImportConfig::builder()
            .notion_token(token)
            .build()
            .expect("valid config");
        (config, page)
    }};
}

/// Assert the body looks like something note.com will accept.
fn assert_body_quality(md: &str, context: &str) {
    assert!(!md.trim().is_empty(), "[{context}] body is empty");
    assert!(md.ends_with('\n'), "[{context}] body must end with a newline");
    assert!(
        !md.ends_with("\n\n"),
        "[{context}] body must end with exactly one newline"
    );

    let invisible = ['\u{200B}', '\u{FEFF}', '\u{2060}'];
    for ch in invisible {
        assert!(
            !md.contains(ch),
            "[{context}] body contains invisible char U+{:04X}",
            ch as u32
        );
    }

    // Notion's signed file URLs expire; they must never reach the body.
    assert!(
        !md.contains("X-Amz-Signature"),
        "[{context}] body leaks a signed Notion file URL"
    );

    println!("[{context}] ✓  {} bytes, quality checks passed", md.len());
}

// ── Live tests ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_preview_live_page() {
    let (config, page) = e2e_skip_unless_ready!();

    let preview = preview_document(&page, &config)
        .await
        .expect("preview should succeed");

    assert_body_quality(&preview.markdown, "preview");
    assert_eq!(
        preview.image_references.len(),
        preview.images.len(),
        "each image block should be referenced once"
    );
    assert_eq!(
        preview.stats.total,
        preview.stats.converted + preview.stats.skipped
    );
    println!("Title: {}", preview.document.title);
    println!("Stats: {:?}", preview.stats);
}

#[tokio::test]
async fn test_outline_live_page() {
    let (config, page) = e2e_skip_unless_ready!();

    let outline = document_outline(&page, &config)
        .await
        .expect("outline should succeed");

    assert!(!outline.document.id.is_empty());
    assert!(outline.block_count > 0, "page should have blocks");
    for heading in &outline.headings {
        assert!((1..=3).contains(&heading.level));
    }
    println!("{} headings", outline.headings.len());
}

#[tokio::test]
async fn test_preview_to_file_live_page() {
    let (config, page) = e2e_skip_unless_ready!();
    let out_path = output_dir().join("live_preview.md");

    let preview = preview_to_file(&page, &out_path, &config)
        .await
        .expect("preview_to_file should succeed");

    let written = std::fs::read_to_string(&out_path).expect("file written");
    assert_eq!(written, preview.markdown);
    println!("Wrote {}", out_path.display());
}

#[tokio::test]
async fn test_unknown_page_is_not_found() {
    let (config, _) = e2e_skip_unless_ready!();

    let result = preview_document("00000000000000000000000000000000", &config).await;
    assert!(result.is_err(), "a page nobody shared should not be readable");
}
