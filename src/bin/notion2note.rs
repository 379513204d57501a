//! CLI binary for notion2note.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ImportConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use notion2note::{
    document_outline, import_document, list_documents, preview_document, preview_to_file,
    ImportConfig, ImportProgressCallback, ImportResult, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner while the page is fetched, then a
/// bar over the image uploads with one log line per image.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Fetching");
        bar.set_message("Reading Notion page…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    /// Switch to the full progress-bar style once we know `total`.
    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} images  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Uploading");
    }
}

impl ImportProgressCallback for CliProgressCallback {
    fn on_import_start(&self, title: &str, blocks: usize) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Importing \"{title}\" ({blocks} blocks)…"))
        ));
        self.bar.set_prefix("Formatting");
        self.bar.set_message("");
    }

    fn on_images_start(&self, total: usize) {
        self.activate_bar(total);
    }

    fn on_image_complete(&self, index: usize, total: usize, file_name: &str) {
        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            green("✓"),
            index + 1,
            total,
            dim(file_name),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} Image {:>3}/{:<3}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_import_complete(&self, success: bool, images_failed: usize) {
        self.bar.finish_and_clear();
        match (success, images_failed) {
            (true, 0) => eprintln!("{} Post created", green("✔")),
            (true, n) => eprintln!(
                "{} Post created, {} image(s) left out",
                cyan("⚠"),
                red(&n.to_string())
            ),
            (false, _) => eprintln!("{} Import failed", red("✘")),
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Import a page as a draft
  notion2note https://www.notion.so/acme/My-Post-0123abcd456789ef0123456789abcdef

  # Publish immediately with tags
  notion2note --publish --tag rust --tag notion 0123abcd456789ef0123456789abcdef

  # Preview the post body without touching note.com
  notion2note --mode preview <page> -o post.md

  # Show the heading outline
  notion2note --mode outline <page>

  # List the pages of a database
  notion2note --mode list <database-id> --json

ENVIRONMENT VARIABLES:
  NOTION_TOKEN       Notion internal integration token (secret_… / ntn_…)
  NOTE_SESSION       note.com _note_session_v5 cookie value (import mode)
  NOTE_XSRF_TOKEN    Optional note.com XSRF token
  RUST_LOG           Override log filter (e.g. notion2note=debug)

SETUP:
  1. Create an integration at https://www.notion.so/my-integrations and
     share the page with it:      export NOTION_TOKEN=secret_...
  2. Copy the _note_session_v5 cookie from a logged-in browser:
                                  export NOTE_SESSION=...
  3. Import:                      notion2note <page-url>
"#;

/// Import Notion pages into note.com posts.
#[derive(Parser, Debug)]
#[command(
    name = "notion2note",
    version,
    about = "Import Notion pages into note.com posts",
    long_about = "Convert a Notion page (nested lists, tables, callouts, code, images) into a \
note.com post. Images are downloaded from Notion and re-uploaded to note.com's storage so the \
post does not depend on Notion's expiring file URLs.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Notion page URL or id (database id in list mode).
    target: String,

    /// What to do with the page.
    #[arg(long, env = "NOTION2NOTE_MODE", value_enum, default_value = "import")]
    mode: ModeArg,

    /// Hashtag for the post; repeat for several.
    #[arg(short, long = "tag")]
    tags: Vec<String>,

    /// Publish immediately instead of saving a draft.
    #[arg(long)]
    publish: bool,

    /// Write the preview to this file instead of stdout (preview mode).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output structured JSON instead of text.
    #[arg(long, env = "NOTION2NOTE_JSON")]
    json: bool,

    /// Notion integration token.
    #[arg(long, env = "NOTION_TOKEN", hide_env_values = true)]
    notion_token: Option<String>,

    /// note.com session cookie (`_note_session_v5`).
    #[arg(long, env = "NOTE_SESSION", hide_env_values = true)]
    note_session: Option<String>,

    /// note.com XSRF token.
    #[arg(long, env = "NOTE_XSRF_TOKEN", hide_env_values = true)]
    note_xsrf_token: Option<String>,

    /// Notion API base URL.
    #[arg(long, env = "NOTION_API_BASE")]
    notion_api_base: Option<String>,

    /// note.com base URL.
    #[arg(long, env = "NOTE_BASE_URL")]
    note_base_url: Option<String>,

    /// Deepest block nesting converted before content is elided.
    #[arg(long, env = "NOTION2NOTE_MAX_DEPTH", default_value_t = 10)]
    max_depth: usize,

    /// Attempts per Notion request when rate-limited or disconnected.
    #[arg(long, env = "NOTION2NOTE_MAX_RETRIES", default_value_t = 3)]
    max_retries: u32,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "NOTION2NOTE_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "NOTION2NOTE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "NOTION2NOTE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "NOTION2NOTE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Import,
    Preview,
    Outline,
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level logs during an import.
    let show_progress = cli.mode == ModeArg::Import && !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ImportProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    match cli.mode {
        ModeArg::Import => run_import(&cli, &config).await,
        ModeArg::Preview => run_preview(&cli, &config).await,
        ModeArg::Outline => run_outline(&cli, &config).await,
        ModeArg::List => run_list(&cli, &config).await,
    }
}

async fn run_import(cli: &Cli, config: &ImportConfig) -> Result<()> {
    let result = import_document(&cli.target, &cli.tags, !cli.publish, config).await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
    } else if !cli.quiet {
        print_import_summary(&result);
    }

    if !result.success {
        anyhow::bail!(
            "{}",
            result.error.unwrap_or_else(|| "Import failed".to_string())
        );
    }
    Ok(())
}

fn print_import_summary(result: &ImportResult) {
    let s = &result.stats;
    if let Some(ref url) = result.note_url {
        eprintln!("{}  {}", green("✔"), bold(url));
    }
    eprintln!(
        "   {} blocks ({} converted, {} skipped)  {} images ({} uploaded, {} failed)  {}ms",
        s.blocks_total,
        s.blocks_converted,
        s.blocks_skipped,
        s.images_total,
        s.images_success,
        s.images_failed,
        result.duration_ms,
    );
    for warning in &result.warnings {
        eprintln!("   {} {}", cyan("⚠"), dim(warning));
    }
}

async fn run_preview(cli: &Cli, config: &ImportConfig) -> Result<()> {
    let preview = if let Some(ref path) = cli.output {
        let preview = preview_to_file(&cli.target, path, config)
            .await
            .context("Preview failed")?;
        if !cli.quiet {
            eprintln!(
                "{}  {} images  →  {}",
                green("✔"),
                preview.image_references.len(),
                bold(&path.display().to_string())
            );
        }
        preview
    } else {
        let preview = preview_document(&cli.target, config)
            .await
            .context("Preview failed")?;
        if !cli.json {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(preview.markdown.as_bytes())
                .context("Failed to write to stdout")?;
        }
        preview
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&preview).context("Failed to serialise preview")?
        );
    } else if !cli.quiet {
        for warning in &preview.warnings {
            eprintln!("{} {}", cyan("⚠"), dim(warning));
        }
    }
    Ok(())
}

async fn run_outline(cli: &Cli, config: &ImportConfig) -> Result<()> {
    let outline = document_outline(&cli.target, config)
        .await
        .context("Failed to read page")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&outline).context("Failed to serialise outline")?
        );
        return Ok(());
    }

    println!("Title:    {}", outline.document.title);
    println!("Id:       {}", outline.document.id);
    if !outline.document.url.is_empty() {
        println!("URL:      {}", outline.document.url);
    }
    if let Some(ref edited) = outline.document.last_edited_time {
        println!("Edited:   {}", edited);
    }
    println!("Blocks:   {}", outline.block_count);
    println!();
    for heading in &outline.headings {
        let indent = "  ".repeat(usize::from(heading.level.saturating_sub(1)));
        println!("{indent}{} {}", "#".repeat(usize::from(heading.level)), heading.text);
    }
    Ok(())
}

async fn run_list(cli: &Cli, config: &ImportConfig) -> Result<()> {
    let documents = list_documents(&cli.target, config)
        .await
        .context("Failed to list database")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&documents).context("Failed to serialise listing")?
        );
        return Ok(());
    }

    for doc in &documents {
        println!("{}  {}", dim(&doc.id), doc.title);
    }
    if !cli.quiet {
        eprintln!("{} pages", documents.len());
    }
    Ok(())
}

/// Map CLI args to `ImportConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ImportConfig> {
    let mut builder = ImportConfig::builder()
        .max_depth(cli.max_depth)
        .max_retries(cli.max_retries)
        .request_timeout_secs(cli.timeout);

    if let Some(ref token) = cli.notion_token {
        builder = builder.notion_token(token);
    }
    if let Some(ref session) = cli.note_session {
        builder = builder.note_session(session);
    }
    if let Some(ref token) = cli.note_xsrf_token {
        builder = builder.note_xsrf_token(token);
    }
    if let Some(ref base) = cli.notion_api_base {
        builder = builder.notion_api_base(base);
    }
    if let Some(ref base) = cli.note_base_url {
        builder = builder.note_base_url(base);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
