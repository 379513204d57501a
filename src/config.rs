//! Configuration types for Notion → note.com imports.
//!
//! All behaviour is controlled through [`ImportConfig`], built via its
//! [`ImportConfigBuilder`]. Credentials, endpoints, retry tuning and the
//! pre-built collaborators used by tests all live here, so one value fully
//! describes a run.

use crate::destination::DestinationTransport;
use crate::error::ImportError;
use crate::progress::ProgressCallback;
use crate::source::DocumentSource;
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_NOTION_API_BASE: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_NOTE_BASE_URL: &str = "https://note.com";

/// Configuration for one import, preview, outline or listing call.
///
/// # Example
/// ```rust
/// use notion2note::ImportConfig;
///
/// let config = ImportConfig::builder()
///     .notion_token("secret_abc")
///     .note_session("session-cookie")
///     .max_depth(6)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_depth, 6);
/// ```
#[derive(Clone)]
pub struct ImportConfig {
    /// Notion integration token (`secret_…` / `ntn_…`).
    pub notion_token: Option<String>,

    /// Notion REST base URL. Default: `https://api.notion.com/v1`.
    pub notion_api_base: String,

    /// Value of the `Notion-Version` header. Default: `2022-06-28`.
    pub notion_version: String,

    /// note.com `_note_session_v5` cookie value. Required for imports.
    pub note_session: Option<String>,

    /// Optional `X-XSRF-TOKEN` sent with note.com API calls.
    pub note_xsrf_token: Option<String>,

    /// note.com base URL. Default: `https://note.com`.
    pub note_base_url: String,

    /// Maximum block nesting converted before content is replaced by an
    /// unsupported placeholder. Default: 10.
    pub max_depth: usize,

    /// Maximum number of attempts for a Notion request that hits a rate
    /// limit or a network failure. Default: 3.
    pub max_retries: u32,

    /// First backoff delay in milliseconds; doubles per retry. Default: 1000.
    pub initial_backoff_ms: u64,

    /// Upper bound for a single backoff delay. Default: 4000.
    pub max_backoff_ms: u64,

    /// `page_size` for paginated Notion endpoints (1–100). Default: 100.
    pub page_size: u32,

    /// MIME types accepted for relocated images.
    /// Default: jpeg, png, gif, webp.
    pub supported_image_types: Vec<String>,

    /// Largest image accepted for upload, in bytes. Default: 10 MB.
    pub max_image_bytes: usize,

    /// Per-request HTTP timeout in seconds. Default: 30.
    pub request_timeout_secs: u64,

    /// Pre-constructed document source. Takes precedence over `notion_token`.
    pub source: Option<Arc<dyn DocumentSource>>,

    /// Pre-constructed note.com transport. Takes precedence over
    /// `note_session` for building the HTTP client.
    pub destination_transport: Option<Arc<dyn DestinationTransport>>,

    /// Optional progress callback for per-image events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            notion_token: None,
            notion_api_base: DEFAULT_NOTION_API_BASE.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            note_session: None,
            note_xsrf_token: None,
            note_base_url: DEFAULT_NOTE_BASE_URL.to_string(),
            max_depth: 10,
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 4000,
            page_size: 100,
            supported_image_types: ["image/jpeg", "image/png", "image/gif", "image/webp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_image_bytes: 10 * 1024 * 1024,
            request_timeout_secs: 30,
            source: None,
            destination_transport: None,
            progress_callback: None,
        }
    }
}

fn redact(secret: &Option<String>) -> Option<&'static str> {
    secret.as_ref().map(|_| "<redacted>")
}

impl fmt::Debug for ImportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportConfig")
            .field("notion_token", &redact(&self.notion_token))
            .field("notion_api_base", &self.notion_api_base)
            .field("notion_version", &self.notion_version)
            .field("note_session", &redact(&self.note_session))
            .field("note_xsrf_token", &redact(&self.note_xsrf_token))
            .field("note_base_url", &self.note_base_url)
            .field("max_depth", &self.max_depth)
            .field("max_retries", &self.max_retries)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("max_backoff_ms", &self.max_backoff_ms)
            .field("page_size", &self.page_size)
            .field("supported_image_types", &self.supported_image_types)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("source", &self.source.as_ref().map(|_| "<dyn DocumentSource>"))
            .field(
                "destination_transport",
                &self
                    .destination_transport
                    .as_ref()
                    .map(|_| "<dyn DestinationTransport>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl ImportConfig {
    /// Create a new builder for `ImportConfig`.
    pub fn builder() -> ImportConfigBuilder {
        ImportConfigBuilder {
            config: Self::default(),
        }
    }

    /// Whether note.com calls can be made at all.
    pub fn has_destination_credentials(&self) -> bool {
        self.destination_transport.is_some()
            || self.note_session.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Whether `mime_type` is an accepted image type.
    pub fn accepts_image_type(&self, mime_type: &str) -> bool {
        let mime = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.supported_image_types.iter().any(|t| *t == mime)
    }
}

/// Builder for [`ImportConfig`].
#[derive(Debug)]
pub struct ImportConfigBuilder {
    config: ImportConfig,
}

impl ImportConfigBuilder {
    pub fn notion_token(mut self, token: impl Into<String>) -> Self {
        self.config.notion_token = Some(token.into());
        self
    }

    pub fn notion_api_base(mut self, url: impl Into<String>) -> Self {
        self.config.notion_api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn notion_version(mut self, version: impl Into<String>) -> Self {
        self.config.notion_version = version.into();
        self
    }

    pub fn note_session(mut self, session: impl Into<String>) -> Self {
        self.config.note_session = Some(session.into());
        self
    }

    pub fn note_xsrf_token(mut self, token: impl Into<String>) -> Self {
        self.config.note_xsrf_token = Some(token.into());
        self
    }

    pub fn note_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.note_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn initial_backoff_ms(mut self, ms: u64) -> Self {
        self.config.initial_backoff_ms = ms;
        self
    }

    pub fn max_backoff_ms(mut self, ms: u64) -> Self {
        self.config.max_backoff_ms = ms;
        self
    }

    pub fn page_size(mut self, n: u32) -> Self {
        self.config.page_size = n.clamp(1, 100);
        self
    }

    pub fn supported_image_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.supported_image_types = types
            .into_iter()
            .map(|t| t.into().to_ascii_lowercase())
            .collect();
        self
    }

    pub fn max_image_bytes(mut self, n: usize) -> Self {
        self.config.max_image_bytes = n;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn source(mut self, source: Arc<dyn DocumentSource>) -> Self {
        self.config.source = Some(source);
        self
    }

    pub fn destination_transport(mut self, transport: Arc<dyn DestinationTransport>) -> Self {
        self.config.destination_transport = Some(transport);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ImportConfig, ImportError> {
        let c = &self.config;
        if c.max_retries == 0 {
            return Err(ImportError::InvalidConfig(
                "max_retries must be ≥ 1 (it counts the first attempt)".into(),
            ));
        }
        if c.initial_backoff_ms > c.max_backoff_ms {
            return Err(ImportError::InvalidConfig(format!(
                "initial backoff ({}ms) exceeds max backoff ({}ms)",
                c.initial_backoff_ms, c.max_backoff_ms
            )));
        }
        if c.supported_image_types.is_empty() {
            return Err(ImportError::InvalidConfig(
                "at least one supported image type is required".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_tunables() {
        let c = ImportConfig::default();
        assert_eq!(c.max_depth, 10);
        assert_eq!(c.max_retries, 3);
        assert_eq!(c.initial_backoff_ms, 1000);
        assert_eq!(c.max_backoff_ms, 4000);
        assert_eq!(c.max_image_bytes, 10 * 1024 * 1024);
        assert_eq!(c.supported_image_types.len(), 4);
    }

    #[test]
    fn debug_redacts_credentials() {
        let c = ImportConfig::builder()
            .notion_token("secret_very_private")
            .note_session("cookie-value")
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret_very_private"));
        assert!(!dbg.contains("cookie-value"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn builder_rejects_zero_retries() {
        let err = ImportConfig::builder().max_retries(0).build().unwrap_err();
        assert!(matches!(err, ImportError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_inverted_backoff() {
        let err = ImportConfig::builder()
            .initial_backoff_ms(5000)
            .max_backoff_ms(100)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("5000ms"));
    }

    #[test]
    fn page_size_is_clamped() {
        let c = ImportConfig::builder().page_size(500).build().unwrap();
        assert_eq!(c.page_size, 100);
    }

    #[test]
    fn accepts_image_type_ignores_parameters_and_case() {
        let c = ImportConfig::default();
        assert!(c.accepts_image_type("image/PNG"));
        assert!(c.accepts_image_type("image/jpeg; charset=binary"));
        assert!(!c.accepts_image_type("image/svg+xml"));
    }

    #[test]
    fn empty_session_is_not_a_credential() {
        let c = ImportConfig::builder().note_session("").build().unwrap();
        assert!(!c.has_destination_credentials());
    }
}
