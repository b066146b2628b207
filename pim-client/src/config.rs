//! Client configuration
//!
//! Built once at startup and shared read-only as `Arc<ClientConfig>`.

use crate::edit::ReselectPolicy;
use shared::ProductId;
use shared::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use std::time::Duration;

/// Relative paths of the backend endpoints the grid talks to
///
/// `{id}` is replaced by the product id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub products: String,
    pub product: String,
    pub bulk_download: String,
    pub categories: String,
    pub tags: String,
    pub families: String,
    pub attribute_groups: String,
    pub brands: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            products: "products/".into(),
            product: "products/{id}/".into(),
            bulk_download: "products/{id}/assets/bulk-download/".into(),
            categories: "categories/tree/".into(),
            tags: "tags/".into(),
            families: "families/".into(),
            attribute_groups: "attribute-groups/".into(),
            brands: "brands/".into(),
        }
    }
}

impl Endpoints {
    pub fn product_path(&self, id: &ProductId) -> String {
        self.product.replace("{id}", &encode_segment(id.as_str()))
    }

    pub fn bulk_download_path(&self, id: &ProductId) -> String {
        self.bulk_download
            .replace("{id}", &encode_segment(id.as_str()))
    }
}

fn encode_segment(segment: &str) -> String {
    percent_encoding::utf8_percent_encode(segment, percent_encoding::NON_ALPHANUMERIC).to_string()
}

/// User-facing notification text
///
/// `{field}`, `{attempts}` and `{file}` are substituted when a notice is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiCopy {
    pub fetch_failed: String,
    pub mutation_failed: String,
    pub validation_failed: String,
    pub download_ready: String,
    pub download_failed: String,
}

impl Default for UiCopy {
    fn default() -> Self {
        Self {
            fetch_failed: "Could not load products. Try again.".into(),
            mutation_failed: "Failed to update {field}. The previous value was restored.".into(),
            validation_failed: "Invalid value for {field}.".into(),
            download_ready: "Download ready: {file}".into(),
            download_failed: "Download failed after {attempts} attempts.".into(),
        }
    }
}

/// Client configuration for the product grid
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL (e.g., "http://localhost:8000/api")
    pub base_url: String,

    /// Bearer token
    pub token: Option<String>,

    /// Request timeout
    pub timeout: Duration,

    /// Ceiling applied to every `page_size` sent
    pub max_page_size: u32,

    pub default_page_size: u32,

    /// How long a cached page stays fresh
    pub cache_ttl: Duration,

    /// Total attempts for a bulk download (first try included)
    pub download_attempts: u32,

    /// Fixed pause between download attempts
    pub retry_delay: Duration,

    /// What selecting another cell does to an open edit
    pub reselect_policy: ReselectPolicy,

    pub endpoints: Endpoints,

    /// Locales the backend serves translated labels for
    pub locales: Vec<String>,

    pub copy: UiCopy,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: Duration::from_secs(30),
            max_page_size: MAX_PAGE_SIZE,
            default_page_size: DEFAULT_PAGE_SIZE,
            cache_ttl: Duration::from_secs(60),
            download_attempts: 3,
            retry_delay: Duration::from_millis(250),
            reselect_policy: ReselectPolicy::Discard,
            endpoints: Endpoints::default(),
            locales: vec!["en".into()],
            copy: UiCopy::default(),
        }
    }

    /// Load configuration from environment variables
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("PIM_API_URL").unwrap_or_else(|_| "http://localhost:8000/api".into());
        let mut config = Self::new(base_url);

        if let Some(token) = std::env::var("PIM_API_TOKEN").ok().filter(|s| !s.is_empty()) {
            config = config.with_token(token);
        }
        if let Some(secs) = env_parse::<u64>("PIM_TIMEOUT_SECS") {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(size) = env_parse::<u32>("PIM_PAGE_SIZE") {
            config = config.with_default_page_size(size);
        }
        if let Some(secs) = env_parse::<u64>("PIM_CACHE_TTL_SECS") {
            config = config.with_cache_ttl(Duration::from_secs(secs));
        }
        if let Some(attempts) = env_parse::<u32>("PIM_DOWNLOAD_ATTEMPTS") {
            config = config.with_download_attempts(attempts);
        }
        config
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_page_size(mut self, size: u32) -> Self {
        self.max_page_size = size.max(1);
        self
    }

    /// Page size used for the first page; clamped to `max_page_size`
    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.default_page_size = size.clamp(1, self.max_page_size);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// At least one attempt is always made
    pub fn with_download_attempts(mut self, attempts: u32) -> Self {
        self.download_attempts = attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_reselect_policy(mut self, policy: ReselectPolicy) -> Self {
        self.reselect_policy = policy;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_locales<I, S>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locales = locales.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_copy(mut self, copy: UiCopy) -> Self {
        self.copy = copy;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000/api")
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.max_page_size, 50);
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.cache_ttl, Duration::from_secs(60));
        assert_eq!(config.download_attempts, 3);
        assert_eq!(config.reselect_policy, ReselectPolicy::Discard);
    }

    #[test]
    fn test_builder_clamps() {
        let config = ClientConfig::new("http://x")
            .with_max_page_size(20)
            .with_default_page_size(500)
            .with_download_attempts(0);
        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.download_attempts, 1);
    }

    #[test]
    fn test_endpoint_paths_encode_id() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.product_path(&ProductId::new("42")), "products/42/");
        assert_eq!(
            endpoints.bulk_download_path(&ProductId::new("a/b")),
            "products/a%2Fb/assets/bulk-download/"
        );
    }
}
