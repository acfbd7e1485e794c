use crate::error::{CrawlError, Result};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Immutable configuration for a single crawl run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlConfig {
    /// The URL the crawl starts from.
    pub seed_url: String,
    /// Maximum link distance from the seed; pages beyond it are never fetched.
    pub max_depth: usize,
    /// Hard cap on the number of pages ever accepted for fetching.
    pub max_pages: usize,
    /// Restrict fetching to the seed's exact host.
    pub same_domain_only: bool,
    /// Pause each worker observes after every fetch attempt.
    pub delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of concurrent fetch workers.
    pub workers: usize,
    /// Response bodies beyond this many bytes are abandoned.
    pub max_body_bytes: u64,
    pub user_agent: String,
}

impl CrawlConfig {
    pub fn new(seed_url: impl Into<String>) -> Self {
        Self {
            seed_url: seed_url.into(),
            max_depth: 3,
            max_pages: 200,
            same_domain_only: true,
            delay: Duration::ZERO,
            timeout: Duration::from_secs(10),
            workers: 10,
            max_body_bytes: 5 * 1024 * 1024,
            user_agent: format!("sitegraph/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    pub fn with_same_domain_only(mut self, restrict: bool) -> Self {
        self.same_domain_only = restrict;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_max_body_bytes(mut self, bytes: u64) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    /// Check the limits and the seed URL before a run starts. Any violation
    /// here fails the whole run; nothing is fetched.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(CrawlError::Config("max_pages must be at least 1".into()));
        }
        if self.workers == 0 {
            return Err(CrawlError::Config("workers must be at least 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(CrawlError::Config("timeout must be greater than zero".into()));
        }
        let seed = Url::parse(&self.seed_url)
            .map_err(|e| CrawlError::Config(format!("invalid seed URL '{}': {}", self.seed_url, e)))?;
        if seed.scheme() != "http" && seed.scheme() != "https" {
            return Err(CrawlError::Config(format!(
                "seed URL must be http or https, got '{}'",
                seed.scheme()
            )));
        }
        Ok(())
    }
}
