//! Fetch capability and the rate-limited scheduler
//!
//! The pipeline depends only on the `Fetcher` contract. The concrete backend
//! is the Firecrawl scrape API, which returns page content as markdown. All
//! fetches funnel through `RateLimitedScheduler`: a single global token
//! bucket (one token per configured period) in front of the backend, so the
//! sequential pipeline gets fixed minimum spacing and a future concurrent
//! extension can share the same bucket.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::domain::errors::FetchError;
use crate::infrastructure::config::{CrawlConfig, FirecrawlConfig};

/// Per-fetch tuning passed through to the backend.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    /// Hint for how long the backend should wait for the page to settle
    pub wait_hint: Duration,
}

impl FetchOptions {
    pub fn from_crawl_config(config: &CrawlConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.request_timeout_secs),
            wait_hint: Duration::from_millis(config.wait_hint_ms),
        }
    }
}

/// Opaque fetch capability: URL in, page content (markdown) out.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, opts: &FetchOptions) -> Result<String, FetchError>;
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<ScrapeData>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
}

/// Firecrawl `/v1/scrape` backend.
pub struct FirecrawlFetcher {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl FirecrawlFetcher {
    pub fn new(config: &FirecrawlConfig, api_key: &str) -> Result<Self, FetchError> {
        let client = Client::builder()
            .gzip(true)
            .build()
            .map_err(|e| FetchError::backend(&config.endpoint, e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl Fetcher for FirecrawlFetcher {
    async fn fetch(&self, url: &str, opts: &FetchOptions) -> Result<String, FetchError> {
        let body = json!({
            "url": url,
            "formats": ["markdown"],
            "timeout": opts.timeout.as_millis() as u64,
            "waitFor": opts.wait_hint.as_millis() as u64,
        });

        let response = self
            .client
            .post(format!("{}/v1/scrape", self.endpoint))
            .bearer_auth(&self.api_key)
            .timeout(opts.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::timeout(url, opts.timeout.as_secs())
                } else {
                    FetchError::network(url, e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::backend(url, format!("HTTP {status}")));
        }

        let parsed: ScrapeResponse = response
            .json()
            .await
            .map_err(|e| FetchError::backend(url, format!("invalid response body: {e}")))?;

        if !parsed.success {
            let message = parsed.error.unwrap_or_else(|| "scrape rejected".to_string());
            return Err(FetchError::backend(url, message));
        }

        match parsed.data.and_then(|d| d.markdown).filter(|m| !m.is_empty()) {
            Some(markdown) => Ok(markdown),
            None => Err(FetchError::backend(url, "empty markdown in response")),
        }
    }
}

/// Global throttle in front of the fetch capability.
///
/// Before any fetch is issued the caller blocks until a token is available;
/// tokens refill at one per `rate_limit` period, which degenerates to fixed
/// minimum spacing under a single consumer. Every call increments the shared
/// calls-issued counter regardless of outcome. No internal retry: the tagged
/// error goes back to the caller.
pub struct RateLimitedScheduler {
    inner: Arc<dyn Fetcher>,
    limiter: Option<DefaultDirectRateLimiter>,
    options: FetchOptions,
    calls_issued: AtomicU64,
}

impl RateLimitedScheduler {
    pub fn new(inner: Arc<dyn Fetcher>, rate_limit: Duration, options: FetchOptions) -> Self {
        let limiter = Quota::with_period(rate_limit).map(RateLimiter::direct);
        Self {
            inner,
            limiter,
            options,
            calls_issued: AtomicU64::new(0),
        }
    }

    /// Throttled fetch with a timed, failure-tagged outcome.
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        self.calls_issued.fetch_add(1, Ordering::Relaxed);
        debug!("🌐 fetch: {url}");

        match tokio::time::timeout(self.options.timeout, self.inner.fetch(url, &self.options))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::timeout(url, self.options.timeout.as_secs())),
        }
    }

    /// Total fetches issued through this scheduler, successful or not.
    pub fn calls_issued(&self) -> u64 {
        self.calls_issued.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    struct StaticFetcher {
        content: String,
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, _url: &str, _opts: &FetchOptions) -> Result<String, FetchError> {
            Ok(self.content.clone())
        }
    }

    struct FailingFetcher;

    #[async_trait]
    impl Fetcher for FailingFetcher {
        async fn fetch(&self, url: &str, _opts: &FetchOptions) -> Result<String, FetchError> {
            Err(FetchError::network(url, "connection refused"))
        }
    }

    struct SlowFetcher;

    #[async_trait]
    impl Fetcher for SlowFetcher {
        async fn fetch(&self, _url: &str, _opts: &FetchOptions) -> Result<String, FetchError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(String::new())
        }
    }

    fn options() -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(10),
            wait_hint: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_lower_bound() {
        let fetcher = Arc::new(StaticFetcher {
            content: "ok".to_string(),
        });
        let period = Duration::from_millis(40);
        let scheduler = RateLimitedScheduler::new(fetcher, period, options());

        let n = 4;
        let start = Instant::now();
        for i in 0..n {
            scheduler
                .fetch(&format!("https://example.com/{i}"))
                .await
                .unwrap();
        }
        let elapsed = start.elapsed();

        // N consecutive fetches take at least (N-1) * D
        assert!(
            elapsed >= period * (n - 1),
            "elapsed {elapsed:?} below rate-limit floor"
        );
    }

    #[tokio::test]
    async fn test_calls_counter_increments_on_failure_too() {
        let scheduler = RateLimitedScheduler::new(
            Arc::new(FailingFetcher),
            Duration::from_millis(1),
            options(),
        );

        assert!(scheduler.fetch("https://example.com/a").await.is_err());
        assert!(scheduler.fetch("https://example.com/b").await.is_err());
        assert_eq!(scheduler.calls_issued(), 2);
    }

    #[tokio::test]
    async fn test_timeout_is_tagged() {
        let opts = FetchOptions {
            timeout: Duration::from_millis(20),
            wait_hint: Duration::from_millis(1),
        };
        let scheduler =
            RateLimitedScheduler::new(Arc::new(SlowFetcher), Duration::from_millis(1), opts);

        let err = scheduler.fetch("https://example.com/slow").await.unwrap_err();
        assert_eq!(err.kind(), "timeout");
    }
}
