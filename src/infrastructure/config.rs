//! Configuration infrastructure
//!
//! Loading and management of the scraper configuration. Settings fall into
//! three groups:
//! 1. Crawl tuning (rate limit, pagination bounds) — overridable per run
//! 2. Capabilities (fetch backend, primary store) — secrets come from env
//! 3. Logging

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::domain::errors::ConfigError;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub crawl: CrawlConfig,
    pub firecrawl: FirecrawlConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Crawl tuning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Minimum spacing between fetches in seconds (free tier: 10 req/min)
    pub rate_limit_secs: u64,

    /// Phones per listing page on the target site
    pub page_size: u32,

    /// Extra pages tried beyond ceil(device_count / page_size)
    pub safety_margin: u32,

    /// A page yielding fewer new phones than this signals the last page
    pub last_page_threshold: u32,

    /// Optional hard cap on pages per brand, overriding the computed bound
    pub max_pages_per_brand: Option<u32>,

    /// Timeout for a single fetch in seconds
    pub request_timeout_secs: u64,

    /// Hint for how long the backend should wait for the page to settle, ms
    pub wait_hint_ms: u64,

    /// Top-level makers listing URL
    pub brands_url: String,

    /// Site base URL for pagination URL assembly
    pub base_url: String,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            rate_limit_secs: 7,
            page_size: 50,
            safety_margin: 2,
            last_page_threshold: 40,
            max_pages_per_brand: None,
            request_timeout_secs: 120,
            wait_hint_ms: 30_000,
            brands_url: "https://www.gsmarena.com/makers.php3".to_string(),
            base_url: "https://www.gsmarena.com".to_string(),
        }
    }
}

/// Fetch backend settings. The API key is mandatory for any crawling run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirecrawlConfig {
    /// Taken from FIRECRAWL_API_KEY when absent from the config file
    pub api_key: Option<String>,
    pub endpoint: String,
}

impl Default for FirecrawlConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: "https://api.firecrawl.dev".to_string(),
        }
    }
}

/// Storage locations. The database is optional: without it the run degrades
/// to backstop-only persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding checkpoint, catalog and backstop snapshots
    pub data_dir: PathBuf,

    /// Taken from DATABASE_URL when absent from the config file
    pub database_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            database_url: None,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Also write logs to a file under data_dir/logs
    pub file_output: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_output: false,
        }
    }
}

impl AppConfig {
    /// Path of the checkpoint snapshot
    pub fn checkpoint_path(&self) -> PathBuf {
        self.storage.data_dir.join("scraping_progress.json")
    }

    /// Path of the catalog snapshot
    pub fn catalog_path(&self) -> PathBuf {
        self.storage.data_dir.join("gsmarena_all_urls.json")
    }

    /// Directory of the per-brand backstop snapshots
    pub fn backstop_dir(&self) -> PathBuf {
        self.storage.data_dir.join("snapshots")
    }

    /// The fetch capability is mandatory; fail startup without it.
    pub fn require_fetch_capability(&self) -> Result<&str, ConfigError> {
        self.firecrawl
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ConfigError::MissingCapability(
                    "Firecrawl API key (set FIRECRAWL_API_KEY)".to_string(),
                )
            })
    }
}

/// Loads and saves the configuration file, applying env overrides for secrets.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Use the platform config dir (falling back to the working directory).
    pub fn new() -> Self {
        let config_path = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gsmarena-scraper")
            .join("config.json");
        Self { config_path }
    }

    pub fn with_path(config_path: impl AsRef<Path>) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// Load the config file if present, otherwise defaults; then apply env
    /// overrides for secrets.
    pub async fn load_config(&self) -> Result<AppConfig> {
        let mut config = if self.config_path.exists() {
            let raw = fs::read_to_string(&self.config_path)
                .await
                .with_context(|| format!("reading {}", self.config_path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", self.config_path.display()))?
        } else {
            info!(
                "No config file at {}, using defaults",
                self.config_path.display()
            );
            AppConfig::default()
        };

        if config.firecrawl.api_key.is_none() {
            config.firecrawl.api_key = std::env::var("FIRECRAWL_API_KEY").ok();
        }
        if config.storage.database_url.is_none() {
            config.storage.database_url = std::env::var("DATABASE_URL").ok();
        }

        Ok(config)
    }

    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, raw)
            .await
            .with_context(|| format!("writing {}", self.config_path.display()))?;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_free_tier_limits() {
        let config = AppConfig::default();
        assert_eq!(config.crawl.rate_limit_secs, 7);
        assert_eq!(config.crawl.page_size, 50);
        assert_eq!(config.crawl.last_page_threshold, 40);
        assert_eq!(config.crawl.safety_margin, 2);
    }

    #[test]
    fn test_fetch_capability_required() {
        let mut config = AppConfig::default();
        config.firecrawl.api_key = None;
        assert!(config.require_fetch_capability().is_err());

        config.firecrawl.api_key = Some("fc-test".to_string());
        assert_eq!(config.require_fetch_capability().unwrap(), "fc-test");
    }

    #[tokio::test]
    async fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));

        let mut config = AppConfig::default();
        config.crawl.rate_limit_secs = 3;
        manager.save_config(&config).await.unwrap();

        let loaded = manager.load_config().await.unwrap();
        assert_eq!(loaded.crawl.rate_limit_secs, 3);
    }
}
