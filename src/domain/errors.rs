//! Error taxonomy for the crawl pipeline
//!
//! Every component boundary returns a tagged outcome instead of letting an
//! unchecked failure cross it. Only `DiscoveryError` and `ConfigError` are
//! fatal to a run; fetch and persistence failures degrade and are surfaced
//! in run statistics.

use thiserror::Error;

/// Failure of a single fetch attempt. Never fatal to the whole run; retry
/// policy belongs to the caller (in practice: the next run).
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("fetch of {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("backend error fetching {url}: {message}")]
    Backend { url: String, message: String },
}

impl FetchError {
    pub fn network(url: &str, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn timeout(url: &str, timeout_secs: u64) -> Self {
        Self::Timeout {
            url: url.to_string(),
            timeout_secs,
        }
    }

    pub fn backend(url: &str, message: impl Into<String>) -> Self {
        Self::Backend {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Short tag for stats and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Backend { .. } => "backend",
        }
    }
}

/// Top-level listing unparsable or empty. Fatal: without brands there is
/// nothing to crawl.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("brand listing at {url} yielded zero brands")]
    NoBrands { url: String },

    #[error("brand listing fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

/// Primary store unreachable or rejected a write. Recorded on the outcome,
/// degrades to backstop-only persistence; never fatal.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("primary store is not configured")]
    StoreUnavailable,
}

/// Missing or invalid configuration. Fatal for mandatory capabilities
/// (the fetch backend); optional ones degrade with a warning.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required capability: {0}")]
    MissingCapability(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file {path}: {message}")]
    Io { path: String, message: String },
}

/// Umbrella for the only errors that terminate a run. Checkpoint and
/// backstop writes are the durability backbone; losing them is fatal too.
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("durable storage I/O failed: {0}")]
    Storage(#[source] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_kinds() {
        assert_eq!(FetchError::network("u", "refused").kind(), "network");
        assert_eq!(FetchError::timeout("u", 120).kind(), "timeout");
        assert_eq!(FetchError::backend("u", "500").kind(), "backend");
    }
}
