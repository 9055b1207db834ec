//! Crawl checkpoint record
//!
//! The single source of truth for resumability. Entries are added, never
//! removed, except by an explicit operator reset (`--fresh`). The record is
//! flushed to durable storage by the checkpoint store after every state
//! transition that must survive a crash.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot format version, bumped on incompatible layout changes.
pub const CHECKPOINT_VERSION: u32 = 1;

/// Durable record of completed brands and completed phone detail URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlCheckpoint {
    pub version: u32,
    pub completed_brands: BTreeSet<String>,
    pub completed_phone_urls: BTreeSet<String>,
    pub last_updated: DateTime<Utc>,
}

impl Default for CrawlCheckpoint {
    fn default() -> Self {
        Self {
            version: CHECKPOINT_VERSION,
            completed_brands: BTreeSet::new(),
            completed_phone_urls: BTreeSet::new(),
            last_updated: Utc::now(),
        }
    }
}

impl CrawlCheckpoint {
    /// A Complete brand is skipped for both discovery and detail scraping.
    pub fn is_brand_complete(&self, brand_name: &str) -> bool {
        self.completed_brands.contains(brand_name)
    }

    /// A Done phone URL is never re-fetched in a subsequent run.
    pub fn is_phone_done(&self, detail_url: &str) -> bool {
        self.completed_phone_urls.contains(detail_url)
    }

    /// Record a phone's terminal outcome for this run.
    pub fn mark_phone_done(&mut self, detail_url: &str) {
        self.completed_phone_urls.insert(detail_url.to_string());
        self.last_updated = Utc::now();
    }

    /// Transition a brand to Complete. Valid only once every one of its
    /// phones has reached a terminal per-run outcome; the pipeline enforces
    /// that precondition.
    pub fn mark_brand_complete(&mut self, brand_name: &str) {
        self.completed_brands.insert(brand_name.to_string());
        self.last_updated = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkpoint_transitions() {
        let mut cp = CrawlCheckpoint::default();
        assert!(!cp.is_brand_complete("Samsung"));
        assert!(!cp.is_phone_done("https://example.com/a.php"));

        cp.mark_phone_done("https://example.com/a.php");
        assert!(cp.is_phone_done("https://example.com/a.php"));

        cp.mark_brand_complete("Samsung");
        assert!(cp.is_brand_complete("Samsung"));
    }

    #[test]
    fn test_marking_is_idempotent() {
        let mut cp = CrawlCheckpoint::default();
        cp.mark_phone_done("https://example.com/a.php");
        cp.mark_phone_done("https://example.com/a.php");
        assert_eq!(cp.completed_phone_urls.len(), 1);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut cp = CrawlCheckpoint::default();
        cp.mark_phone_done("https://example.com/a.php");
        cp.mark_brand_complete("Nokia");

        let json = serde_json::to_string(&cp).unwrap();
        let back: CrawlCheckpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, CHECKPOINT_VERSION);
        assert!(back.is_brand_complete("Nokia"));
        assert!(back.is_phone_done("https://example.com/a.php"));
    }
}
