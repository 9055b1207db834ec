//! Run context and statistics
//!
//! Counters are owned by an explicit context object passed through the
//! pipeline, not ambient global state. The sequential design has a single
//! writer, so plain fields suffice; the calls-issued counter lives inside
//! the scheduler and is already atomic.

use chrono::{DateTime, Utc};
use tracing::info;

/// How a run treats existing progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Continue from the durable checkpoint (default)
    Resume,
    /// Operator reset: discard checkpoint and catalog snapshot first
    Fresh,
}

/// Mutable per-run statistics.
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub brands_discovered: usize,
    pub phones_discovered: usize,
    pub phones_scraped: usize,
    pub phones_saved_to_db: usize,
    pub fetch_errors: usize,
    pub persist_errors: usize,
    pub started_at: DateTime<Utc>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            brands_discovered: 0,
            phones_discovered: 0,
            phones_scraped: 0,
            phones_saved_to_db: 0,
            fetch_errors: 0,
            persist_errors: 0,
            started_at: Utc::now(),
        }
    }

    pub fn elapsed_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Final accounting for one run, returned to the caller and logged.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: CrawlStats,
    /// Total rate-limited calls issued, successful or not
    pub calls_issued: u64,
}

impl RunSummary {
    pub fn log(&self) {
        info!("═══════════════════════════════════════");
        info!("SCRAPING COMPLETE");
        info!("  Brands discovered:  {}", self.stats.brands_discovered);
        info!("  Phones discovered:  {}", self.stats.phones_discovered);
        info!("  Phones scraped:     {}", self.stats.phones_scraped);
        info!("  Phones saved to DB: {}", self.stats.phones_saved_to_db);
        info!("  Fetch errors:       {}", self.stats.fetch_errors);
        info!("  Persist errors:     {}", self.stats.persist_errors);
        info!("  Credits used:       {}", self.calls_issued);
        info!("  Elapsed:            {}s", self.stats.elapsed_seconds());
        info!("═══════════════════════════════════════");
    }
}
