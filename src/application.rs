//! Application module - Run orchestration on top of the domain seams
//!
//! Discovery planning, the scrape pipeline, and per-run statistics.

pub mod context;
pub mod discovery;
pub mod pipeline;

// Re-export commonly used items for convenience
pub use context::{CrawlStats, RunMode, RunSummary};
pub use discovery::DiscoveryPlanner;
pub use pipeline::{ReconcileSummary, ScrapePipeline};
