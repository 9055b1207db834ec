//! Checkpointed scraper for the GSMArena device catalog.
//!
//! Three layers:
//! - `domain`: entities, the checkpoint model, the error taxonomy, and the
//!   persistence contract
//! - `application`: discovery planning and the resumable scrape pipeline
//! - `infrastructure`: Firecrawl fetch backend, rate limiting, markdown
//!   parsing, snapshot files, SQLite store, configuration and logging
//!
//! Every unit of progress is flushed to the checkpoint before the next fetch
//! is issued, so a run can be killed at any point and resumed without
//! re-spending fetch credits on finished work.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{RunMode, RunSummary, ScrapePipeline};
pub use domain::{Brand, CrawlCheckpoint, Phone, ScrapedPhone, SpecRecord};
pub use infrastructure::{AppConfig, ConfigManager};
