//! Infrastructure module - Concrete capabilities behind the domain seams
//!
//! HTTP fetch backend and rate limiting, markdown parsing, snapshot and
//! checkpoint files, the SQLite store, configuration and logging.

pub mod checkpoint_store;
pub mod config;
pub mod fetcher;
pub mod fs_atomic;
pub mod logging;
pub mod parsing;
pub mod phone_repository;
pub mod snapshots;

// Re-export commonly used items for convenience
pub use checkpoint_store::CheckpointStore;
pub use config::{AppConfig, ConfigManager};
pub use fetcher::{FetchOptions, Fetcher, FirecrawlFetcher, RateLimitedScheduler};
pub use parsing::SpecExtractor;
pub use phone_repository::SqliteSpecStore;
pub use snapshots::{BrandCatalog, BrandSnapshot, CatalogSnapshot, SnapshotStore};
