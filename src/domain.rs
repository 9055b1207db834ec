//! Domain module - Core entities and business rules
//!
//! Contains the catalog entities, the crawl checkpoint record, the error
//! taxonomy used at component boundaries, and the durable-storage seam.
//!
//! Modern Rust module organization (Rust 2018+ style):
//! - Each module is its own file in the domain/ directory
//! - Public exports are defined here for convenience

pub mod checkpoint;
pub mod entities;
pub mod errors;
pub mod repositories;

// Re-export commonly used items for convenience
pub use checkpoint::CrawlCheckpoint;
pub use entities::{Brand, Phone, ScrapedPhone, SpecRecord};
pub use errors::{ConfigError, CrawlError, DiscoveryError, FetchError, PersistenceError};
pub use repositories::{PersistOutcome, SpecStore};
