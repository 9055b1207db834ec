//! Durable storage capability
//!
//! The pipeline only depends on this contract, not on a concrete database.
//! The SQLite implementation lives in the infrastructure layer.

use async_trait::async_trait;

use crate::domain::entities::{Phone, SpecRecord};
use crate::domain::errors::PersistenceError;

/// Result of one two-step persist operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistOutcome {
    pub brand_id: i64,
    pub phone_id: i64,
}

/// Idempotent writes to the primary store.
///
/// Re-applying the same natural key overwrites with the newest field values,
/// never duplicates.
#[async_trait]
pub trait SpecStore: Send + Sync {
    /// Find the brand row by natural key `name`, creating it if absent.
    async fn find_or_create_brand(&self, name: &str, slug: &str) -> Result<i64, PersistenceError>;

    /// Upsert the phone and its spec record, keyed by `(brand_id, phone_slug)`.
    /// Conflict policy: overwrite-on-duplicate with the newest values.
    async fn upsert_phone(
        &self,
        brand_id: i64,
        phone: &Phone,
        record: &SpecRecord,
    ) -> Result<i64, PersistenceError>;
}
