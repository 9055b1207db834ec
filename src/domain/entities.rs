//! Catalog entities discovered from the listing site

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A top-level brand grouping (e.g., Samsung) under which phones are listed.
///
/// Immutable after discovery; unique by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub name: String,
    /// Absolute URL of the first listing page for this brand
    pub listing_url: String,
    /// Device count advertised on the makers page; drives pagination bounds
    pub device_count: u32,
    pub slug: String,
}

/// A single catalog entry with its own detail page.
///
/// Unique by `detail_url` within a brand; discovered once, read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    pub brand: String,
    pub brand_slug: String,
    pub name: String,
    pub detail_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Semi-structured fields extracted from one detail page fetch.
///
/// Partial by design: a field the extractor could not match is simply absent.
/// Never carries error markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecRecord {
    pub fields: BTreeMap<String, String>,
    pub source_url: String,
    pub scraped_at: DateTime<Utc>,
}

impl SpecRecord {
    pub fn new(fields: BTreeMap<String, String>, source_url: &str) -> Self {
        Self {
            fields,
            source_url: source_url.to_string(),
            scraped_at: Utc::now(),
        }
    }

    /// Canonical display name: the extracted heading when present, otherwise
    /// the name already known from discovery.
    pub fn display_name<'a>(&'a self, discovered_name: &'a str) -> &'a str {
        self.fields
            .get("model_name")
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .unwrap_or(discovered_name)
    }
}

/// One processed phone as recorded in the per-brand backstop snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapedPhone {
    pub phone: Phone,
    pub specs: SpecRecord,
    /// Whether the primary-store write succeeded for this record
    pub persisted: bool,
}

/// Build a URL/database-safe slug from a display name.
///
/// Lowercases, maps every non-alphanumeric run to a single `-`, and trims.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
