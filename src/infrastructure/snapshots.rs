//! Catalog and backstop snapshots
//!
//! The catalog snapshot captures discovery output so listing pages are never
//! re-fetched once captured (each one costs a rate-limited call). The
//! per-brand backstop snapshot is a local durability copy of extracted
//! records, independent of and not transactional with the primary store.

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::domain::entities::{Brand, Phone, ScrapedPhone};
use crate::infrastructure::fs_atomic::{read_json, write_json_atomic};

/// One brand's discovered phone list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandCatalog {
    pub brand: Brand,
    pub phones: Vec<Phone>,
}

/// Discovery output for the whole site.
///
/// Brands are kept as an ordered list (device-count descending) so the
/// processing order survives serialization; `complete` marks a finished
/// discovery phase, letting resume skip even the makers fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub timestamp: DateTime<Utc>,
    pub total_brands: usize,
    pub total_phones: usize,
    #[serde(default)]
    pub complete: bool,
    pub brands: Vec<BrandCatalog>,
}

impl CatalogSnapshot {
    pub fn empty() -> Self {
        Self {
            timestamp: Utc::now(),
            total_brands: 0,
            total_phones: 0,
            complete: false,
            brands: Vec::new(),
        }
    }

    pub fn has_brand(&self, brand_name: &str) -> bool {
        self.brands.iter().any(|b| b.brand.name == brand_name)
    }

    /// Add or replace one brand's phone list and refresh the totals.
    pub fn upsert_brand(&mut self, entry: BrandCatalog) {
        match self
            .brands
            .iter_mut()
            .find(|b| b.brand.name == entry.brand.name)
        {
            Some(existing) => *existing = entry,
            None => self.brands.push(entry),
        }
        self.total_brands = self.brands.len();
        self.total_phones = self.brands.iter().map(|b| b.phones.len()).sum();
        self.timestamp = Utc::now();
    }
}

/// Per-brand durability backstop, rewritten after every processed phone.
/// Append-only in practice: entries are upserted by detail URL, never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandSnapshot {
    pub brand_name: String,
    pub timestamp: DateTime<Utc>,
    pub count: usize,
    pub phones: Vec<ScrapedPhone>,
}

impl BrandSnapshot {
    pub fn new(brand_name: &str) -> Self {
        Self {
            brand_name: brand_name.to_string(),
            timestamp: Utc::now(),
            count: 0,
            phones: Vec::new(),
        }
    }

    pub fn upsert(&mut self, scraped: ScrapedPhone) {
        match self
            .phones
            .iter_mut()
            .find(|p| p.phone.detail_url == scraped.phone.detail_url)
        {
            Some(existing) => *existing = scraped,
            None => self.phones.push(scraped),
        }
        self.count = self.phones.len();
        self.timestamp = Utc::now();
    }
}

/// Filesystem access for both snapshot kinds; all writes are atomic.
pub struct SnapshotStore {
    catalog_path: PathBuf,
    backstop_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(catalog_path: impl AsRef<Path>, backstop_dir: impl AsRef<Path>) -> Self {
        Self {
            catalog_path: catalog_path.as_ref().to_path_buf(),
            backstop_dir: backstop_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn load_catalog(&self) -> Option<CatalogSnapshot> {
        if !self.catalog_path.exists() {
            return None;
        }
        match read_json::<CatalogSnapshot>(&self.catalog_path).await {
            Ok(catalog) => {
                info!(
                    "Loaded catalog snapshot: {} brands, {} phones",
                    catalog.total_brands, catalog.total_phones
                );
                Some(catalog)
            }
            Err(e) => {
                warn!("Catalog snapshot unreadable ({e:#}), rediscovering");
                None
            }
        }
    }

    pub async fn save_catalog(&self, catalog: &CatalogSnapshot) -> Result<()> {
        write_json_atomic(&self.catalog_path, catalog).await
    }

    pub async fn reset_catalog(&self) -> Result<()> {
        if self.catalog_path.exists() {
            fs::remove_file(&self.catalog_path).await?;
            info!("Catalog snapshot reset: {}", self.catalog_path.display());
        }
        Ok(())
    }

    fn backstop_path(&self, brand_slug: &str) -> PathBuf {
        self.backstop_dir.join(format!("scraped_{brand_slug}.json"))
    }

    /// Load a brand's backstop, or start an empty one.
    pub async fn load_backstop(&self, brand_name: &str, brand_slug: &str) -> BrandSnapshot {
        let path = self.backstop_path(brand_slug);
        if !path.exists() {
            return BrandSnapshot::new(brand_name);
        }
        match read_json::<BrandSnapshot>(&path).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Backstop snapshot unreadable ({e:#}), starting empty");
                BrandSnapshot::new(brand_name)
            }
        }
    }

    pub async fn save_backstop(&self, brand_slug: &str, snapshot: &BrandSnapshot) -> Result<()> {
        write_json_atomic(&self.backstop_path(brand_slug), snapshot).await
    }

    /// All backstop snapshot paths, for reconciliation.
    pub async fn list_backstops(&self) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        if !self.backstop_dir.exists() {
            return Ok(paths);
        }
        let mut entries = fs::read_dir(&self.backstop_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    pub async fn load_backstop_file(&self, path: &Path) -> Result<BrandSnapshot> {
        read_json(path).await
    }

    pub async fn save_backstop_file(&self, path: &Path, snapshot: &BrandSnapshot) -> Result<()> {
        write_json_atomic(path, snapshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::SpecRecord;
    use std::collections::BTreeMap;

    fn brand() -> Brand {
        Brand {
            name: "Nokia".to_string(),
            listing_url: "https://www.gsmarena.com/nokia-phones-1.php".to_string(),
            device_count: 494,
            slug: "nokia_1".to_string(),
        }
    }

    fn phone(url: &str) -> Phone {
        Phone {
            brand: "Nokia".to_string(),
            brand_slug: "nokia_1".to_string(),
            name: "Nokia 3310".to_string(),
            detail_url: url.to_string(),
            image: None,
        }
    }

    #[tokio::test]
    async fn test_catalog_roundtrip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("catalog.json"), dir.path().join("snaps"));

        let mut catalog = CatalogSnapshot::empty();
        catalog.upsert_brand(BrandCatalog {
            brand: Brand {
                name: "Samsung".to_string(),
                ..brand()
            },
            phones: vec![phone("https://example.com/s1.php")],
        });
        catalog.upsert_brand(BrandCatalog {
            brand: brand(),
            phones: vec![phone("https://example.com/n1.php")],
        });
        store.save_catalog(&catalog).await.unwrap();

        let loaded = store.load_catalog().await.unwrap();
        assert_eq!(loaded.total_brands, 2);
        assert_eq!(loaded.total_phones, 2);
        assert_eq!(loaded.brands[0].brand.name, "Samsung");
        assert_eq!(loaded.brands[1].brand.name, "Nokia");
    }

    #[tokio::test]
    async fn test_backstop_upsert_never_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("catalog.json"), dir.path().join("snaps"));

        let mut snapshot = BrandSnapshot::new("Nokia");
        let record = SpecRecord::new(BTreeMap::new(), "https://example.com/n1.php");
        snapshot.upsert(ScrapedPhone {
            phone: phone("https://example.com/n1.php"),
            specs: record.clone(),
            persisted: false,
        });
        snapshot.upsert(ScrapedPhone {
            phone: phone("https://example.com/n1.php"),
            specs: record,
            persisted: true,
        });
        assert_eq!(snapshot.count, 1);
        assert!(snapshot.phones[0].persisted);

        store.save_backstop("nokia_1", &snapshot).await.unwrap();
        let loaded = store.load_backstop("Nokia", "nokia_1").await;
        assert_eq!(loaded.count, 1);

        let paths = store.list_backstops().await.unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_backstop_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path().join("catalog.json"), dir.path().join("snaps"));
        let snapshot = store.load_backstop("Nokia", "nokia_1").await;
        assert_eq!(snapshot.count, 0);
        assert_eq!(snapshot.brand_name, "Nokia");
    }
}
