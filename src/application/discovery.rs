//! Discovery planner
//!
//! Phase 1 of a run: enumerate brands from the makers page, then paginate
//! each brand's listing to collect phone URLs. Every page costs a
//! rate-limited call, so discovery output is captured in the catalog
//! snapshot (write-through, after every brand) and never repeated.

use tracing::{debug, info, warn};

use crate::application::context::CrawlStats;
use crate::domain::checkpoint::CrawlCheckpoint;
use crate::domain::entities::{Brand, Phone};
use crate::domain::errors::DiscoveryError;
use crate::infrastructure::config::CrawlConfig;
use crate::infrastructure::fetcher::RateLimitedScheduler;
use crate::infrastructure::parsing::{brand_pagination_url, parse_brand_listing, parse_phone_links};
use crate::infrastructure::snapshots::{BrandCatalog, CatalogSnapshot, SnapshotStore};

pub struct DiscoveryPlanner<'a> {
    scheduler: &'a RateLimitedScheduler,
    config: &'a CrawlConfig,
}

impl<'a> DiscoveryPlanner<'a> {
    pub fn new(scheduler: &'a RateLimitedScheduler, config: &'a CrawlConfig) -> Self {
        Self { scheduler, config }
    }

    /// Fetch the makers page once and parse it into brands, sorted by device
    /// count descending (stable: ties keep discovery order) so high-value
    /// brands are processed first. Zero parsed brands is fatal.
    pub async fn discover_brands(&self) -> Result<Vec<Brand>, DiscoveryError> {
        info!("Fetching brand listing: {}", self.config.brands_url);
        let markdown = self.scheduler.fetch(&self.config.brands_url).await?;

        let mut brands = parse_brand_listing(&markdown);
        if brands.is_empty() {
            return Err(DiscoveryError::NoBrands {
                url: self.config.brands_url.clone(),
            });
        }
        brands.sort_by(|a, b| b.device_count.cmp(&a.device_count));

        info!("Discovered {} brands", brands.len());
        for brand in brands.iter().take(10) {
            debug!("  {}: {} devices", brand.name, brand.device_count);
        }
        Ok(brands)
    }

    /// Upper bound on listing pages for a brand: enough pages for the
    /// advertised device count plus a safety margin, so pagination always
    /// terminates even against a backend that never returns an empty page.
    pub fn max_pages(&self, brand: &Brand) -> u32 {
        let page_size = self.config.page_size.max(1);
        let computed = brand.device_count.div_ceil(page_size) + self.config.safety_margin;
        match self.config.max_pages_per_brand {
            Some(cap) => computed.min(cap.max(1)),
            None => computed,
        }
    }

    /// Paginate one brand's listing, deduplicating by detail URL across
    /// pages. Stops on a page with zero new phones, on a page below the
    /// last-page threshold, or at the computed page bound. A page-fetch
    /// failure aborts pagination for this brand only; phones collected so
    /// far are kept.
    pub async fn discover_phones(&self, brand: &Brand) -> Vec<Phone> {
        let mut phones: Vec<Phone> = Vec::new();
        let max_pages = self.max_pages(brand);

        for page in 1..=max_pages {
            let Some(url) = brand_pagination_url(brand, page, &self.config.base_url) else {
                warn!("Cannot build page URL for {} from {}", brand.name, brand.listing_url);
                break;
            };

            let markdown = match self.scheduler.fetch(&url).await {
                Ok(markdown) => markdown,
                Err(e) => {
                    warn!("Page {page} of {} failed ({e}), keeping partial list", brand.name);
                    break;
                }
            };

            let mut new_on_page = 0usize;
            for phone in parse_phone_links(&markdown, brand) {
                if phones.iter().all(|p| p.detail_url != phone.detail_url) {
                    phones.push(phone);
                    new_on_page += 1;
                }
            }
            debug!("  {} page {page}: {new_on_page} new phones", brand.name);

            if new_on_page == 0 {
                break;
            }
            if new_on_page < self.config.last_page_threshold as usize {
                // Below a full page: this was the last one, skip the rest
                break;
            }
        }

        phones
    }

    /// Build or extend the catalog snapshot. Brands already captured (or
    /// Complete in the checkpoint) are not re-discovered; the snapshot is
    /// saved after every brand so an interruption loses at most one brand's
    /// pagination.
    pub async fn discover_catalog(
        &self,
        snapshots: &SnapshotStore,
        checkpoint: &CrawlCheckpoint,
        stats: &mut CrawlStats,
    ) -> Result<CatalogSnapshot, DiscoveryError> {
        let mut catalog = snapshots
            .load_catalog()
            .await
            .unwrap_or_else(CatalogSnapshot::empty);

        if catalog.complete {
            info!("Catalog snapshot is complete, skipping discovery");
            stats.brands_discovered = catalog.total_brands;
            stats.phones_discovered = catalog.total_phones;
            return Ok(catalog);
        }

        let brands = self.discover_brands().await?;
        stats.brands_discovered = brands.len();

        for brand in brands {
            if checkpoint.is_brand_complete(&brand.name) || catalog.has_brand(&brand.name) {
                continue;
            }
            info!("Discovering {} ({} devices)...", brand.name, brand.device_count);

            let phones = self.discover_phones(&brand).await;
            info!("  {}: {} phone URLs collected", brand.name, phones.len());
            stats.phones_discovered += phones.len();

            catalog.upsert_brand(BrandCatalog { brand, phones });
            if let Err(e) = snapshots.save_catalog(&catalog).await {
                warn!("Failed to save catalog snapshot: {e:#}");
            }
        }

        catalog.complete = true;
        if let Err(e) = snapshots.save_catalog(&catalog).await {
            warn!("Failed to save catalog snapshot: {e:#}");
        }
        info!(
            "Discovery complete: {} brands, {} phones",
            catalog.total_brands, catalog.total_phones
        );
        Ok(catalog)
    }
}
