//! Scrape pipeline orchestrator
//!
//! Phase 2 of a run: iterate the catalog in checkpoint order, and for every
//! Pending phone fetch → extract → persist, advancing the checkpoint
//! write-through after each phone and each brand. The run always completes
//! and exits cleanly with partial coverage; only discovery and configuration
//! failures (and loss of the durability backbone itself) are fatal.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::context::{CrawlStats, RunMode, RunSummary};
use crate::application::discovery::DiscoveryPlanner;
use crate::domain::checkpoint::CrawlCheckpoint;
use crate::domain::entities::{slugify, Phone, ScrapedPhone, SpecRecord};
use crate::domain::errors::{CrawlError, PersistenceError};
use crate::domain::repositories::{PersistOutcome, SpecStore};
use crate::infrastructure::checkpoint_store::CheckpointStore;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::fetcher::RateLimitedScheduler;
use crate::infrastructure::parsing::SpecExtractor;
use crate::infrastructure::snapshots::{BrandCatalog, SnapshotStore};

/// Accounting for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileSummary {
    pub replayed: usize,
    pub failed: usize,
    pub already_persisted: usize,
}

pub struct ScrapePipeline {
    config: AppConfig,
    scheduler: RateLimitedScheduler,
    extractor: SpecExtractor,
    /// Primary store; None degrades the run to backstop-only persistence
    store: Option<Arc<dyn SpecStore>>,
    checkpoints: CheckpointStore,
    snapshots: SnapshotStore,
}

impl ScrapePipeline {
    pub fn new(
        config: AppConfig,
        scheduler: RateLimitedScheduler,
        store: Option<Arc<dyn SpecStore>>,
    ) -> Self {
        let checkpoints = CheckpointStore::new(config.checkpoint_path());
        let snapshots = SnapshotStore::new(config.catalog_path(), config.backstop_dir());
        if store.is_none() {
            warn!("Primary store not configured: persisting to backstop snapshots only");
        }
        Self {
            config,
            scheduler,
            extractor: SpecExtractor::default(),
            store,
            checkpoints,
            snapshots,
        }
    }

    /// Execute a full crawl: discovery (or catalog reuse), then detail
    /// scraping of every Pending phone.
    pub async fn run(&self, mode: RunMode) -> Result<RunSummary, CrawlError> {
        let mut stats = CrawlStats::new();

        if mode == RunMode::Fresh {
            self.checkpoints.reset().await.map_err(CrawlError::Storage)?;
            self.snapshots
                .reset_catalog()
                .await
                .map_err(CrawlError::Storage)?;
        }

        let mut checkpoint = self.checkpoints.load_or_default().await;

        let planner = DiscoveryPlanner::new(&self.scheduler, &self.config.crawl);
        let catalog = planner
            .discover_catalog(&self.snapshots, &checkpoint, &mut stats)
            .await?;

        for entry in &catalog.brands {
            if checkpoint.is_brand_complete(&entry.brand.name) {
                debug!("[SKIP] {} - already complete", entry.brand.name);
                continue;
            }
            self.scrape_brand(entry, &mut checkpoint, &mut stats).await?;
        }

        let summary = RunSummary {
            stats,
            calls_issued: self.scheduler.calls_issued(),
        };
        summary.log();
        Ok(summary)
    }

    /// Process every Pending phone of one brand. Fetch failures leave the
    /// phone Pending for the next run; the brand reaches Complete only when
    /// every phone has a terminal outcome this run.
    async fn scrape_brand(
        &self,
        entry: &BrandCatalog,
        checkpoint: &mut CrawlCheckpoint,
        stats: &mut CrawlStats,
    ) -> Result<(), CrawlError> {
        let brand = &entry.brand;
        let pending = entry
            .phones
            .iter()
            .filter(|p| !checkpoint.is_phone_done(&p.detail_url))
            .count();
        info!(
            "BRAND: {} ({} phones, {} pending)",
            brand.name,
            entry.phones.len(),
            pending
        );

        let mut backstop = self.snapshots.load_backstop(&brand.name, &brand.slug).await;
        let mut fetch_failures = 0usize;

        for phone in &entry.phones {
            if checkpoint.is_phone_done(&phone.detail_url) {
                debug!("  [SKIP] {}", phone.name);
                continue;
            }

            let markdown = match self.scheduler.fetch(&phone.detail_url).await {
                Ok(markdown) => markdown,
                Err(e) => {
                    // Stays Pending; retried on the next run, not in-run
                    warn!("  {} fetch failed ({})", phone.name, e);
                    stats.fetch_errors += 1;
                    fetch_failures += 1;
                    continue;
                }
            };

            let record = self.extractor.extract_record(&markdown, &phone.detail_url);
            debug!("  {}: {} fields extracted", phone.name, record.fields.len());

            let persisted = match self.persist(phone, &record).await {
                Ok(_) => {
                    stats.phones_saved_to_db += 1;
                    true
                }
                Err(PersistenceError::StoreUnavailable) => false,
                Err(e) => {
                    warn!("  {} persist failed ({}), backstop only", phone.name, e);
                    stats.persist_errors += 1;
                    false
                }
            };
            stats.phones_scraped += 1;

            backstop.upsert(ScrapedPhone {
                phone: phone.clone(),
                specs: record,
                persisted,
            });
            self.snapshots
                .save_backstop(&brand.slug, &backstop)
                .await
                .map_err(CrawlError::Storage)?;

            // Write-through: flushed per phone, never batched, so a crash
            // loses at most this one item's in-flight state
            checkpoint.mark_phone_done(&phone.detail_url);
            self.checkpoints
                .flush(checkpoint)
                .await
                .map_err(CrawlError::Storage)?;
        }

        if fetch_failures == 0 {
            checkpoint.mark_brand_complete(&brand.name);
            self.checkpoints
                .flush(checkpoint)
                .await
                .map_err(CrawlError::Storage)?;
            info!("{} COMPLETE", brand.name);
        } else {
            info!(
                "{} left in progress: {} phones still pending",
                brand.name, fetch_failures
            );
        }
        Ok(())
    }

    /// Two-step idempotent persist: find-or-create the brand by name, then
    /// upsert the phone and its spec record.
    async fn persist(
        &self,
        phone: &Phone,
        record: &SpecRecord,
    ) -> Result<PersistOutcome, PersistenceError> {
        let store = self.store.as_deref().ok_or(PersistenceError::StoreUnavailable)?;
        let brand_id = store
            .find_or_create_brand(&phone.brand, &slugify(&phone.brand))
            .await?;
        let phone_id = store.upsert_phone(brand_id, phone, record).await?;
        Ok(PersistOutcome { brand_id, phone_id })
    }

    /// Replay backstop entries whose primary-store write failed. An item is
    /// checkpointed Done even when that write failed, so this pass is the
    /// documented path that brings the primary store back in sync without
    /// spending any fetch credits.
    pub async fn reconcile(&self) -> Result<ReconcileSummary, CrawlError> {
        if self.store.is_none() {
            return Err(CrawlError::Config(
                crate::domain::errors::ConfigError::MissingCapability(
                    "primary store (set DATABASE_URL)".to_string(),
                ),
            ));
        }

        let mut summary = ReconcileSummary::default();
        let paths = self
            .snapshots
            .list_backstops()
            .await
            .map_err(CrawlError::Storage)?;

        for path in paths {
            let mut snapshot = match self.snapshots.load_backstop_file(&path).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    warn!("Skipping unreadable backstop {}: {e:#}", path.display());
                    continue;
                }
            };

            let mut changed = false;
            for entry in &mut snapshot.phones {
                if entry.persisted {
                    summary.already_persisted += 1;
                    continue;
                }
                match self.persist(&entry.phone, &entry.specs).await {
                    Ok(_) => {
                        entry.persisted = true;
                        changed = true;
                        summary.replayed += 1;
                    }
                    Err(e) => {
                        warn!("  {} replay failed ({})", entry.phone.name, e);
                        summary.failed += 1;
                    }
                }
            }

            if changed {
                self.snapshots
                    .save_backstop_file(&path, &snapshot)
                    .await
                    .map_err(CrawlError::Storage)?;
            }
        }

        info!(
            "Reconcile: {} replayed, {} failed, {} already persisted",
            summary.replayed, summary.failed, summary.already_persisted
        );
        Ok(summary)
    }
}
