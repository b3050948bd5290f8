use crate::core::catalog::{Catalog, CatalogSummary, IntegrityOptions, IntegrityReport};
use crate::core::export;
use crate::domain::ports::{SnapshotRepository, Storage};
use crate::domain::{Listing, ListingId, ListingStatus};
use crate::utils::error::{MarketError, Result};

#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub summary: CatalogSummary,
    pub report: IntegrityReport,
}

/// 串接快照讀取、完整性檢查與匯出
pub struct MarketService<R: SnapshotRepository<Catalog>, S: Storage> {
    repository: R,
    export_storage: S,
    options: IntegrityOptions,
    bundle_name: String,
}

impl<R: SnapshotRepository<Catalog>, S: Storage> MarketService<R, S> {
    pub fn new(repository: R, export_storage: S, options: IntegrityOptions) -> Self {
        Self {
            repository,
            export_storage,
            options,
            bundle_name: export::DEFAULT_BUNDLE_NAME.to_string(),
        }
    }

    pub fn with_bundle_name(mut self, bundle_name: impl Into<String>) -> Self {
        self.bundle_name = bundle_name.into();
        self
    }

    pub async fn check(&self) -> Result<CheckOutcome> {
        tracing::info!("🔍 Loading snapshot...");
        let catalog = self.repository.load().await?;
        let summary = catalog.summary();
        tracing::info!(
            "Loaded {} users, {} vehicles, {} listings, {} messages, {} histories",
            summary.users,
            summary.vehicles,
            summary.listings,
            summary.messages,
            summary.histories
        );

        let report = catalog.check_integrity(&self.options);
        for issue in &report.issues {
            tracing::debug!("{}", issue);
        }
        tracing::info!(
            "Integrity check finished: {} errors, {} warnings",
            report.error_count(),
            report.warning_count()
        );

        Ok(CheckOutcome { summary, report })
    }

    pub async fn export(&self) -> Result<String> {
        let catalog = self.repository.load().await?;
        if catalog.is_empty() {
            tracing::warn!("Snapshot is empty, exporting header-only files");
        }
        export::export_bundle(&catalog, &self.export_storage, &self.bundle_name).await
    }

    /// 載入、修改並寫回快照
    pub async fn update<F>(&self, change: F) -> Result<Catalog>
    where
        F: FnOnce(&mut Catalog) -> Result<()> + Send,
    {
        let mut catalog = self.repository.load().await?;
        change(&mut catalog)?;
        self.repository.save(&catalog).await?;
        Ok(catalog)
    }

    /// 變更單一刊登的狀態並寫回快照
    pub async fn set_listing_status(&self, id: &ListingId, status: ListingStatus) -> Result<Listing> {
        let catalog = self
            .update(|catalog| {
                let listing = catalog.listing_mut(id).ok_or_else(|| {
                    MarketError::validation("listing", "id", format!("listing '{}' does not exist", id))
                })?;
                listing.set_status(status)
            })
            .await?;

        let listing = catalog.listings().find(|l| &l.id == id).cloned().ok_or_else(|| {
            MarketError::validation("listing", "id", format!("listing '{}' does not exist", id))
        })?;
        tracing::info!("🏷️ Listing {} is now {}", listing.id, listing.status);
        Ok(listing)
    }
}
