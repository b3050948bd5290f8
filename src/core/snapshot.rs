use crate::core::catalog::Catalog;
use crate::domain::clock::Clock;
use crate::domain::ports::{SnapshotRepository, Storage};
use crate::utils::error::{MarketError, Result};
use async_trait::async_trait;

/// 以單一 JSON 檔保存整個紀錄集合
pub struct FileSnapshotRepository<S: Storage, C: Clock> {
    storage: S,
    clock: C,
    file_name: String,
}

impl<S: Storage, C: Clock> FileSnapshotRepository<S, C> {
    pub fn new(storage: S, clock: C, file_name: impl Into<String>) -> Self {
        Self {
            storage,
            clock,
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[async_trait]
impl<S: Storage, C: Clock> SnapshotRepository<Catalog> for FileSnapshotRepository<S, C> {
    async fn load(&self) -> Result<Catalog> {
        if !self.storage.exists(&self.file_name).await {
            tracing::info!("📭 No snapshot at {}, starting empty", self.file_name);
            return Ok(Catalog::new());
        }

        let bytes = self.storage.read_file(&self.file_name).await?;
        let text = String::from_utf8(bytes).map_err(|e| MarketError::DecodeError {
            kind: "snapshot".to_string(),
            line: None,
            message: e.to_string(),
        })?;
        let catalog = Catalog::from_document_str(&text, &self.clock)?;
        tracing::info!("📂 Loaded snapshot {}: {:?}", self.file_name, catalog.summary());
        Ok(catalog)
    }

    async fn save(&self, snapshot: &Catalog) -> Result<()> {
        let text = snapshot.to_document_string()?;
        self.storage.write_file(&self.file_name, text.as_bytes()).await?;
        tracing::info!("💾 Saved snapshot {}: {:?}", self.file_name, snapshot.summary());
        Ok(())
    }
}
