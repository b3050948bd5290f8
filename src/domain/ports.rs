use crate::utils::error::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::hash::Hash;

/// 紀錄在線上格式中的結構描述，解碼時用來補預設值與轉換舊版欄位
#[derive(Debug)]
pub struct Schema {
    pub kind: &'static str,
    /// (舊版欄位, 新欄位)
    pub legacy_keys: &'static [(&'static str, &'static str)],
    /// Epoch-millisecond fields that take the clock's time when absent.
    pub timestamps: &'static [&'static str],
    /// An embedded object replaced by its `id`: (embedded key, id key).
    pub embedded_refs: &'static [(&'static str, &'static str)],
    /// Enum fields where an empty string means "use the default".
    pub blank_as_absent: &'static [&'static str],
    pub nested: &'static [(&'static str, &'static Schema)],
}

pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    type Id: Clone + Eq + Ord + Hash + Display + Send + Sync;

    const SCHEMA: &'static Schema;

    fn id(&self) -> &Self::Id;

    fn kind() -> &'static str {
        Self::SCHEMA.kind
    }
}

/// Resolves a weak reference. The referenced record may be gone.
pub trait Lookup<T: Entity> {
    fn resolve(&self, id: &T::Id) -> Option<&T>;

    fn contains(&self, id: &T::Id) -> bool {
        self.resolve(id).is_some()
    }
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = bool> + Send;
}

#[async_trait]
pub trait SnapshotRepository<T: Send + Sync>: Send + Sync {
    async fn load(&self) -> Result<T>;
    async fn save(&self, snapshot: &T) -> Result<()>;
}
