pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::LocalStorage;
pub use crate::config::MarketConfig;
pub use crate::core::catalog::{Catalog, IntegrityOptions, IntegrityReport};
pub use crate::core::market::MarketService;
pub use crate::core::snapshot::FileSnapshotRepository;
pub use crate::utils::error::{MarketError, Result};
