pub mod catalog;
pub mod codec;
pub mod export;
pub mod market;
pub mod snapshot;

pub use crate::domain::ports::{Entity, Lookup, SnapshotRepository, Storage};
pub use crate::utils::error::Result;
