//! Catalog cache port interface

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::CatalogSnapshot;

/// Cache errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Failed to read catalog cache: {0}")]
    Read(String),

    #[error("Failed to parse catalog cache: {0}")]
    Parse(String),

    #[error("Failed to write catalog cache: {0}")]
    Write(String),
}

/// Port for the persisted catalog snapshot
#[async_trait]
pub trait CatalogCache: Send + Sync {
    /// Load the last stored snapshot, `None` if nothing is cached
    async fn load(&self) -> Result<Option<CatalogSnapshot>, CacheError>;

    async fn store(&self, snapshot: &CatalogSnapshot) -> Result<(), CacheError>;

    async fn clear(&self) -> Result<(), CacheError>;
}
