//! Asset price lookup.
//!
//! The catalog itself (registration, updates) belongs to the surrounding
//! system; the core only needs a point-in-time price read.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use common::{AssetId, Money};

use crate::{Result, StoreError};

/// Trait for asset price lookups.
#[async_trait]
pub trait AssetCatalog: Send + Sync {
    /// Returns the asset's current price, or [`StoreError::AssetNotFound`].
    async fn price_of(&self, asset: AssetId) -> Result<Money>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    prices: HashMap<AssetId, Money>,
    fail_on_read: bool,
}

/// In-memory asset catalog for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAssetCatalog {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryAssetCatalog {
    /// Creates a new empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset with the given price and returns its generated ID.
    pub fn insert(&self, price: Money) -> AssetId {
        let asset = AssetId::new();
        self.state.write().unwrap().prices.insert(asset, price);
        asset
    }

    /// Configures the catalog to fail every read with a database error,
    /// simulating a lookup outage.
    pub fn set_fail_on_read(&self, fail: bool) {
        self.state.write().unwrap().fail_on_read = fail;
    }
}

#[async_trait]
impl AssetCatalog for InMemoryAssetCatalog {
    async fn price_of(&self, asset: AssetId) -> Result<Money> {
        let state = self.state.read().unwrap();

        if state.fail_on_read {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }

        state
            .prices
            .get(&asset)
            .copied()
            .ok_or(StoreError::AssetNotFound(asset))
    }
}

/// PostgreSQL-backed asset catalog.
#[derive(Clone)]
pub struct PostgresAssetCatalog {
    pool: PgPool,
}

impl PostgresAssetCatalog {
    /// Creates a new PostgreSQL asset catalog.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a catalog row; used by collaborators and tests, not by the
    /// core.
    pub async fn insert(&self, product_name: &str, price: Money) -> Result<AssetId> {
        let asset = AssetId::new();

        sqlx::query(
            r#"
            INSERT INTO assets (id, product_name, price_cents, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            "#,
        )
        .bind(asset.as_uuid())
        .bind(product_name)
        .bind(price.cents())
        .execute(&self.pool)
        .await?;

        Ok(asset)
    }
}

#[async_trait]
impl AssetCatalog for PostgresAssetCatalog {
    async fn price_of(&self, asset: AssetId) -> Result<Money> {
        let row = sqlx::query("SELECT price_cents FROM assets WHERE id = $1")
            .bind(asset.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Money::from_cents(row.try_get("price_cents")?)),
            None => Err(StoreError::AssetNotFound(asset)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_read_price() {
        let catalog = InMemoryAssetCatalog::new();
        let asset = catalog.insert(Money::from_cents(1_000_000));

        let price = catalog.price_of(asset).await.unwrap();
        assert_eq!(price.cents(), 1_000_000);
    }

    #[tokio::test]
    async fn test_unknown_asset_is_not_found() {
        let catalog = InMemoryAssetCatalog::new();

        let result = catalog.price_of(AssetId::new()).await;
        assert!(matches!(result, Err(StoreError::AssetNotFound(_))));
    }

    #[tokio::test]
    async fn test_fail_on_read() {
        let catalog = InMemoryAssetCatalog::new();
        let asset = catalog.insert(Money::from_cents(500));
        catalog.set_fail_on_read(true);

        let result = catalog.price_of(asset).await;
        assert!(matches!(result, Err(StoreError::Database(_))));

        catalog.set_fail_on_read(false);
        assert!(catalog.price_of(asset).await.is_ok());
    }
}
