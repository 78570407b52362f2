use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::CacheService;
use crate::error::BookingResult;
use crate::models::{Category, SeasonalPricing};
use crate::store::BookingStore;

const CATALOG_KEY: &str = "catalog:categories";

/// A category as shown on the public site, with its seasonal prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub category: Category,
    pub seasonal_prices: Vec<SeasonalPricing>,
}

impl CacheService {
    // Catalog: cache first, database on miss or cache failure. A database
    // failure is returned, never an empty catalog.
    pub async fn get_catalog(&self) -> BookingResult<Vec<CatalogEntry>> {
        if let Ok(catalog) = self.get_catalog_from_cache().await {
            return Ok(catalog);
        }

        let catalog = load_catalog(self.store.as_ref()).await?;
        if let Err(e) = self.save_catalog_to_cache(&catalog).await {
            warn!("Failed to cache catalog: {:?}", e);
        }
        Ok(catalog)
    }

    // Room counts and seasonal prices are part of the catalog
    pub async fn invalidate_catalog(&self) {
        let mut conn = self.redis.conn.clone();
        let _: Result<(), _> = conn.del(CATALOG_KEY).await;
        info!("Invalidated catalog cache");
    }

    async fn get_catalog_from_cache(&self) -> Result<Vec<CatalogEntry>, redis::RedisError> {
        let mut conn = self.redis.conn.clone();
        let data: String = conn.get(CATALOG_KEY).await?;
        serde_json::from_str(&data)
            .map_err(|_| redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error")))
    }

    async fn save_catalog_to_cache(&self, catalog: &[CatalogEntry]) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(catalog).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.redis.conn.clone();
        conn.set_ex(CATALOG_KEY, data, self.catalog_ttl_seconds).await
    }
}

/// Every category with its seasonal prices, read straight from the store.
pub async fn load_catalog<S: BookingStore>(store: &S) -> BookingResult<Vec<CatalogEntry>> {
    let categories = store.list_categories().await?;
    let mut catalog = Vec::with_capacity(categories.len());
    for category in categories {
        let seasonal_prices = store.seasonal_prices(category.id).await?;
        catalog.push(CatalogEntry {
            category,
            seasonal_prices,
        });
    }
    Ok(catalog)
}
