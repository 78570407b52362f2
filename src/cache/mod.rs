use std::sync::Arc;

use crate::{redis_client::RedisClient, store::PgBookingStore};
use tracing::{error, info};

pub mod catalog;

pub use catalog::{load_catalog, CatalogEntry};

#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
    store: Arc<PgBookingStore>,
    catalog_ttl_seconds: u64,
}

impl CacheService {
    pub fn new(redis: RedisClient, store: Arc<PgBookingStore>, catalog_ttl_seconds: u64) -> Self {
        Self {
            redis,
            store,
            catalog_ttl_seconds,
        }
    }

    // Fill the catalog cache on startup
    pub async fn warmup_cache(&self) {
        info!("Starting cache warmup...");
        match self.get_catalog().await {
            Ok(catalog) => info!("Cache warmup done, {} categories", catalog.len()),
            Err(e) => error!("Cache warmup failed: {}", e),
        }
    }
}
