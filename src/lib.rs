pub mod config;
pub mod database;
pub mod redis_client;
pub mod error;
pub mod models;
pub mod pricing;
pub mod store;
pub mod services;
pub mod controllers;
pub mod middleware;
pub mod cache;

use std::sync::Arc;
use tokio::task;

use services::{BookingWorkflow, SeasonalPricingService, SystemClock};
use store::PgBookingStore;

// Shared state for every request handler
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
    pub redis: redis_client::RedisClient,
    pub cache: cache::CacheService,
    pub config: config::Config,
    pub bookings: BookingWorkflow<PgBookingStore>,
    pub seasons: SeasonalPricingService<PgBookingStore>,
}

impl AppState {
    pub async fn new(config: config::Config) -> anyhow::Result<Arc<Self>> {
        let db = database::Database::new(&config.database.url, config.database.pool_size).await?;
        tracing::info!("Database connected");

        db.run_migrations().await?;

        let redis = redis_client::RedisClient::new(&config.redis.url).await?;
        tracing::info!("Redis connected");

        let store = Arc::new(PgBookingStore::new(db.pool.clone()));
        let cache = cache::CacheService::new(
            redis.clone(),
            store.clone(),
            config.redis.catalog_ttl_seconds,
        );
        let bookings = BookingWorkflow::new(
            store.clone(),
            config.booking.clone(),
            Arc::new(SystemClock),
        );
        let seasons = SeasonalPricingService::new(store);

        let state = Arc::new(Self {
            db,
            redis,
            cache,
            config,
            bookings,
            seasons,
        });

        let state_for_bg = state.clone();
        task::spawn(async move {
            // Warm the catalog cache in the background
            state_for_bg.cache.warmup_cache().await;
        });

        Ok(state)
    }
}
