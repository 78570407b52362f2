use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::info;

use crate::error::{BookingError, BookingResult};
use crate::models::{NewSeasonalPricing, SeasonalPricing};
use crate::pricing;
use crate::store::BookingStore;

/// Staff-side management of seasonal price overrides.
///
/// At most one season may be active on any date of a category, so a new
/// entry that overlaps an existing one is refused.
pub struct SeasonalPricingService<S> {
    store: Arc<S>,
}

impl<S> Clone for SeasonalPricingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: BookingStore> SeasonalPricingService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create(&self, pricing: NewSeasonalPricing) -> BookingResult<SeasonalPricing> {
        if pricing.end_date < pricing.start_date {
            return Err(BookingError::validation("Season end date must not be before its start date."));
        }
        if pricing.price_per_night < Decimal::ZERO {
            return Err(BookingError::validation("Seasonal price cannot be negative."));
        }
        if pricing.price_per_night > pricing::max_nightly_price() {
            return Err(BookingError::validation(format!(
                "Seasonal price cannot exceed {}.",
                pricing::max_nightly_price()
            )));
        }
        if self.store.category(pricing.category_id).await?.is_none() {
            return Err(BookingError::not_found(format!("Category {} not found", pricing.category_id)));
        }

        let category_id = pricing.category_id;
        let (start, end) = (pricing.start_date, pricing.end_date);
        let season = self.store.insert_seasonal_pricing(pricing).await?.ok_or_else(|| {
            BookingError::Conflict(format!(
                "Category {} already has a seasonal price overlapping {}..={}",
                category_id, start, end
            ))
        })?;

        info!(
            "Seasonal price {} for category {}: {}..={} at {}",
            season.id, category_id, season.start_date, season.end_date, season.price_per_night
        );
        Ok(season)
    }

    pub async fn list(&self, category_id: i64) -> BookingResult<Vec<SeasonalPricing>> {
        self.store.seasonal_prices(category_id).await
    }
}
