//! Nightly price resolution and stay totals.
//!
//! A night costs the price of the first seasonal entry that covers it, or the
//! category's base price when none does. "First" is the order the entries are
//! handed in; the stores return them sorted by `(start_date, id)`. Overlapping
//! entries are rejected when they are created, but older data may still
//! contain them, and then the earliest-starting entry wins.
//!
//! Everything here is pure: no store access, no mutation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::{Category, SeasonalPricing, StayRange};

/// Largest nightly price a category or season can store, `NUMERIC(8, 2)`.
pub fn max_nightly_price() -> Decimal {
    Decimal::new(99_999_999, 2)
}

/// Largest total a booking row can store, `NUMERIC(10, 2)`.
pub fn max_booking_total() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Resolves the effective nightly price of one category.
#[derive(Debug, Clone, Copy)]
pub struct SeasonalPriceResolver<'a> {
    base_price: Decimal,
    seasons: &'a [SeasonalPricing],
}

impl<'a> SeasonalPriceResolver<'a> {
    pub fn new(base_price: Decimal, seasons: &'a [SeasonalPricing]) -> Self {
        Self { base_price, seasons }
    }

    pub fn for_category(category: &Category, seasons: &'a [SeasonalPricing]) -> Self {
        Self::new(category.price_per_night, seasons)
    }

    /// The season in effect on `date`, if any.
    pub fn season_for(&self, date: NaiveDate) -> Option<&'a SeasonalPricing> {
        self.seasons.iter().find(|season| season.covers(date))
    }

    pub fn resolve(&self, date: NaiveDate) -> Decimal {
        self.season_for(date)
            .map(|season| season.price_per_night)
            .unwrap_or(self.base_price)
    }
}

/// One charged night of a quote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NightlyRate {
    pub date: NaiveDate,
    pub price: Decimal,
    pub seasonal_pricing_id: Option<i64>,
}

/// Sum of the nightly prices over `[start_date, end_date)`.
pub fn total(base_price: Decimal, seasons: &[SeasonalPricing], stay: &StayRange) -> Decimal {
    let resolver = SeasonalPriceResolver::new(base_price, seasons);
    stay.dates().map(|date| resolver.resolve(date)).sum()
}

pub fn nightly_breakdown(
    base_price: Decimal,
    seasons: &[SeasonalPricing],
    stay: &StayRange,
) -> Vec<NightlyRate> {
    let resolver = SeasonalPriceResolver::new(base_price, seasons);
    stay.dates()
        .map(|date| {
            let season = resolver.season_for(date);
            NightlyRate {
                date,
                price: season.map(|s| s.price_per_night).unwrap_or(base_price),
                seasonal_pricing_id: season.map(|s| s.id),
            }
        })
        .collect()
}
