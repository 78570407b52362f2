use chrono::{Days, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{Category, SeasonalPricing};
use crate::pricing;

/// Half-open stay `[start_date, end_date)`. The checkout day is not a night.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl StayRange {
    /// Returns `None` unless `end_date > start_date`.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Option<Self> {
        (end_date > start_date).then_some(Self { start_date, end_date })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn nights(&self) -> u32 {
        (self.end_date - self.start_date).num_days() as u32
    }

    /// Every charged night, checkout day excluded.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..u64::from(self.nights())).filter_map(move |offset| {
            self.start_date.checked_add_days(Days::new(offset))
        })
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub customer_id: i64,
    pub category_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Frozen at creation. Only rows written before totals were mandatory are NULL.
    pub total_price: Option<Decimal>,
    pub created_at: NaiveDateTime,
}

impl Booking {
    pub fn stay(&self) -> Option<StayRange> {
        StayRange::new(self.start_date, self.end_date)
    }

    /// Prices the stay against the category's current pricing. Never used to
    /// fill in `total_price`; callers that want it must ask for it.
    pub fn computed_total(&self, category: &Category, seasons: &[SeasonalPricing]) -> Option<Decimal> {
        self.stay()
            .map(|stay| pricing::total(category.price_per_night, seasons, &stay))
    }
}

/// A validated and priced booking, ready to be reserved and written in one
/// step. The total is a required argument.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub customer_id: i64,
    pub category_id: i64,
    pub stay: StayRange,
    pub total_price: Decimal,
}

impl NewBooking {
    pub fn new(customer_id: i64, category_id: i64, stay: StayRange, total_price: Decimal) -> Self {
        Self {
            customer_id,
            category_id,
            stay,
            total_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 1, day).unwrap()
    }

    #[test]
    fn total_is_serialized_as_exact_string() {
        let booking = Booking {
            id: 7,
            customer_id: 1,
            category_id: 2,
            start_date: d(1),
            end_date: d(3),
            total_price: Some(Decimal::new(25000, 2)),
            created_at: d(1).and_hms_opt(9, 0, 0).unwrap(),
        };
        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["total_price"], "250.00");
    }

    #[test]
    fn stay_requires_end_after_start() {
        assert!(StayRange::new(d(3), d(3)).is_none());
        assert!(StayRange::new(d(4), d(3)).is_none());
        assert!(StayRange::new(d(3), d(4)).is_some());
    }

    #[test]
    fn dates_exclude_checkout_day() {
        let stay = StayRange::new(d(1), d(4)).unwrap();
        let dates: Vec<_> = stay.dates().collect();
        assert_eq!(stay.nights(), 3);
        assert_eq!(dates, vec![d(1), d(2), d(3)]);
    }

    #[test]
    fn dates_cross_month_boundary() {
        let stay = StayRange::new(
            NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
            NaiveDate::from_ymd_opt(2030, 2, 2).unwrap(),
        )
        .unwrap();
        let dates: Vec<_> = stay.dates().collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
                NaiveDate::from_ymd_opt(2030, 2, 1).unwrap(),
            ]
        );
    }
}
