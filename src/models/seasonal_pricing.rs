use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Date-range override of a category's nightly price. Both ends are inclusive.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SeasonalPricing {
    pub id: i64,
    pub category_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_per_night: Decimal,
}

impl SeasonalPricing {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Inclusive ranges overlap when neither ends before the other starts.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && start <= self.end_date
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSeasonalPricing {
    pub category_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_per_night: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 7, day).unwrap()
    }

    fn season(start: u32, end: u32) -> SeasonalPricing {
        SeasonalPricing {
            id: 1,
            category_id: 1,
            start_date: d(start),
            end_date: d(end),
            price_per_night: Decimal::new(150, 0),
        }
    }

    #[test]
    fn covers_is_inclusive_on_both_ends() {
        let s = season(10, 12);
        assert!(s.covers(d(10)));
        assert!(s.covers(d(12)));
        assert!(!s.covers(d(9)));
        assert!(!s.covers(d(13)));
    }

    #[test]
    fn overlap_detects_shared_boundary_day() {
        let s = season(10, 12);
        assert!(s.overlaps(d(12), d(15)));
        assert!(s.overlaps(d(1), d(10)));
        assert!(s.overlaps(d(11), d(11)));
        assert!(!s.overlaps(d(13), d(20)));
        assert!(!s.overlaps(d(1), d(9)));
    }
}
