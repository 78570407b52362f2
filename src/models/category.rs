use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Base nightly price, used whenever no seasonal entry covers the night.
    pub price_per_night: Decimal,
    pub number_of_rooms: i32,
    pub is_available: bool,
    /// Configured maximum room count. Only used to flag over-release.
    pub capacity: Option<i32>,
    pub free_wifi: bool,
    pub hot_water: bool,
    pub swimming_pool: bool,
    pub kitchen: bool,
    pub parking_area: bool,
    pub is_ac: bool,
    pub is_non_ac: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Category {
    /// Whether a room can be reserved right now.
    pub fn has_free_room(&self) -> bool {
        self.is_available && self.number_of_rooms > 0
    }

    /// True when the room count went above the configured capacity.
    pub fn is_over_capacity(&self) -> bool {
        matches!(self.capacity, Some(cap) if self.number_of_rooms > cap)
    }
}
