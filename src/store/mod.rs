//! Record store used by the pricing and booking engine.
//!
//! Two implementations live here: [`PgBookingStore`] backs the running
//! service, [`InMemoryStore`] backs tests and local experiments. Both must
//! make `try_reserve_room` a single atomic check-and-decrement, and must run
//! `reserve_and_insert_booking` and `delete_booking_and_release` as one
//! transaction each.

mod memory;
mod postgres;

pub use memory::{InMemoryStore, StoreFault};
pub use postgres::PgBookingStore;

use async_trait::async_trait;

use crate::error::BookingResult;
use crate::models::{
    Booking, Category, NewBooking, NewPayment, NewSeasonalPricing, Payment, SeasonalPricing,
};

#[async_trait]
pub trait BookingStore: Send + Sync + 'static {
    async fn category(&self, id: i64) -> BookingResult<Option<Category>>;

    async fn list_categories(&self) -> BookingResult<Vec<Category>>;

    /// Seasonal entries of one category ordered by `(start_date, id)`.
    async fn seasonal_prices(&self, category_id: i64) -> BookingResult<Vec<SeasonalPricing>>;

    /// Takes one room if the category is available and has a room left.
    /// Returns `false` and changes nothing otherwise.
    async fn try_reserve_room(&self, category_id: i64) -> BookingResult<bool>;

    /// Gives one room back, without any upper bound. `None` if the category is gone.
    async fn release_room(&self, category_id: i64) -> BookingResult<Option<Category>>;

    async fn insert_booking(&self, booking: NewBooking) -> BookingResult<Booking>;

    async fn booking(&self, id: i64) -> BookingResult<Option<Booking>>;

    async fn bookings_for_customer(&self, customer_id: i64) -> BookingResult<Vec<Booking>>;

    /// Returns `false` when there was nothing to delete.
    async fn delete_booking(&self, id: i64) -> BookingResult<bool>;

    /// Takes one room of the booking's category and inserts the booking, both
    /// or neither. `None` when no room was free.
    async fn reserve_and_insert_booking(&self, booking: NewBooking) -> BookingResult<Option<Booking>>;

    /// Deletes the booking and gives its room back, both or neither. `None`
    /// when the booking does not exist. Returns the category after release.
    async fn delete_booking_and_release(&self, id: i64) -> BookingResult<Option<Category>>;

    /// Inserts the entry unless it overlaps an existing entry of the same
    /// category, in which case `None` is returned.
    async fn insert_seasonal_pricing(
        &self,
        pricing: NewSeasonalPricing,
    ) -> BookingResult<Option<SeasonalPricing>>;

    async fn record_payment(&self, payment: NewPayment) -> BookingResult<Payment>;

    async fn payments_for_booking(&self, booking_id: i64) -> BookingResult<Vec<Payment>>;
}
