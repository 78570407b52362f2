//! Booking creation and deletion.
//!
//! A creation attempt runs Validate, Price, Reserve and Persist in that order
//! and never skips a step. A rejected attempt leaves no trace: validation
//! happens before any store access, and the reservation and the insert commit
//! together or not at all. Deletion removes the record and returns its room in
//! one store transaction as well.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::BookingConfig;
use crate::error::{BookingError, BookingResult};
use crate::models::{Booking, NewBooking, NewPayment, Payment, SeasonalPricing, StayRange};
use crate::pricing::{self, NightlyRate};
use crate::services::clock::Clock;
use crate::services::inventory::InventoryLedger;
use crate::store::BookingStore;

/// Price of a stay before it is booked.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub category_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub nights: u32,
    pub total_price: Decimal,
    pub nightly: Vec<NightlyRate>,
}

pub struct BookingWorkflow<S> {
    store: Arc<S>,
    ledger: InventoryLedger<S>,
    clock: Arc<dyn Clock>,
    config: BookingConfig,
}

impl<S> Clone for BookingWorkflow<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            ledger: self.ledger.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
    }
}

impl<S: BookingStore> BookingWorkflow<S> {
    pub fn new(store: Arc<S>, config: BookingConfig, clock: Arc<dyn Clock>) -> Self {
        let ledger = InventoryLedger::new(store.clone());
        Self {
            store,
            ledger,
            clock,
            config,
        }
    }

    fn stay(&self, start_date: NaiveDate, end_date: NaiveDate) -> BookingResult<StayRange> {
        let stay = StayRange::new(start_date, end_date)
            .ok_or_else(|| BookingError::validation("End date must be after the start date."))?;
        if stay.nights() > self.config.max_nights {
            return Err(BookingError::validation(format!(
                "A stay cannot be longer than {} nights.",
                self.config.max_nights
            )));
        }
        Ok(stay)
    }

    fn validate_new_stay(&self, start_date: NaiveDate, end_date: NaiveDate) -> BookingResult<StayRange> {
        let today = self.clock.today();
        if start_date < today {
            return Err(BookingError::validation("Start date cannot be in the past."));
        }
        if start_date == today && !self.config.allow_same_day {
            return Err(BookingError::validation("Same-day bookings are not accepted."));
        }
        self.stay(start_date, end_date)
    }

    /// Base price and seasonal entries of a category, in resolution order.
    async fn pricing_of(&self, category_id: i64) -> BookingResult<(Decimal, Vec<SeasonalPricing>)> {
        let category = self
            .store
            .category(category_id)
            .await?
            .ok_or_else(|| BookingError::not_found(format!("Category {} not found", category_id)))?;
        let seasons = self.store.seasonal_prices(category_id).await?;
        Ok((category.price_per_night, seasons))
    }

    /// Read-only price of a stay for display before confirmation.
    pub async fn quote_price(
        &self,
        category_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> BookingResult<Quote> {
        let stay = self.stay(start_date, end_date)?;
        let (base_price, seasons) = self.pricing_of(category_id).await?;

        Ok(Quote {
            category_id,
            start_date,
            end_date,
            nights: stay.nights(),
            total_price: pricing::total(base_price, &seasons, &stay),
            nightly: pricing::nightly_breakdown(base_price, &seasons, &stay),
        })
    }

    pub async fn create_booking(
        &self,
        customer_id: i64,
        category_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> BookingResult<Booking> {
        let stay = self.validate_new_stay(start_date, end_date)?;

        let (base_price, seasons) = self.pricing_of(category_id).await?;
        let total_price = pricing::total(base_price, &seasons, &stay);
        if total_price > pricing::max_booking_total() {
            return Err(BookingError::validation(format!(
                "A total of {} is above the largest bookable amount of {}.",
                total_price,
                pricing::max_booking_total()
            )));
        }

        let draft = NewBooking::new(customer_id, category_id, stay, total_price);
        let booking = match self.ledger.reserve_for(draft).await {
            Ok(Some(booking)) => booking,
            Ok(None) => {
                warn!("No rooms left in category {} for customer {}", category_id, customer_id);
                return Err(BookingError::Unavailable(
                    "No rooms available for the selected category.".to_string(),
                ));
            }
            Err(e) => {
                error!("Failed to persist booking for category {}: {}", category_id, e);
                return Err(e);
            }
        };

        info!(
            "Booking {} created: customer={} category={} {}..{} total={}",
            booking.id, customer_id, category_id, start_date, end_date, total_price
        );
        Ok(booking)
    }

    /// Removes a booking owned by `requesting_customer_id` and frees its room.
    pub async fn delete_booking(&self, booking_id: i64, requesting_customer_id: i64) -> BookingResult<Booking> {
        let booking = self.owned_booking(booking_id, requesting_customer_id).await?;

        let category = self
            .ledger
            .release_for(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found(format!("Booking {} not found", booking_id)))?;
        info!(
            "Booking {} deleted by customer {}, category {} now has {} rooms",
            booking_id, requesting_customer_id, category.id, category.number_of_rooms
        );
        Ok(booking)
    }

    pub async fn bookings_for_customer(&self, customer_id: i64) -> BookingResult<Vec<Booking>> {
        self.store.bookings_for_customer(customer_id).await
    }

    /// Records a pending payment for the booking's frozen total.
    pub async fn record_payment(&self, booking_id: i64, requesting_customer_id: i64) -> BookingResult<Payment> {
        let booking = self.owned_booking(booking_id, requesting_customer_id).await?;
        let amount = booking.total_price.ok_or_else(|| {
            BookingError::validation(format!("Booking {} has no recorded total price", booking_id))
        })?;

        let payment = self.store.record_payment(NewPayment::pending(booking_id, amount)).await?;
        info!("Payment {} recorded for booking {}", payment.transaction_id, booking_id);
        Ok(payment)
    }

    pub async fn payments(&self, booking_id: i64, requesting_customer_id: i64) -> BookingResult<Vec<Payment>> {
        self.owned_booking(booking_id, requesting_customer_id).await?;
        self.store.payments_for_booking(booking_id).await
    }

    async fn owned_booking(&self, booking_id: i64, customer_id: i64) -> BookingResult<Booking> {
        let booking = self
            .store
            .booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::not_found(format!("Booking {} not found", booking_id)))?;

        if booking.customer_id != customer_id {
            warn!("Customer {} tried to access booking {} of another customer", customer_id, booking_id);
            return Err(BookingError::Forbidden(
                "This booking does not belong to you.".to_string(),
            ));
        }
        Ok(booking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::clock::FixedClock;
    use crate::store::{InMemoryStore, StoreFault};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, day).unwrap()
    }

    fn workflow(store: Arc<InMemoryStore>, config: BookingConfig) -> BookingWorkflow<InMemoryStore> {
        BookingWorkflow::new(store, config, Arc::new(FixedClock(d(10))))
    }

    #[tokio::test]
    async fn rejects_start_in_the_past() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Room", Decimal::new(100, 0), 1, true).await;
        let wf = workflow(store, BookingConfig::default());

        let err = wf.create_booking(1, cat.id, d(9), d(12)).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn same_day_respects_config() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Room", Decimal::new(100, 0), 2, true).await;

        let strict = workflow(
            store.clone(),
            BookingConfig {
                allow_same_day: false,
                ..BookingConfig::default()
            },
        );
        assert!(matches!(
            strict.create_booking(1, cat.id, d(10), d(11)).await,
            Err(BookingError::Validation(_))
        ));

        let relaxed = workflow(store, BookingConfig::default());
        assert!(relaxed.create_booking(1, cat.id, d(10), d(11)).await.is_ok());
    }

    #[tokio::test]
    async fn stays_longer_than_limit_are_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Room", Decimal::new(100, 0), 1, true).await;
        let wf = workflow(
            store,
            BookingConfig {
                max_nights: 3,
                ..BookingConfig::default()
            },
        );

        assert!(matches!(
            wf.create_booking(1, cat.id, d(11), d(15)).await,
            Err(BookingError::Validation(_))
        ));
        assert!(wf.create_booking(1, cat.id, d(11), d(14)).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_category_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let wf = workflow(store, BookingConfig::default());

        assert!(matches!(
            wf.create_booking(1, 77, d(11), d(12)).await,
            Err(BookingError::NotFound(_))
        ));
        assert!(matches!(
            wf.quote_price(77, d(11), d(12)).await,
            Err(BookingError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn quote_does_not_touch_inventory() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Room", Decimal::new(100, 0), 1, true).await;
        let wf = workflow(store.clone(), BookingConfig::default());

        let quote = wf.quote_price(cat.id, d(11), d(14)).await.unwrap();
        assert_eq!(quote.nights, 3);
        assert_eq!(quote.total_price, Decimal::new(300, 0));
        assert_eq!(quote.nightly.len(), 3);
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 1);
    }

    #[tokio::test]
    async fn failed_insert_returns_the_room() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Room", Decimal::new(100, 0), 1, true).await;
        let wf = workflow(store.clone(), BookingConfig::default());

        store.fail_next(StoreFault::BookingInsert).await;
        let err = wf.create_booking(1, cat.id, d(11), d(12)).await.unwrap_err();
        assert!(matches!(err, BookingError::Database(_)));
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 1);
        assert!(store.bookings_for_customer(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_release_keeps_booking_and_room_count() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Room", Decimal::new(100, 0), 1, true).await;
        let wf = workflow(store.clone(), BookingConfig::default());
        let booking = wf.create_booking(1, cat.id, d(11), d(12)).await.unwrap();

        store.fail_next(StoreFault::RoomRelease).await;
        let err = wf.delete_booking(booking.id, 1).await.unwrap_err();
        assert!(matches!(err, BookingError::Database(_)));
        assert!(store.booking(booking.id).await.unwrap().is_some());
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 0);

        // retrying after the outage frees the room exactly once
        wf.delete_booking(booking.id, 1).await.unwrap();
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 1);
    }

    #[tokio::test]
    async fn total_above_column_limit_is_rejected_before_reserving() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store
            .add_category("Palace", pricing::max_nightly_price(), 1, true)
            .await;
        let wf = workflow(store.clone(), BookingConfig::default());

        // 101 nights at 999,999.99 is just over 99,999,999.99
        let long_end = d(11).checked_add_days(chrono::Days::new(101)).unwrap();
        let err = wf.create_booking(1, cat.id, d(11), long_end).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 1);

        let short_end = d(11).checked_add_days(chrono::Days::new(100)).unwrap();
        let booking = wf.create_booking(1, cat.id, d(11), short_end).await.unwrap();
        assert_eq!(booking.total_price, Some(Decimal::new(9_999_999_900, 2)));
    }

    #[tokio::test]
    async fn payment_uses_frozen_total_and_owner_only() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Room", Decimal::new(120, 0), 1, true).await;
        let wf = workflow(store, BookingConfig::default());
        let booking = wf.create_booking(5, cat.id, d(11), d(13)).await.unwrap();

        let payment = wf.record_payment(booking.id, 5).await.unwrap();
        assert_eq!(payment.amount, Decimal::new(240, 0));
        assert_eq!(payment.status, crate::models::PaymentStatus::Pending);

        assert!(matches!(
            wf.record_payment(booking.id, 6).await,
            Err(BookingError::Forbidden(_))
        ));
        assert_eq!(wf.payments(booking.id, 5).await.unwrap().len(), 1);
    }
}
