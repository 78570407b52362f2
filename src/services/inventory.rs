use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{BookingError, BookingResult};
use crate::models::{Booking, Category, NewBooking};
use crate::store::BookingStore;

/// Room inventory of each category: `number_of_rooms` and `is_available`.
pub struct InventoryLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for InventoryLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: BookingStore> InventoryLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Claims one room. `false` means nothing was claimed and nothing changed.
    pub async fn try_reserve(&self, category_id: i64) -> BookingResult<bool> {
        let reserved = self.store.try_reserve_room(category_id).await?;
        debug!("try_reserve category={} reserved={}", category_id, reserved);
        Ok(reserved)
    }

    /// Returns one room to the category. There is no upper bound: the count
    /// is incremented even past the configured capacity, which is only logged.
    pub async fn release(&self, category_id: i64) -> BookingResult<Category> {
        let category = self
            .store
            .release_room(category_id)
            .await?
            .ok_or_else(|| BookingError::not_found(format!("Category {} not found", category_id)))?;
        log_release(&category);
        Ok(category)
    }

    /// Claims a room for `booking` and records it in the same store
    /// transaction. `None` means no room was free and nothing was written.
    pub async fn reserve_for(&self, booking: NewBooking) -> BookingResult<Option<Booking>> {
        let category_id = booking.category_id;
        let booked = self.store.reserve_and_insert_booking(booking).await?;
        debug!("reserve_for category={} reserved={}", category_id, booked.is_some());
        Ok(booked)
    }

    /// Deletes a booking and returns its room in the same store transaction.
    /// `None` means the booking did not exist and nothing changed.
    pub async fn release_for(&self, booking_id: i64) -> BookingResult<Option<Category>> {
        let category = self.store.delete_booking_and_release(booking_id).await?;
        if let Some(category) = &category {
            log_release(category);
        }
        Ok(category)
    }
}

fn log_release(category: &Category) {
    match category.capacity {
        Some(capacity) if category.is_over_capacity() => warn!(
            "Category {} has {} rooms after release, above its capacity of {}",
            category.id, category.number_of_rooms, capacity
        ),
        _ => debug!("released room for category {}, now {}", category.id, category.number_of_rooms),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn reserve_with_no_rooms_is_refused() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Attic", Decimal::new(60, 0), 0, true).await;
        let ledger = InventoryLedger::new(store.clone());

        assert!(!ledger.try_reserve(cat.id).await.unwrap());
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 0);
    }

    #[tokio::test]
    async fn reserve_then_release_restores_count() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Garden", Decimal::new(90, 0), 4, true).await;
        let ledger = InventoryLedger::new(store.clone());

        assert!(ledger.try_reserve(cat.id).await.unwrap());
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 3);
        let after = ledger.release(cat.id).await.unwrap();
        assert_eq!(after.number_of_rooms, 4);
    }

    #[tokio::test]
    async fn release_is_not_capped_by_capacity() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Loft", Decimal::new(70, 0), 2, true).await;
        store.set_capacity(cat.id, Some(2)).await;
        let ledger = InventoryLedger::new(store.clone());

        let after = ledger.release(cat.id).await.unwrap();
        assert_eq!(after.number_of_rooms, 3);
        assert!(after.is_over_capacity());
    }

    #[tokio::test]
    async fn release_for_frees_the_room_of_a_booking() {
        let store = Arc::new(InMemoryStore::new());
        let cat = store.add_category("Dorm", Decimal::new(30, 0), 1, true).await;
        let ledger = InventoryLedger::new(store.clone());
        let stay = crate::models::StayRange::new(
            chrono::NaiveDate::from_ymd_opt(2030, 5, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2030, 5, 2).unwrap(),
        )
        .unwrap();

        let booking = ledger
            .reserve_for(NewBooking::new(3, cat.id, stay, Decimal::new(30, 0)))
            .await
            .unwrap()
            .unwrap();
        assert!(ledger
            .reserve_for(NewBooking::new(4, cat.id, stay, Decimal::new(30, 0)))
            .await
            .unwrap()
            .is_none());

        let after = ledger.release_for(booking.id).await.unwrap().unwrap();
        assert_eq!(after.number_of_rooms, 1);
        assert!(ledger.release_for(booking.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn release_of_unknown_category_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let ledger = InventoryLedger::new(store);

        assert!(matches!(ledger.release(404).await, Err(BookingError::NotFound(_))));
    }
}
