use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::BookingStore;
use crate::error::{BookingError, BookingResult};
use crate::models::{
    Booking, Category, NewBooking, NewPayment, NewSeasonalPricing, Payment, SeasonalPricing,
};

/// Failures the in-memory store can be told to produce on the next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    /// Booking inserts, alone or together with a reservation.
    BookingInsert,
    /// Room releases, alone or together with a booking delete.
    RoomRelease,
    /// Category listing.
    CategoryList,
}

#[derive(Default)]
struct State {
    next_id: i64,
    categories: BTreeMap<i64, Category>,
    seasons: BTreeMap<i64, SeasonalPricing>,
    bookings: BTreeMap<i64, Booking>,
    payments: BTreeMap<i64, Payment>,
    faults: Vec<StoreFault>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_fault(&mut self, fault: StoreFault) -> BookingResult<()> {
        match self.faults.iter().position(|f| *f == fault) {
            Some(pos) => {
                self.faults.remove(pos);
                Err(BookingError::Database(sqlx::Error::PoolTimedOut))
            }
            None => Ok(()),
        }
    }

    fn reserve(&mut self, category_id: i64) -> bool {
        match self.categories.get_mut(&category_id) {
            Some(category) if category.has_free_room() => {
                category.number_of_rooms -= 1;
                category.updated_at = now();
                true
            }
            _ => false,
        }
    }

    fn release(&mut self, category_id: i64) -> Option<Category> {
        self.categories.get_mut(&category_id).map(|category| {
            category.number_of_rooms += 1;
            category.updated_at = now();
            category.clone()
        })
    }

    fn insert_booking(&mut self, booking: NewBooking) -> Booking {
        let id = self.next_id();
        let row = Booking {
            id,
            customer_id: booking.customer_id,
            category_id: booking.category_id,
            start_date: booking.stay.start_date(),
            end_date: booking.stay.end_date(),
            total_price: Some(booking.total_price),
            created_at: now(),
        };
        self.bookings.insert(id, row.clone());
        row
    }

    fn delete_booking(&mut self, id: i64) -> bool {
        let deleted = self.bookings.remove(&id).is_some();
        if deleted {
            // payments cascade with their booking
            self.payments.retain(|_, p| p.booking_id != id);
        }
        deleted
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Store kept entirely in process memory behind one async mutex. Every
/// operation runs under the lock, which makes reserve atomic.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a category with no amenities and no configured capacity.
    pub async fn add_category(
        &self,
        name: &str,
        price_per_night: Decimal,
        number_of_rooms: i32,
        is_available: bool,
    ) -> Category {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let category = Category {
            id,
            name: name.to_string(),
            description: None,
            price_per_night,
            number_of_rooms,
            is_available,
            capacity: None,
            free_wifi: false,
            hot_water: false,
            swimming_pool: false,
            kitchen: false,
            parking_area: false,
            is_ac: false,
            is_non_ac: false,
            created_at: now(),
            updated_at: now(),
        };
        state.categories.insert(id, category.clone());
        category
    }

    pub async fn set_capacity(&self, category_id: i64, capacity: Option<i32>) {
        if let Some(category) = self.state.lock().await.categories.get_mut(&category_id) {
            category.capacity = capacity;
        }
    }

    /// Makes the next operation of the given kind fail as if the database
    /// went away. The failing call changes nothing.
    pub async fn fail_next(&self, fault: StoreFault) {
        self.state.lock().await.faults.push(fault);
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn category(&self, id: i64) -> BookingResult<Option<Category>> {
        Ok(self.state.lock().await.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> BookingResult<Vec<Category>> {
        let mut state = self.state.lock().await;
        state.check_fault(StoreFault::CategoryList)?;
        let mut categories: Vec<_> = state.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn seasonal_prices(&self, category_id: i64) -> BookingResult<Vec<SeasonalPricing>> {
        let mut seasons: Vec<_> = self
            .state
            .lock()
            .await
            .seasons
            .values()
            .filter(|s| s.category_id == category_id)
            .cloned()
            .collect();
        seasons.sort_by_key(|s| (s.start_date, s.id));
        Ok(seasons)
    }

    async fn try_reserve_room(&self, category_id: i64) -> BookingResult<bool> {
        Ok(self.state.lock().await.reserve(category_id))
    }

    async fn release_room(&self, category_id: i64) -> BookingResult<Option<Category>> {
        let mut state = self.state.lock().await;
        state.check_fault(StoreFault::RoomRelease)?;
        Ok(state.release(category_id))
    }

    async fn insert_booking(&self, booking: NewBooking) -> BookingResult<Booking> {
        let mut state = self.state.lock().await;
        state.check_fault(StoreFault::BookingInsert)?;
        Ok(state.insert_booking(booking))
    }

    async fn booking(&self, id: i64) -> BookingResult<Option<Booking>> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn bookings_for_customer(&self, customer_id: i64) -> BookingResult<Vec<Booking>> {
        let mut rows: Vec<_> = self
            .state
            .lock()
            .await
            .bookings
            .values()
            .filter(|b| b.customer_id == customer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn delete_booking(&self, id: i64) -> BookingResult<bool> {
        Ok(self.state.lock().await.delete_booking(id))
    }

    async fn reserve_and_insert_booking(&self, booking: NewBooking) -> BookingResult<Option<Booking>> {
        let mut state = self.state.lock().await;
        let has_room = state
            .categories
            .get(&booking.category_id)
            .is_some_and(Category::has_free_room);
        if !has_room {
            return Ok(None);
        }
        state.check_fault(StoreFault::BookingInsert)?;

        state.reserve(booking.category_id);
        Ok(Some(state.insert_booking(booking)))
    }

    async fn delete_booking_and_release(&self, id: i64) -> BookingResult<Option<Category>> {
        let mut state = self.state.lock().await;
        let Some(category_id) = state.bookings.get(&id).map(|b| b.category_id) else {
            return Ok(None);
        };
        state.check_fault(StoreFault::RoomRelease)?;

        let category = state
            .release(category_id)
            .ok_or_else(|| BookingError::not_found(format!("Category {} not found", category_id)))?;
        state.delete_booking(id);
        Ok(Some(category))
    }

    async fn insert_seasonal_pricing(
        &self,
        pricing: NewSeasonalPricing,
    ) -> BookingResult<Option<SeasonalPricing>> {
        let mut state = self.state.lock().await;
        let overlaps = state.seasons.values().any(|s| {
            s.category_id == pricing.category_id && s.overlaps(pricing.start_date, pricing.end_date)
        });
        if overlaps {
            return Ok(None);
        }
        let id = state.next_id();
        let season = SeasonalPricing {
            id,
            category_id: pricing.category_id,
            start_date: pricing.start_date,
            end_date: pricing.end_date,
            price_per_night: pricing.price_per_night,
        };
        state.seasons.insert(id, season.clone());
        Ok(Some(season))
    }

    async fn record_payment(&self, payment: NewPayment) -> BookingResult<Payment> {
        let mut state = self.state.lock().await;
        if state
            .payments
            .values()
            .any(|p| p.transaction_id == payment.transaction_id)
        {
            return Err(BookingError::Conflict(format!(
                "transaction {} already recorded",
                payment.transaction_id
            )));
        }
        let id = state.next_id();
        let row = Payment {
            id,
            booking_id: payment.booking_id,
            amount: payment.amount,
            payment_date: now(),
            status: payment.status,
            transaction_id: payment.transaction_id,
        };
        state.payments.insert(id, row.clone());
        Ok(row)
    }

    async fn payments_for_booking(&self, booking_id: i64) -> BookingResult<Vec<Payment>> {
        Ok(self
            .state
            .lock()
            .await
            .payments
            .values()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 3, day).unwrap()
    }

    fn season(category_id: i64, start: u32, end: u32) -> NewSeasonalPricing {
        NewSeasonalPricing {
            category_id,
            start_date: d(start),
            end_date: d(end),
            price_per_night: Decimal::new(150, 0),
        }
    }

    #[tokio::test]
    async fn reserve_stops_at_zero() {
        let store = InMemoryStore::new();
        let cat = store.add_category("Suite", Decimal::new(100, 0), 1, true).await;

        assert!(store.try_reserve_room(cat.id).await.unwrap());
        assert!(!store.try_reserve_room(cat.id).await.unwrap());
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 0);
    }

    #[tokio::test]
    async fn reserve_refuses_unavailable_category() {
        let store = InMemoryStore::new();
        let cat = store.add_category("Closed", Decimal::new(100, 0), 3, false).await;

        assert!(!store.try_reserve_room(cat.id).await.unwrap());
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 3);
    }

    #[tokio::test]
    async fn concurrent_reserves_never_oversell() {
        let store = std::sync::Arc::new(InMemoryStore::new());
        let cat_id = store.add_category("Dorm", Decimal::new(40, 0), 5, true).await.id;

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.try_reserve_room(cat_id).await.unwrap() })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 5);
        assert_eq!(store.category(cat_id).await.unwrap().unwrap().number_of_rooms, 0);
    }

    #[tokio::test]
    async fn seasons_come_back_sorted_and_overlaps_are_refused() {
        let store = InMemoryStore::new();
        let cat = store.add_category("Deluxe", Decimal::new(100, 0), 1, true).await;

        store.insert_seasonal_pricing(season(cat.id, 20, 25)).await.unwrap().unwrap();
        store.insert_seasonal_pricing(season(cat.id, 1, 5)).await.unwrap().unwrap();
        assert!(store.insert_seasonal_pricing(season(cat.id, 5, 8)).await.unwrap().is_none());

        let seasons = store.seasonal_prices(cat.id).await.unwrap();
        let starts: Vec<_> = seasons.iter().map(|s| s.start_date).collect();
        assert_eq!(starts, vec![d(1), d(20)]);
    }

    #[tokio::test]
    async fn failed_insert_is_one_shot() {
        let store = InMemoryStore::new();
        let cat = store.add_category("Twin", Decimal::new(80, 0), 2, true).await;
        let stay = crate::models::StayRange::new(d(1), d(2)).unwrap();

        store.fail_next(StoreFault::BookingInsert).await;
        let first = store
            .insert_booking(NewBooking::new(1, cat.id, stay, Decimal::new(80, 0)))
            .await;
        assert!(matches!(first, Err(BookingError::Database(_))));

        let second = store
            .insert_booking(NewBooking::new(1, cat.id, stay, Decimal::new(80, 0)))
            .await
            .unwrap();
        assert_eq!(second.total_price, Some(Decimal::new(80, 0)));
    }

    #[tokio::test]
    async fn failed_insert_keeps_the_room() {
        let store = InMemoryStore::new();
        let cat = store.add_category("Twin", Decimal::new(80, 0), 1, true).await;
        let stay = crate::models::StayRange::new(d(1), d(2)).unwrap();

        store.fail_next(StoreFault::BookingInsert).await;
        let result = store
            .reserve_and_insert_booking(NewBooking::new(1, cat.id, stay, Decimal::new(80, 0)))
            .await;
        assert!(matches!(result, Err(BookingError::Database(_))));
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 1);
        assert!(store.bookings_for_customer(1).await.unwrap().is_empty());

        let booked = store
            .reserve_and_insert_booking(NewBooking::new(1, cat.id, stay, Decimal::new(80, 0)))
            .await
            .unwrap();
        assert!(booked.is_some());
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 0);
    }

    #[tokio::test]
    async fn reserve_and_insert_writes_nothing_without_a_room() {
        let store = InMemoryStore::new();
        let cat = store.add_category("Full", Decimal::new(80, 0), 0, true).await;
        let stay = crate::models::StayRange::new(d(1), d(2)).unwrap();

        let booked = store
            .reserve_and_insert_booking(NewBooking::new(1, cat.id, stay, Decimal::new(80, 0)))
            .await
            .unwrap();
        assert!(booked.is_none());
        assert!(store.bookings_for_customer(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_release_keeps_the_booking() {
        let store = InMemoryStore::new();
        let cat = store.add_category("Twin", Decimal::new(80, 0), 1, true).await;
        let stay = crate::models::StayRange::new(d(1), d(2)).unwrap();
        let booking = store
            .reserve_and_insert_booking(NewBooking::new(1, cat.id, stay, Decimal::new(80, 0)))
            .await
            .unwrap()
            .unwrap();

        store.fail_next(StoreFault::RoomRelease).await;
        let result = store.delete_booking_and_release(booking.id).await;
        assert!(matches!(result, Err(BookingError::Database(_))));
        assert!(store.booking(booking.id).await.unwrap().is_some());
        assert_eq!(store.category(cat.id).await.unwrap().unwrap().number_of_rooms, 0);

        let category = store.delete_booking_and_release(booking.id).await.unwrap().unwrap();
        assert_eq!(category.number_of_rooms, 1);
        assert!(store.booking(booking.id).await.unwrap().is_none());
        assert!(store.delete_booking_and_release(booking.id).await.unwrap().is_none());
    }
}
