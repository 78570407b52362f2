use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};

use super::BookingStore;
use crate::error::{BookingError, BookingResult};
use crate::models::{
    Booking, Category, NewBooking, NewPayment, NewSeasonalPricing, Payment, SeasonalPricing,
};

const CATEGORY_COLUMNS: &str = "id, name, description, price_per_night, number_of_rooms, is_available, \
     capacity, free_wifi, hot_water, swimming_pool, kitchen, parking_area, is_ac, is_non_ac, \
     created_at, updated_at";

const BOOKING_COLUMNS: &str =
    "id, customer_id, category_id, start_date, end_date, total_price, created_at";

// Guard and decrement in one statement so concurrent bookings for the last
// room cannot both pass the check.
async fn reserve_room<'e>(executor: impl PgExecutor<'e>, category_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE categories
         SET number_of_rooms = number_of_rooms - 1, updated_at = NOW()
         WHERE id = $1 AND number_of_rooms > 0 AND is_available = true",
    )
    .bind(category_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() == 1)
}

async fn release_room<'e>(
    executor: impl PgExecutor<'e>,
    category_id: i64,
) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(&format!(
        "UPDATE categories
         SET number_of_rooms = number_of_rooms + 1, updated_at = NOW()
         WHERE id = $1
         RETURNING {CATEGORY_COLUMNS}"
    ))
    .bind(category_id)
    .fetch_optional(executor)
    .await
}

async fn insert_booking<'e>(executor: impl PgExecutor<'e>, booking: &NewBooking) -> Result<Booking, sqlx::Error> {
    sqlx::query_as::<_, Booking>(&format!(
        "INSERT INTO bookings (customer_id, category_id, start_date, end_date, total_price)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {BOOKING_COLUMNS}"
    ))
    .bind(booking.customer_id)
    .bind(booking.category_id)
    .bind(booking.stay.start_date())
    .bind(booking.stay.end_date())
    .bind(booking.total_price)
    .fetch_one(executor)
    .await
}

#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn category(&self, id: i64) -> BookingResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn list_categories(&self) -> BookingResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn seasonal_prices(&self, category_id: i64) -> BookingResult<Vec<SeasonalPricing>> {
        let seasons = sqlx::query_as::<_, SeasonalPricing>(
            "SELECT id, category_id, start_date, end_date, price_per_night
             FROM seasonal_pricing
             WHERE category_id = $1
             ORDER BY start_date, id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(seasons)
    }

    async fn try_reserve_room(&self, category_id: i64) -> BookingResult<bool> {
        Ok(reserve_room(&self.pool, category_id).await?)
    }

    async fn release_room(&self, category_id: i64) -> BookingResult<Option<Category>> {
        Ok(release_room(&self.pool, category_id).await?)
    }

    async fn insert_booking(&self, booking: NewBooking) -> BookingResult<Booking> {
        Ok(insert_booking(&self.pool, &booking).await?)
    }

    async fn booking(&self, id: i64) -> BookingResult<Option<Booking>> {
        let row = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn bookings_for_customer(&self, customer_id: i64) -> BookingResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE customer_id = $1
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete_booking(&self, id: i64) -> BookingResult<bool> {
        let deleted = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected()
            > 0;
        Ok(deleted)
    }

    async fn reserve_and_insert_booking(&self, booking: NewBooking) -> BookingResult<Option<Booking>> {
        let mut tx = self.pool.begin().await?;

        if !reserve_room(&mut *tx, booking.category_id).await? {
            return Ok(None);
        }
        // an insert error drops the transaction and rolls the decrement back
        let row = insert_booking(&mut *tx, &booking).await?;

        tx.commit().await?;
        Ok(Some(row))
    }

    async fn delete_booking_and_release(&self, id: i64) -> BookingResult<Option<Category>> {
        let mut tx = self.pool.begin().await?;

        let category_id: Option<i64> =
            sqlx::query_scalar("DELETE FROM bookings WHERE id = $1 RETURNING category_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(category_id) = category_id else {
            return Ok(None);
        };

        let category = release_room(&mut *tx, category_id)
            .await?
            .ok_or_else(|| BookingError::not_found(format!("Category {} not found", category_id)))?;

        tx.commit().await?;
        Ok(Some(category))
    }

    async fn insert_seasonal_pricing(
        &self,
        pricing: NewSeasonalPricing,
    ) -> BookingResult<Option<SeasonalPricing>> {
        let mut tx = self.pool.begin().await?;

        // Serialize season writes per category so the overlap check holds.
        sqlx::query("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
            .bind(pricing.category_id)
            .fetch_optional(&mut *tx)
            .await?;

        let inserted = sqlx::query_as::<_, SeasonalPricing>(
            "INSERT INTO seasonal_pricing (category_id, start_date, end_date, price_per_night)
             SELECT $1, $2, $3, $4
             WHERE NOT EXISTS (
                 SELECT 1 FROM seasonal_pricing
                 WHERE category_id = $1 AND start_date <= $3 AND $2 <= end_date
             )
             RETURNING id, category_id, start_date, end_date, price_per_night",
        )
        .bind(pricing.category_id)
        .bind(pricing.start_date)
        .bind(pricing.end_date)
        .bind(pricing.price_per_night)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(inserted)
    }

    async fn record_payment(&self, payment: NewPayment) -> BookingResult<Payment> {
        let row = sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (booking_id, amount, status, transaction_id)
             VALUES ($1, $2, $3, $4)
             RETURNING id, booking_id, amount, payment_date, status, transaction_id",
        )
        .bind(payment.booking_id)
        .bind(payment.amount)
        .bind(payment.status)
        .bind(&payment.transaction_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn payments_for_booking(&self, booking_id: i64) -> BookingResult<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(
            "SELECT id, booking_id, amount, payment_date, status, transaction_id
             FROM payments
             WHERE booking_id = $1
             ORDER BY payment_date, id",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
