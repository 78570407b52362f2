use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::error::BookingError;
use crate::middleware::AuthUser;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", get(get_user_bookings).post(create_booking))
        .route("/bookings/{id}", delete(delete_booking))
        .route("/bookings/{id}/payments", get(list_payments).post(record_payment))
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
#[derive(Debug, Deserialize, Validate)]
struct CreateBookingRequest {
    #[validate(range(min = 1, message = "category_id must be > 0"))]
    category_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, BookingError> {
    req.validate()?;

    let booking = state
        .bookings
        .create_booking(user.customer_id, req.category_id, req.start_date, req.end_date)
        .await?;

    // room count changed
    state.cache.invalidate_catalog().await;

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, BookingError> {
    let bookings = state.bookings.bookings_for_customer(user.customer_id).await?;
    Ok(Json(bookings))
}

// DELETE /api/bookings/{id}
async fn delete_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, BookingError> {
    if booking_id <= 0 {
        return Err(BookingError::validation("booking id must be > 0"));
    }

    let booking = state.bookings.delete_booking(booking_id, user.customer_id).await?;
    state.cache.invalidate_catalog().await;

    Ok(Json(serde_json::json!({
        "message": "Booking deleted",
        "booking_id": booking.id,
        "category_id": booking.category_id,
    })))
}

/* ---------- PAYMENTS ---------- */

// GET /api/bookings/{id}/payments
async fn list_payments(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, BookingError> {
    let payments = state.bookings.payments(booking_id, user.customer_id).await?;
    Ok(Json(payments))
}

// POST /api/bookings/{id}/payments
async fn record_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(booking_id): Path<i64>,
) -> Result<impl IntoResponse, BookingError> {
    let payment = state.bookings.record_payment(booking_id, user.customer_id).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}
