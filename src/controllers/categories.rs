use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::BookingError;
use crate::middleware::AuthUser;
use crate::models::NewSeasonalPricing;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(get_catalog))
        .route("/categories/{id}/quote", get(quote_price))
        .route(
            "/categories/{id}/seasonal-prices",
            get(list_seasonal_prices).post(create_seasonal_price),
        )
}

// GET /api/categories
async fn get_catalog(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, BookingError> {
    Ok(Json(state.cache.get_catalog().await?))
}

// GET /api/categories/{id}/quote?start_date=..&end_date=..
#[derive(Debug, Deserialize)]
struct QuoteQuery {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

async fn quote_price(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i64>,
    Query(params): Query<QuoteQuery>,
) -> Result<impl IntoResponse, BookingError> {
    let quote = state
        .bookings
        .quote_price(category_id, params.start_date, params.end_date)
        .await?;
    Ok(Json(quote))
}

// GET /api/categories/{id}/seasonal-prices
async fn list_seasonal_prices(
    State(state): State<Arc<AppState>>,
    Path(category_id): Path<i64>,
) -> Result<impl IntoResponse, BookingError> {
    Ok(Json(state.seasons.list(category_id).await?))
}

// POST /api/categories/{id}/seasonal-prices
#[derive(Debug, Deserialize)]
struct CreateSeasonalPriceRequest {
    start_date: NaiveDate,
    end_date: NaiveDate,
    price_per_night: Decimal,
}

async fn create_seasonal_price(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(category_id): Path<i64>,
    Json(req): Json<CreateSeasonalPriceRequest>,
) -> Result<impl IntoResponse, BookingError> {
    user.require_admin()?;

    let season = state
        .seasons
        .create(NewSeasonalPricing {
            category_id,
            start_date: req.start_date,
            end_date: req.end_date,
            price_per_night: req.price_per_night,
        })
        .await?;
    state.cache.invalidate_catalog().await;

    Ok((StatusCode::CREATED, Json(season)))
}
