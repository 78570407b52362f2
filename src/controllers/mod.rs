pub mod bookings;
pub mod categories;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(categories::routes())
        .merge(bookings::routes())
}
