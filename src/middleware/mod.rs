use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose};
use std::sync::Arc;

use crate::error::BookingError;
use crate::models::{Customer, Role};

/// The authenticated caller of a booking endpoint.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub customer_id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), BookingError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(BookingError::Forbidden("Staff access required.".to_string()))
        }
    }
}

/// Splits a `Basic` authorization header into email and password.
fn parse_basic(header_value: &str) -> Option<(String, String)> {
    let encoded = header_value.strip_prefix("Basic ")?;
    let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;
    let (email, password) = credentials.split_once(':')?;
    Some((email.to_string(), password.to_string()))
}

// Basic Auth extractor
impl FromRequestParts<Arc<crate::AppState>> for AuthUser {
    type Rejection = BookingError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<crate::AppState>,
    ) -> Result<Self, Self::Rejection> {
        let (email, password) = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_basic)
            .ok_or(BookingError::Unauthorized)?;

        let customer = Customer::find_by_email(&email, &state.db)
            .await?
            .ok_or(BookingError::Unauthorized)?;

        if !customer.verify_password(&password).await {
            tracing::debug!("Rejected credentials for {}", email);
            return Err(BookingError::Unauthorized);
        }

        Ok(AuthUser {
            customer_id: customer.id,
            username: customer.username,
            email: customer.email,
            role: customer.role,
        })
    }
}
