use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Failed,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub booking_id: i64,
    pub amount: Decimal,
    pub payment_date: NaiveDateTime,
    pub status: PaymentStatus,
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub booking_id: i64,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub transaction_id: String,
}

impl NewPayment {
    /// A pending payment for the booking's frozen total with a fresh transaction id.
    pub fn pending(booking_id: i64, amount: Decimal) -> Self {
        Self {
            booking_id,
            amount,
            status: PaymentStatus::Pending,
            transaction_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}
