//! Payment / Customer Models

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Payment mode record, append-only.
///
/// No unique constraint on `order_id`: tagging a bill twice leaves two rows.
/// Consumers that need exactly one mode take the newest by `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PaymentRecord {
    pub id: i64,
    pub order_id: i64,
    /// cash | card | upi | wallet — free-form, validated for length only
    pub mode: String,
    pub biller_ref: i64,
    pub created_at: i64,
}

/// Record-payment-mode payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaymentModeInput {
    pub order_id: i64,
    #[validate(length(min = 1, max = 32))]
    pub mode: String,
}

/// Customer info attached to an order at send-to-bill time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CustomerInfo {
    pub id: i64,
    pub order_id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub created_at: i64,
}

/// Optional customer payload on send-to-bill
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomerInfoInput {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
}
