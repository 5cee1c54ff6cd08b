//! Menu Item Model

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Menu item entity
///
/// `price_cents` is the live unit price. Order lines do not snapshot it:
/// revenue queries join back here at read time, so a price change moves
/// the figures of orders still in flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Price in cents
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MenuItemCreate {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(min = 1, max = 60))]
    pub category: String,
    #[validate(range(min = 0))]
    pub price_cents: i64,
}

/// Update menu item payload (partial)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub is_active: Option<bool>,
}
