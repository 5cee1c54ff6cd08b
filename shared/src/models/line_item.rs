//! Line Item Model
//!
//! 一条 LineItem = 一个订单里某张桌、某个服务员名下的一种商品数量。
//! Order 不单独存储：共享同一 order_id 的行集合即是订单，订单状态永远是
//! 对行的查询，不是缓存字段。

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Line item row
///
/// Invariants enforced by the engine:
/// - `quantity > 0` while the row exists (a <= 0 update deletes it)
/// - `created_at` never changes after insert; only `updated_at` advances
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LineItem {
    pub id: i64,
    pub order_id: i64,
    pub item_ref: i64,
    pub quantity: i64,
    pub table_ref: String,
    pub server_ref: i64,
    pub chef_ref: Option<i64>,
    /// Stage code, interpreted through the configured [`crate::FlowVariant`]
    pub status: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Line item joined with menu data (cart / kitchen views)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: i64,
    pub order_id: i64,
    pub item_ref: i64,
    pub item_name: String,
    /// Live menu price, cents
    pub price_cents: i64,
    pub quantity: i64,
    pub table_ref: String,
    pub server_ref: i64,
    pub chef_ref: Option<i64>,
    pub status: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Kitchen display line (adds staff names for the screen)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct KitchenLine {
    pub id: i64,
    pub order_id: i64,
    pub item_name: String,
    pub quantity: i64,
    pub table_ref: String,
    pub server_name: String,
    pub chef_ref: Option<i64>,
    pub status: i64,
    pub created_at: i64,
}

/// Add-item payload. `server_ref` defaults to the authenticated caller.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddItemInput {
    #[validate(length(min = 1, max = 32))]
    pub table_ref: String,
    pub item_ref: i64,
    #[validate(range(min = 1))]
    pub quantity: i64,
    pub server_ref: Option<i64>,
}

/// Quantity update payload. `quantity <= 0` removes the line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityUpdate {
    pub quantity: i64,
}

/// Result of an add-item call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemOutcome {
    pub line_id: i64,
    pub order_id: i64,
    pub quantity: i64,
    /// true if an existing cart line was incremented instead of inserted
    pub merged: bool,
}

/// Result of a bulk transition; `moved == 0` surfaces as not-found upstream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkTransition {
    pub moved: u64,
    pub order_ids: Vec<i64>,
}

/// One item row on a grouped order view. Split lines of the same item are
/// collapsed with their quantities summed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryLine {
    pub item_ref: i64,
    pub item_name: String,
    pub price_cents: i64,
    pub quantity: i64,
    pub total_cents: i64,
}

/// An order grouped for the biller / completed-orders screens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order_id: i64,
    pub table_ref: String,
    pub server_ref: i64,
    pub server_name: Option<String>,
    pub total_cents: i64,
    pub created_at: i64,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub lines: Vec<SummaryLine>,
}
