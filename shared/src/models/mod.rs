//! Data models
//!
//! Shared between pos-server and frontend (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY), timestamps are Unix millis.

pub mod line_item;
pub mod menu_item;
pub mod payment;
pub mod staff;

// Re-exports
pub use line_item::*;
pub use menu_item::*;
pub use payment::*;
pub use staff::*;
