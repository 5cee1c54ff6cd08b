//! Shared types for the POS order engine
//!
//! Data models, the stage-flow table, and id/time utilities used by the
//! server and by API clients. DB row derives live behind the `db` feature so
//! frontend consumers do not pull in sqlx.

pub mod flow;
pub mod models;
pub mod util;

// Re-exports
pub use flow::{FlowVariant, Stage};
pub use serde::{Deserialize, Serialize};
