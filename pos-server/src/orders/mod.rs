//! Orders Module
//!
//! The order state engine and its query filter. Everything that creates,
//! merges, or transitions a line item goes through [`OrderEngine`].

pub mod engine;
pub mod filter;

pub use engine::{EngineError, EngineResult, OrderEngine};
pub use filter::{LineFilter, Scope};
