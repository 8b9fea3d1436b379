//! Database models for the shop directory
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
