//! Shared types and models for the shop directory service
//!
//! Everything in this crate is free of I/O: domain models, validation helpers
//! and the pure half of the shop discovery engine (filter normalization,
//! query composition and pagination metadata).

pub mod discovery;
pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
