//! HTTP handlers

pub mod auth;
pub mod category;
pub mod health;
pub mod shop;
pub mod shop_category;
pub mod user;

pub use auth::{login, refresh};
pub use category::*;
pub use health::health_check;
pub use shop::*;
pub use shop_category::*;
pub use user::*;
