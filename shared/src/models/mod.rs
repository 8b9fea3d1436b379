//! Domain models for the directory service

mod category;
mod shop;
mod user;

pub use category::*;
pub use shop::*;
pub use user::*;
