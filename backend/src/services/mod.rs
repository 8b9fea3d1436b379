//! Business logic services for the shop directory

pub mod auth;
pub mod category;
pub mod category_member;
pub mod discovery;
pub mod shop;
pub mod shop_category;
pub mod token;
pub mod user;

pub use auth::AuthService;
pub use category::CategoryService;
pub use category_member::CategoryMemberService;
pub use discovery::DiscoveryService;
pub use shop::ShopService;
pub use shop_category::ShopCategoryService;
pub use token::TokenService;
pub use user::UserService;
