//! Category taxonomy models

use serde::{Deserialize, Serialize};

/// Top-level facet grouping such as "Vehicle Type"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub label: String,
}

/// Facet value a shop is tagged with, such as "SUV"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMember {
    pub id: i64,
    pub label: String,
    pub category_id: i64,
}

/// Tags a shop with a category member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShopCategoryLink {
    pub shop_id: i64,
    pub category_member_id: i64,
}
