//! Pure half of the shop discovery engine
//!
//! Raw parameters flow through [`filter::normalize`], then
//! [`query::compose_shop_query`]; the backend executes the composed query and
//! hands the captured total to [`metadata::calculate_metadata`]. The staff user
//! listing goes through the same paging rules and composer.

pub mod filter;
pub mod metadata;
pub mod query;

pub use filter::{
    normalize, normalize_user_filter, parse_csv_set, DistanceFilter, FilterDefaults, ShopFilter,
    SortField, SortKey, UserFilter, MAX_PAGE, SORT_SAFELIST,
};
pub use metadata::calculate_metadata;
pub use query::{
    compose_shop_count_query, compose_shop_query, compose_user_count_query, compose_user_query,
    placeholder_indices, ComposedQuery, ComposerError, Placeholder, QueryArg, QueryBuilder,
};
