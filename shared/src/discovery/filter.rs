//! Normalization of raw discovery query parameters into a typed filter

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::models::Role;
use crate::types::GeoPoint;
use crate::validation::ValidationErrors;

/// Values accepted by the `sort` parameter
pub const SORT_SAFELIST: &[&str] = &["id", "name", "created_at", "-id", "-name", "-created_at"];

/// Highest page number a caller may request
pub const MAX_PAGE: i64 = 10_000_000;

/// Fallbacks and bounds applied while normalizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterDefaults {
    pub page_size: u32,
    pub max_page_size: u32,
    pub max_distance: i64,
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            page_size: 20,
            max_page_size: 100,
            max_distance: 10,
        }
    }
}

/// Sortable shop columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Id,
    Name,
    CreatedAt,
}

impl SortField {
    pub fn name(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::CreatedAt => "created_at",
        }
    }

    /// Qualified shop column; the only sort text that ever reaches ORDER BY
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "shops.id",
            SortField::Name => "shops.name",
            SortField::CreatedAt => "shops.created_at",
        }
    }

    /// Qualified user column
    pub fn user_column(&self) -> &'static str {
        match self {
            SortField::Id => "users.id",
            SortField::Name => "users.name",
            SortField::CreatedAt => "users.created_at",
        }
    }
}

/// Sort column plus direction, parsed from the safelist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

impl SortKey {
    pub fn direction(&self) -> &'static str {
        if self.descending {
            "DESC"
        } else {
            "ASC"
        }
    }
}

impl Default for SortKey {
    fn default() -> Self {
        Self {
            field: SortField::Id,
            descending: false,
        }
    }
}

impl FromStr for SortKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (descending, name) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let field = match name {
            "id" => SortField::Id,
            "name" => SortField::Name,
            "created_at" => SortField::CreatedAt,
            _ => return Err(()),
        };
        Ok(Self { field, descending })
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "-{}", self.field.name())
        } else {
            f.write_str(self.field.name())
        }
    }
}

/// Radius search around a point, in metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceFilter {
    pub point: GeoPoint,
    pub max_distance: i64,
}

/// Validated, request-scoped discovery filter
#[derive(Debug, Clone, PartialEq)]
pub struct ShopFilter {
    /// Full-text name query; empty means no name restriction
    pub name: String,
    pub distance: Option<DistanceFilter>,
    /// Labels a shop must carry, all of them
    pub category_members: BTreeSet<String>,
    pub page: u32,
    pub page_size: u32,
    pub sort: SortKey,
}

impl ShopFilter {
    /// Filter with no restrictions and the default page
    pub fn unrestricted(defaults: &FilterDefaults) -> Self {
        Self {
            name: String::new(),
            distance: None,
            category_members: BTreeSet::new(),
            page: 1,
            page_size: defaults.page_size,
            sort: SortKey::default(),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }
}

/// Validated user listing filter
#[derive(Debug, Clone, PartialEq)]
pub struct UserFilter {
    /// Full-text name query; empty means no name restriction
    pub name: String,
    pub role: Option<Role>,
    pub page: u32,
    pub page_size: u32,
    pub sort: SortKey,
}

impl UserFilter {
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        (i64::from(self.page) - 1) * i64::from(self.page_size)
    }
}

/// Split a comma-separated list into a set of trimmed, non-empty labels
pub fn parse_csv_set(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse raw query parameters into a [`ShopFilter`].
///
/// Every parameter is checked even after a failure so that the caller gets
/// one combined report.
pub fn normalize(
    params: &HashMap<String, String>,
    defaults: &FilterDefaults,
) -> Result<ShopFilter, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let value = |key: &str| param(params, key);

    let paging = normalize_paging(params, defaults, &mut errors);

    let max_distance = parse_int(value("max_dist"), "max_dist", defaults.max_distance, &mut errors);
    errors.check(max_distance >= 0, "max_dist", "must not be negative");

    let point = match value("coordinate") {
        None => None,
        Some(raw) => match raw.parse::<GeoPoint>() {
            Ok(point) => Some(point),
            Err(e) => {
                errors.add("coordinate", e.to_string());
                None
            }
        },
    };

    let category_members = value("category_members")
        .map(parse_csv_set)
        .unwrap_or_default();

    let filter = ShopFilter {
        name: value("name").unwrap_or_default().to_string(),
        distance: point.map(|point| DistanceFilter {
            point,
            max_distance,
        }),
        category_members,
        page: paging.page,
        page_size: paging.page_size,
        sort: paging.sort,
    };

    errors.into_result(filter)
}

/// Parse raw query parameters of the user listing into a [`UserFilter`].
pub fn normalize_user_filter(
    params: &HashMap<String, String>,
    defaults: &FilterDefaults,
) -> Result<UserFilter, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let paging = normalize_paging(params, defaults, &mut errors);

    let role = match param(params, "role") {
        None => None,
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => Some(role),
            Err(_) => {
                errors.add("role", "must be one of ADMIN, OPERATOR or SALES");
                None
            }
        },
    };

    let filter = UserFilter {
        name: param(params, "name").unwrap_or_default().to_string(),
        role,
        page: paging.page,
        page_size: paging.page_size,
        sort: paging.sort,
    };

    errors.into_result(filter)
}

struct Paging {
    page: u32,
    page_size: u32,
    sort: SortKey,
}

fn param<'a>(params: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    params.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// `page`, `page_size` and `sort`, checked the same way for every listing
fn normalize_paging(
    params: &HashMap<String, String>,
    defaults: &FilterDefaults,
    errors: &mut ValidationErrors,
) -> Paging {
    let page = parse_int(param(params, "page"), "page", 1, errors);
    errors.check(page >= 1, "page", "must be greater than zero");
    errors.check(page <= MAX_PAGE, "page", "must be a maximum of 10 million");

    let page_size = parse_int(
        param(params, "page_size"),
        "page_size",
        i64::from(defaults.page_size),
        errors,
    );
    errors.check(page_size >= 1, "page_size", "must be greater than zero");
    errors.check(
        page_size <= i64::from(defaults.max_page_size),
        "page_size",
        format!("must be a maximum of {}", defaults.max_page_size),
    );

    let sort = match param(params, "sort") {
        None => SortKey::default(),
        Some(raw) => raw.parse::<SortKey>().unwrap_or_else(|_| {
            errors.add("sort", "invalid sort value");
            SortKey::default()
        }),
    };

    Paging {
        page: u32::try_from(page).unwrap_or(1),
        page_size: u32::try_from(page_size).unwrap_or(defaults.page_size),
        sort,
    }
}

fn parse_int(raw: Option<&str>, key: &str, default: i64, errors: &mut ValidationErrors) -> i64 {
    match raw {
        None => default,
        Some(s) => s.parse::<i64>().unwrap_or_else(|_| {
            errors.add(key, "must be an integer value");
            default
        }),
    }
}
