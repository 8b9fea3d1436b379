//! Parameterized query composition for shop discovery
//!
//! [`QueryBuilder`] owns the SQL text and the bound arguments together, so a
//! placeholder can only be written by binding its value in the same call.
//! Caller-supplied values never appear in the text.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use super::filter::{ShopFilter, SortField, UserFilter};

/// A value bound to a positional placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum QueryArg {
    Text(String),
    BigInt(i64),
}

impl From<String> for QueryArg {
    fn from(value: String) -> Self {
        QueryArg::Text(value)
    }
}

impl From<&str> for QueryArg {
    fn from(value: &str) -> Self {
        QueryArg::Text(value.to_string())
    }
}

impl From<i64> for QueryArg {
    fn from(value: i64) -> Self {
        QueryArg::BigInt(value)
    }
}

/// Positional placeholder (`$n`) returned by [`QueryBuilder::bind`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder(usize);

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// Text and arguments fell out of step while composing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposerError {
    #[error("fragment has {markers} markers but {values} values were supplied")]
    MarkerCountMismatch { markers: usize, values: usize },

    #[error("query references placeholders {found:?} but binds {bound} arguments")]
    PlaceholderMismatch { found: Vec<usize>, bound: usize },
}

/// Finished query text plus its arguments in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    sql: String,
    args: Vec<QueryArg>,
}

impl ComposedQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn args(&self) -> &[QueryArg] {
        &self.args
    }
}

/// Accumulates SQL text and arguments in lockstep
#[derive(Debug, Default)]
pub struct QueryBuilder {
    sql: String,
    args: Vec<QueryArg>,
    error: Option<ComposerError>,
}

impl QueryBuilder {
    pub fn new(base: &str) -> Self {
        Self {
            sql: base.to_string(),
            ..Self::default()
        }
    }

    /// Append raw SQL that carries no values
    pub fn push(&mut self, fragment: &str) -> &mut Self {
        self.sql.push_str(fragment);
        self
    }

    /// Bind a value and return its placeholder without writing any text
    pub fn bind(&mut self, value: impl Into<QueryArg>) -> Placeholder {
        self.args.push(value.into());
        Placeholder(self.args.len())
    }

    /// Append ` AND <fragment>`, replacing each `?` with a fresh placeholder
    /// bound to the matching value.
    pub fn push_predicate(&mut self, fragment: &str, values: Vec<QueryArg>) -> &mut Self {
        self.sql.push_str(" AND ");
        self.push_bound(fragment, values)
    }

    /// Append `fragment`, replacing each `?` with a fresh placeholder bound
    /// to the matching value.
    pub fn push_bound(&mut self, fragment: &str, values: Vec<QueryArg>) -> &mut Self {
        let markers = fragment.matches('?').count();
        if markers != values.len() {
            self.error.get_or_insert(ComposerError::MarkerCountMismatch {
                markers,
                values: values.len(),
            });
            return self;
        }

        let mut values = values.into_iter();
        for (i, piece) in fragment.split('?').enumerate() {
            if i > 0 {
                if let Some(value) = values.next() {
                    let placeholder = self.bind(value);
                    self.sql.push_str(&placeholder.to_string());
                }
            }
            self.sql.push_str(piece);
        }
        self
    }

    /// Finish the query, checking that the placeholders referenced in the
    /// text are exactly `$1..=$n` for `n` bound arguments.
    pub fn build(self) -> Result<ComposedQuery, ComposerError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let found = placeholder_indices(&self.sql);
        let expected: BTreeSet<usize> = (1..=self.args.len()).collect();
        if found != expected {
            return Err(ComposerError::PlaceholderMismatch {
                found: found.into_iter().collect(),
                bound: self.args.len(),
            });
        }

        Ok(ComposedQuery {
            sql: self.sql,
            args: self.args,
        })
    }
}

/// Distinct `$n` indices referenced in `sql`
pub fn placeholder_indices(sql: &str) -> BTreeSet<usize> {
    let mut found = BTreeSet::new();
    let mut chars = sql.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '$' {
            continue;
        }
        let mut digits = String::new();
        while let Some(&(_, d)) = chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            digits.push(d);
            chars.next();
        }
        if let Ok(n) = digits.parse::<usize>() {
            found.insert(n);
        }
    }
    found
}

// ============================================================================
// Shop Discovery
// ============================================================================

const SHOP_COLUMNS: &str = "shops.id, shops.name, shops.phone_number, shops.email, \
     shops.location, ST_AsText(shops.coordinate) AS coordinate, shops.thumbnail, \
     shops.photos, shops.created_at, shops.approval_status, shops.created_by";

const SHOP_JOINS: &str = " FROM shops \
     LEFT JOIN shop_categories ON shops.id = shop_categories.shop_id \
     LEFT JOIN category_members ON shop_categories.category_member_id = category_members.id";

/// Name, category and distance predicates plus grouping, shared by the page
/// query and the count query so both match the same shops.
fn push_filters(builder: &mut QueryBuilder, filter: &ShopFilter) {
    let name = builder.bind(filter.name.as_str());
    builder.push(&format!(
        " WHERE (to_tsvector('simple', shops.name) @@ plainto_tsquery('simple', {name}) OR {name} = '')"
    ));

    if !filter.category_members.is_empty() {
        let markers = vec!["?"; filter.category_members.len()].join(", ");
        builder.push_predicate(
            &format!("category_members.label IN ({markers})"),
            filter.category_members.iter().map(|l| QueryArg::from(l.as_str())).collect(),
        );
    }

    if let Some(distance) = filter.distance {
        builder.push_predicate(
            "ST_Distance(shops.coordinate, ST_GeogFromText(?)) <= ?",
            vec![distance.point.to_ewkt().into(), distance.max_distance.into()],
        );
    }

    // One row per shop even when it carries several tags
    builder.push(" GROUP BY shops.id");

    if !filter.category_members.is_empty() {
        let required = i64::try_from(filter.category_members.len()).unwrap_or(i64::MAX);
        builder.push_bound(
            " HAVING COUNT(DISTINCT category_members.label) = ?",
            vec![required.into()],
        );
    }
}

/// Compose the page query: matching shops with the window total on each row.
pub fn compose_shop_query(filter: &ShopFilter) -> Result<ComposedQuery, ComposerError> {
    let mut builder = QueryBuilder::new(&format!(
        "SELECT count(*) OVER () AS total_count, {SHOP_COLUMNS}{SHOP_JOINS}"
    ));

    push_filters(&mut builder, filter);

    match filter.distance {
        Some(distance) => builder.push_bound(
            " ORDER BY ST_Distance(shops.coordinate, ST_GeogFromText(?)) ASC, shops.id ASC",
            vec![distance.point.to_ewkt().into()],
        ),
        None if filter.sort.field == SortField::Id => builder.push(&format!(
            " ORDER BY shops.id {}",
            filter.sort.direction()
        )),
        None => builder.push(&format!(
            " ORDER BY {} {}, shops.id ASC",
            filter.sort.field.column(),
            filter.sort.direction()
        )),
    };

    // Numbered from the final argument count, whatever came before
    builder.push_bound(
        " LIMIT ? OFFSET ?",
        vec![filter.limit().into(), filter.offset().into()],
    );

    builder.build()
}

/// Compose a query returning only the number of matching shops.
///
/// Used when a page lies past the end of the result set, where no row is left
/// to carry the window total.
pub fn compose_shop_count_query(filter: &ShopFilter) -> Result<ComposedQuery, ComposerError> {
    let mut builder = QueryBuilder::new(&format!(
        "SELECT count(*) AS total_count FROM (SELECT shops.id{SHOP_JOINS}"
    ));
    push_filters(&mut builder, filter);
    builder.push(") AS matched");
    builder.build()
}

// ============================================================================
// User Listing
// ============================================================================

const USER_COLUMNS: &str = "users.id, users.name, users.email, users.phone_number, \
     users.role, users.is_verified, users.created_at";

fn push_user_filters(builder: &mut QueryBuilder, filter: &UserFilter) {
    let name = builder.bind(filter.name.as_str());
    builder.push(&format!(
        " WHERE (to_tsvector('simple', users.name) @@ plainto_tsquery('simple', {name}) OR {name} = '')"
    ));

    if let Some(role) = filter.role {
        builder.push_predicate("users.role = ?", vec![role.as_str().into()]);
    }
}

/// Compose the user page query with the window total on each row.
pub fn compose_user_query(filter: &UserFilter) -> Result<ComposedQuery, ComposerError> {
    let mut builder = QueryBuilder::new(&format!(
        "SELECT count(*) OVER () AS total_count, {USER_COLUMNS} FROM users"
    ));

    push_user_filters(&mut builder, filter);

    if filter.sort.field == SortField::Id {
        builder.push(&format!(" ORDER BY users.id {}", filter.sort.direction()));
    } else {
        builder.push(&format!(
            " ORDER BY {} {}, users.id ASC",
            filter.sort.field.user_column(),
            filter.sort.direction()
        ));
    }

    builder.push_bound(
        " LIMIT ? OFFSET ?",
        vec![filter.limit().into(), filter.offset().into()],
    );

    builder.build()
}

/// Number of users matching `filter`, for pages past the end
pub fn compose_user_count_query(filter: &UserFilter) -> Result<ComposedQuery, ComposerError> {
    let mut builder = QueryBuilder::new("SELECT count(*) AS total_count FROM users");
    push_user_filters(&mut builder, filter);
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::filter::{normalize, normalize_user_filter, FilterDefaults};
    use crate::models::Role;
    use std::collections::HashMap;

    fn filter(pairs: &[(&str, &str)]) -> ShopFilter {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        normalize(&params, &FilterDefaults::default()).unwrap()
    }

    #[test]
    fn test_push_predicate_numbers_markers() {
        let mut builder = QueryBuilder::new("SELECT 1 FROM t WHERE TRUE");
        builder.push_predicate("a = ? AND b = ?", vec!["x".into(), 5i64.into()]);
        builder.push_predicate("c = ?", vec!["y".into()]);
        let query = builder.build().unwrap();

        assert_eq!(
            query.sql(),
            "SELECT 1 FROM t WHERE TRUE AND a = $1 AND b = $2 AND c = $3"
        );
        assert_eq!(
            query.args(),
            &[
                QueryArg::Text("x".into()),
                QueryArg::BigInt(5),
                QueryArg::Text("y".into())
            ]
        );
    }

    #[test]
    fn test_marker_mismatch_is_reported() {
        let mut builder = QueryBuilder::new("SELECT 1");
        builder.push_predicate("a = ? AND b = ?", vec!["x".into()]);
        assert_eq!(
            builder.build(),
            Err(ComposerError::MarkerCountMismatch {
                markers: 2,
                values: 1
            })
        );
    }

    #[test]
    fn test_unbound_placeholder_is_reported() {
        let mut builder = QueryBuilder::new("SELECT 1 WHERE a = $1 AND b = $2");
        builder.bind("x");
        assert!(matches!(
            builder.build(),
            Err(ComposerError::PlaceholderMismatch { bound: 1, .. })
        ));
    }

    #[test]
    fn test_placeholder_indices() {
        let found = placeholder_indices("a = $1 OR $1 = '' AND b IN ($2, $10) LIMIT $3");
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 10]);
        assert!(placeholder_indices("SELECT '$'").is_empty());
    }

    #[test]
    fn test_unrestricted_query() {
        let query = compose_shop_query(&filter(&[])).unwrap();
        let sql = query.sql();

        assert!(sql.starts_with("SELECT count(*) OVER () AS total_count, shops.id"));
        assert!(sql.contains("plainto_tsquery('simple', $1) OR $1 = ''"));
        assert!(!sql.contains("HAVING"));
        assert!(!sql.contains("ST_Distance"));
        assert!(sql.ends_with("GROUP BY shops.id ORDER BY shops.id ASC LIMIT $2 OFFSET $3"));
        assert_eq!(
            query.args(),
            &[
                QueryArg::Text(String::new()),
                QueryArg::BigInt(20),
                QueryArg::BigInt(0)
            ]
        );
    }

    #[test]
    fn test_category_query_requires_every_label() {
        let query = compose_shop_query(&filter(&[
            ("category_members", "SUV,Diesel"),
            ("page", "2"),
            ("page_size", "10"),
        ]))
        .unwrap();
        let sql = query.sql();

        assert!(sql.contains("AND category_members.label IN ($2, $3)"));
        assert!(sql.contains("GROUP BY shops.id HAVING COUNT(DISTINCT category_members.label) = $4"));
        assert!(sql.ends_with("LIMIT $5 OFFSET $6"));
        assert_eq!(
            &query.args()[1..],
            &[
                QueryArg::Text("Diesel".into()),
                QueryArg::Text("SUV".into()),
                QueryArg::BigInt(2),
                QueryArg::BigInt(10),
                QueryArg::BigInt(10)
            ]
        );
    }

    #[test]
    fn test_distance_query_orders_by_distance_then_id() {
        let query = compose_shop_query(&filter(&[
            ("coordinate", "38.76 9.01"),
            ("max_dist", "2500"),
            ("sort", "-name"),
        ]))
        .unwrap();
        let sql = query.sql();

        assert!(sql.contains("AND ST_Distance(shops.coordinate, ST_GeogFromText($2)) <= $3"));
        assert!(sql.contains(
            "ORDER BY ST_Distance(shops.coordinate, ST_GeogFromText($4)) ASC, shops.id ASC"
        ));
        assert!(!sql.contains("shops.name DESC"));
        let point = QueryArg::Text("SRID=4326;POINT(38.76 9.01)".into());
        assert_eq!(query.args()[1], point);
        assert_eq!(query.args()[2], QueryArg::BigInt(2500));
        assert_eq!(query.args()[3], point);
        assert!(sql.ends_with("LIMIT $5 OFFSET $6"));
    }

    #[test]
    fn test_sort_key_with_id_tiebreak() {
        let query = compose_shop_query(&filter(&[("sort", "-created_at")])).unwrap();
        assert!(query
            .sql()
            .contains("ORDER BY shops.created_at DESC, shops.id ASC LIMIT"));

        let query = compose_shop_query(&filter(&[("sort", "-id")])).unwrap();
        assert!(query.sql().contains("ORDER BY shops.id DESC LIMIT"));
    }

    #[test]
    fn test_name_is_bound_not_interpolated() {
        let query = compose_shop_query(&filter(&[("name", "x'); DROP TABLE shops; --")])).unwrap();
        assert!(!query.sql().contains("DROP TABLE"));
        assert_eq!(
            query.args()[0],
            QueryArg::Text("x'); DROP TABLE shops; --".into())
        );
    }

    #[test]
    fn test_count_query_shares_predicates() {
        let f = filter(&[
            ("name", "garage"),
            ("category_members", "SUV"),
            ("coordinate", "38.76 9.01"),
        ]);
        let count = compose_shop_count_query(&f).unwrap();
        let sql = count.sql();

        assert!(sql.starts_with("SELECT count(*) AS total_count FROM (SELECT shops.id FROM shops"));
        assert!(sql.contains("HAVING COUNT(DISTINCT category_members.label) = $5"));
        assert!(sql.ends_with(") AS matched"));
        assert!(!sql.contains("LIMIT"));
        assert_eq!(count.args().len(), 5);

        let page = compose_shop_query(&f).unwrap();
        assert_eq!(&page.args()[..5], count.args());
    }

    fn user_filter(pairs: &[(&str, &str)]) -> UserFilter {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        normalize_user_filter(&params, &FilterDefaults::default()).unwrap()
    }

    #[test]
    fn test_user_query_without_role() {
        let query = compose_user_query(&user_filter(&[])).unwrap();
        let sql = query.sql();

        assert!(sql.starts_with("SELECT count(*) OVER () AS total_count, users.id"));
        assert!(sql.contains("plainto_tsquery('simple', $1) OR $1 = ''"));
        assert!(!sql.contains("users.role ="));
        assert!(sql.ends_with("ORDER BY users.id ASC LIMIT $2 OFFSET $3"));
        assert_eq!(query.args().len(), 3);
    }

    #[test]
    fn test_user_query_binds_role_and_sorts() {
        let query = compose_user_query(&user_filter(&[
            ("name", "Sara"),
            ("role", "SALES"),
            ("sort", "-name"),
            ("page", "3"),
            ("page_size", "5"),
        ]))
        .unwrap();
        let sql = query.sql();

        assert!(sql.contains("AND users.role = $2"));
        assert!(sql.contains("ORDER BY users.name DESC, users.id ASC LIMIT $3 OFFSET $4"));
        assert_eq!(
            query.args(),
            &[
                QueryArg::Text("Sara".into()),
                QueryArg::Text(Role::Sales.as_str().into()),
                QueryArg::BigInt(5),
                QueryArg::BigInt(10)
            ]
        );

        let count = compose_user_count_query(&user_filter(&[("role", "SALES")])).unwrap();
        assert_eq!(
            count.sql(),
            "SELECT count(*) AS total_count FROM users WHERE (to_tsvector('simple', users.name) \
             @@ plainto_tsquery('simple', $1) OR $1 = '') AND users.role = $2"
        );
    }
}
