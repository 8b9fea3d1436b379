//! Shop discovery executor
//!
//! Runs a composed query under a time limit and folds the rows into shops
//! plus the window total carried on every row.

use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgArguments, query::QueryAs, PgPool, Postgres};

use crate::error::{AppError, AppResult};
use crate::models::Shop;
use shared::discovery::{
    calculate_metadata, compose_shop_count_query, compose_shop_query, ComposedQuery, QueryArg,
    ShopFilter,
};
use shared::types::{GeoPoint, Page};

/// One result row: a shop plus the window total
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopRow {
    pub total_count: i64,
    pub id: i64,
    pub name: String,
    pub phone_number: String,
    pub email: String,
    pub location: String,
    pub coordinate: Option<String>,
    pub thumbnail: Option<String>,
    pub photos: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub approval_status: String,
    pub created_by: i64,
}

impl TryFrom<ShopRow> for Shop {
    type Error = AppError;

    fn try_from(row: ShopRow) -> Result<Self, Self::Error> {
        let approval_status = row
            .approval_status
            .parse()
            .map_err(|e| AppError::RowDecode(format!("shop {}: {}", row.id, e)))?;
        let coordinate = row
            .coordinate
            .as_deref()
            .map(GeoPoint::from_wkt)
            .transpose()
            .map_err(|e| AppError::RowDecode(format!("shop {}: {}", row.id, e)))?;

        Ok(Shop {
            id: row.id,
            name: row.name,
            phone_number: row.phone_number,
            email: row.email,
            approval_status,
            location: row.location,
            coordinate,
            thumbnail: row.thumbnail,
            photos: row.photos,
            created_at: row.created_at,
            created_by: row.created_by,
        })
    }
}

/// Decode every row, failing the whole page on the first bad one.
///
/// Returns the shops in row order and the total taken from the window count.
pub fn collect_page(rows: Vec<ShopRow>) -> AppResult<(Vec<Shop>, u64)> {
    let total = rows
        .first()
        .map(|row| u64::try_from(row.total_count).unwrap_or(0))
        .unwrap_or(0);
    let shops = rows
        .into_iter()
        .map(Shop::try_from)
        .collect::<AppResult<Vec<_>>>()?;
    Ok((shops, total))
}

pub(crate) fn bind_args<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    args: &'q [QueryArg],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for arg in args {
        query = match arg {
            QueryArg::Text(value) => query.bind(value.as_str()),
            QueryArg::BigInt(value) => query.bind(*value),
        };
    }
    query
}

/// Discovery service
#[derive(Clone)]
pub struct DiscoveryService {
    db: PgPool,
    query_timeout: Duration,
}

impl DiscoveryService {
    pub fn new(db: PgPool, query_timeout: Duration) -> Self {
        Self { db, query_timeout }
    }

    /// Run the page query for `filter` and return shops plus metadata
    pub async fn search(&self, filter: &ShopFilter) -> AppResult<Page<Shop>> {
        let query = compose_shop_query(filter)?;
        let (shops, mut total) = self.execute(&query).await?;

        // Past the last page no row carries the total
        if shops.is_empty() && filter.page > 1 {
            total = self.count(filter).await?;
        }

        tracing::debug!(
            total,
            returned = shops.len(),
            page = filter.page,
            "Discovery query finished"
        );

        Ok(Page {
            metadata: calculate_metadata(total, filter.page, filter.page_size),
            shops,
        })
    }

    /// Execute a composed page query under the configured time limit
    pub async fn execute(&self, query: &ComposedQuery) -> AppResult<(Vec<Shop>, u64)> {
        let rows = bind_args(sqlx::query_as::<_, ShopRow>(query.sql()), query.args());
        let rows = tokio::time::timeout(self.query_timeout, rows.fetch_all(&self.db))
            .await
            .map_err(|_| AppError::QueryTimeout)??;
        collect_page(rows)
    }

    async fn count(&self, filter: &ShopFilter) -> AppResult<u64> {
        let query = compose_shop_count_query(filter)?;
        let count = bind_args(sqlx::query_as::<_, (i64,)>(query.sql()), query.args());
        let (total,) = tokio::time::timeout(self.query_timeout, count.fetch_one(&self.db))
            .await
            .map_err(|_| AppError::QueryTimeout)??;
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
