//! Shop to category member links

use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::ShopCategoryLink;

#[derive(Clone)]
pub struct ShopCategoryService {
    db: PgPool,
}

impl ShopCategoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Tag a shop with a category member
    pub async fn link(&self, link: ShopCategoryLink) -> AppResult<ShopCategoryLink> {
        let (shop_id, category_member_id) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            INSERT INTO shop_categories (shop_id, category_member_id)
            VALUES ($1, $2)
            RETURNING shop_id, category_member_id
            "#,
        )
        .bind(link.shop_id)
        .bind(link.category_member_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            if let Some(db) = e.as_database_error() {
                if db.code().as_deref() == Some("23503") {
                    return AppError::NotFound("Shop or category member".to_string());
                }
            }
            AppError::from_write(e, "The shop already carries this category member")
        })?;

        Ok(ShopCategoryLink {
            shop_id,
            category_member_id,
        })
    }

    /// Remove a tag from a shop
    pub async fn unlink(&self, link: ShopCategoryLink) -> AppResult<()> {
        let result = sqlx::query(
            "DELETE FROM shop_categories WHERE shop_id = $1 AND category_member_id = $2",
        )
        .bind(link.shop_id)
        .bind(link.category_member_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Shop category link".to_string()));
        }

        Ok(())
    }
}
