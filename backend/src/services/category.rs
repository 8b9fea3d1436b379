//! Category management service

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::Category;
use shared::validation::ValidationErrors;

/// Category service
#[derive(Clone)]
pub struct CategoryService {
    db: PgPool,
}

/// Input for creating or replacing a category
#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub label: String,
}

impl CategoryInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(!self.label.trim().is_empty(), "label", "must be provided");
        errors.into_result(())
    }
}

/// Every category plus the number of them
#[derive(Debug, Serialize)]
pub struct CategoryList {
    pub total: i64,
    pub categories: Vec<Category>,
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    total_count: i64,
    id: i64,
    label: String,
}

impl CategoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List all categories
    pub async fn list_categories(&self) -> AppResult<CategoryList> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT count(*) OVER () AS total_count, id, label FROM categories ORDER BY id",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(CategoryList {
            total: rows.first().map(|r| r.total_count).unwrap_or(0),
            categories: rows
                .into_iter()
                .map(|r| Category {
                    id: r.id,
                    label: r.label,
                })
                .collect(),
        })
    }

    pub async fn get_category(&self, category_id: i64) -> AppResult<Category> {
        let (id, label) = sqlx::query_as::<_, (i64, String)>(
            "SELECT id, label FROM categories WHERE id = $1",
        )
        .bind(category_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

        Ok(Category { id, label })
    }

    pub async fn create_category(&self, input: CategoryInput) -> AppResult<Category> {
        input.validate()?;

        let (id, label) = sqlx::query_as::<_, (i64, String)>(
            "INSERT INTO categories (label) VALUES ($1) RETURNING id, label",
        )
        .bind(input.label.trim())
        .fetch_one(&self.db)
        .await
        .map_err(|e| AppError::from_write(e, "A category with this label already exists"))?;

        Ok(Category { id, label })
    }

    /// Replace the label of a category
    pub async fn update_category(
        &self,
        category_id: i64,
        input: CategoryInput,
    ) -> AppResult<Category> {
        input.validate()?;

        let (id, label) = sqlx::query_as::<_, (i64, String)>(
            "UPDATE categories SET label = $1 WHERE id = $2 RETURNING id, label",
        )
        .bind(input.label.trim())
        .bind(category_id)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| AppError::from_write(e, "A category with this label already exists"))?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;

        Ok(Category { id, label })
    }

    /// Delete a category; its members go with it
    pub async fn delete_category(&self, category_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(category_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category".to_string()));
        }

        Ok(())
    }
}
