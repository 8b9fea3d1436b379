//! Category member management service

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::CategoryMember;
use shared::validation::ValidationErrors;

/// Category member service
#[derive(Clone)]
pub struct CategoryMemberService {
    db: PgPool,
}

/// Input for creating a category member
#[derive(Debug, Deserialize)]
pub struct CreateMemberInput {
    pub label: String,
    pub category_id: i64,
}

/// Input for updating a category member
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMemberInput {
    pub label: Option<String>,
    pub category_id: Option<i64>,
}

/// Every member plus the number of them
#[derive(Debug, Serialize)]
pub struct MemberList {
    pub total: i64,
    pub category_members: Vec<CategoryMember>,
}

#[derive(sqlx::FromRow)]
struct MemberRow {
    #[sqlx(default)]
    total_count: i64,
    id: i64,
    label: String,
    category_id: i64,
}

impl From<MemberRow> for CategoryMember {
    fn from(row: MemberRow) -> Self {
        CategoryMember {
            id: row.id,
            label: row.label,
            category_id: row.category_id,
        }
    }
}

fn check_label(label: &str, errors: &mut ValidationErrors) {
    errors.check(!label.trim().is_empty(), "label", "must be provided");
    errors.check(!label.contains(','), "label", "must not contain a comma");
}

impl CreateMemberInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_label(&self.label, &mut errors);
        errors.check(self.category_id > 0, "category_id", "must be greater than zero");
        errors.into_result(())
    }
}

impl UpdateMemberInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(label) = &self.label {
            check_label(label, &mut errors);
        }
        if let Some(category_id) = self.category_id {
            errors.check(category_id > 0, "category_id", "must be greater than zero");
        }
        errors.into_result(())
    }
}

/// Foreign key violations mean the referenced category is missing
fn map_write_error(err: sqlx::Error) -> AppError {
    if let Some(db) = err.as_database_error() {
        if db.code().as_deref() == Some("23503") {
            return AppError::NotFound("Category".to_string());
        }
    }
    AppError::from_write(err, "This category already has a member with that label")
}

impl CategoryMemberService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list_members(&self) -> AppResult<MemberList> {
        let rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT count(*) OVER () AS total_count, id, label, category_id
            FROM category_members
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(MemberList {
            total: rows.first().map(|r| r.total_count).unwrap_or(0),
            category_members: rows.into_iter().map(CategoryMember::from).collect(),
        })
    }

    pub async fn get_member(&self, member_id: i64) -> AppResult<CategoryMember> {
        sqlx::query_as::<_, MemberRow>(
            "SELECT id, label, category_id FROM category_members WHERE id = $1",
        )
        .bind(member_id)
        .fetch_optional(&self.db)
        .await?
        .map(CategoryMember::from)
        .ok_or_else(|| AppError::NotFound("Category member".to_string()))
    }

    pub async fn create_member(&self, input: CreateMemberInput) -> AppResult<CategoryMember> {
        input.validate()?;

        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            INSERT INTO category_members (label, category_id)
            VALUES ($1, $2)
            RETURNING id, label, category_id
            "#,
        )
        .bind(input.label.trim())
        .bind(input.category_id)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    pub async fn update_member(
        &self,
        member_id: i64,
        input: UpdateMemberInput,
    ) -> AppResult<CategoryMember> {
        input.validate()?;

        sqlx::query_as::<_, MemberRow>(
            r#"
            UPDATE category_members SET
                label = COALESCE($2, label),
                category_id = COALESCE($3, category_id)
            WHERE id = $1
            RETURNING id, label, category_id
            "#,
        )
        .bind(member_id)
        .bind(input.label.as_deref().map(str::trim))
        .bind(input.category_id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?
        .map(CategoryMember::from)
        .ok_or_else(|| AppError::NotFound("Category member".to_string()))
    }

    pub async fn delete_member(&self, member_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM category_members WHERE id = $1")
            .bind(member_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Category member".to_string()));
        }

        Ok(())
    }
}
