//! Staff user management

use std::time::Duration;

use bcrypt::{hash, DEFAULT_COST};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config::BootstrapAdminConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Role, User};
use crate::services::discovery::bind_args;
use shared::discovery::{
    calculate_metadata, compose_user_count_query, compose_user_query, UserFilter,
};
use shared::types::PaginationMeta;
use shared::validation::{validate_email, validate_phone_number, ValidationErrors};

const USER_RETURNING: &str = "id, name, email, phone_number, role, is_verified, created_at";

/// bcrypt ignores everything past 72 bytes
const MAX_PASSWORD_BYTES: usize = 72;
const MIN_PASSWORD_CHARS: usize = 8;

/// User service
#[derive(Clone)]
pub struct UserService {
    db: PgPool,
    query_timeout: Duration,
}

/// Input for creating a user
#[derive(Debug, Deserialize)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone_number: String,
    pub role: Role,
}

/// Input for updating a user; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub role: Option<Role>,
}

/// A page of users plus its metadata
#[derive(Debug, Serialize)]
pub struct UserPage {
    pub metadata: PaginationMeta,
    pub users: Vec<User>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    #[sqlx(default)]
    pub total_count: i64,
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub role: String,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|e| AppError::RowDecode(format!("user {}: {}", row.id, e)))?;

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            phone_number: row.phone_number,
            role,
            is_verified: row.is_verified,
            created_at: row.created_at,
        })
    }
}

fn check_password(password: &str, errors: &mut ValidationErrors) {
    errors.check(
        password.chars().count() >= MIN_PASSWORD_CHARS,
        "password",
        format!("must be at least {} characters long", MIN_PASSWORD_CHARS),
    );
    errors.check(
        password.len() <= MAX_PASSWORD_BYTES,
        "password",
        format!("must not be more than {} bytes long", MAX_PASSWORD_BYTES),
    );
}

impl CreateUserInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check(!self.name.trim().is_empty(), "name", "must be provided");
        if let Err(msg) = validate_email(self.email.trim()) {
            errors.add("email", msg);
        }
        if let Err(msg) = validate_phone_number(&self.phone_number) {
            errors.add("phone_number", msg);
        }
        check_password(&self.password, &mut errors);
        errors.into_result(())
    }
}

impl UpdateUserInput {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(name) = &self.name {
            errors.check(!name.trim().is_empty(), "name", "must be provided");
        }
        if let Some(Err(msg)) = self.email.as_deref().map(str::trim).map(validate_email) {
            errors.add("email", msg);
        }
        if let Some(Err(msg)) = self.phone_number.as_deref().map(validate_phone_number) {
            errors.add("phone_number", msg);
        }
        if let Some(password) = &self.password {
            check_password(password, &mut errors);
        }
        errors.into_result(())
    }
}

/// Unique email or phone number becomes a conflict naming the field
fn map_write_error(err: sqlx::Error) -> AppError {
    if let Some(db) = err.as_database_error() {
        if db.code().as_deref() == Some("23505") {
            let field = match db.constraint() {
                Some("users_email_key") => Some("email"),
                Some("users_phone_number_key") => Some("phone number"),
                _ => None,
            };
            if let Some(field) = field {
                return AppError::Conflict(format!("A user with this {} already exists", field));
            }
        }
        if db.code().as_deref() == Some("23503") {
            return AppError::Conflict("User still owns shops".to_string());
        }
    }
    AppError::DatabaseError(err)
}

fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

impl UserService {
    pub fn new(db: PgPool, query_timeout: Duration) -> Self {
        Self { db, query_timeout }
    }

    /// List users matching `filter`, with the same paging as shop discovery
    pub async fn list_users(&self, filter: &UserFilter) -> AppResult<UserPage> {
        let query = compose_user_query(filter)?;
        let rows = bind_args(sqlx::query_as::<_, UserRow>(query.sql()), query.args());
        let rows = tokio::time::timeout(self.query_timeout, rows.fetch_all(&self.db))
            .await
            .map_err(|_| AppError::QueryTimeout)??;

        let mut total = rows
            .first()
            .map(|row| u64::try_from(row.total_count).unwrap_or(0))
            .unwrap_or(0);
        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        if users.is_empty() && filter.page > 1 {
            let query = compose_user_count_query(filter)?;
            let count = bind_args(sqlx::query_as::<_, (i64,)>(query.sql()), query.args());
            let (count,) = tokio::time::timeout(self.query_timeout, count.fetch_one(&self.db))
                .await
                .map_err(|_| AppError::QueryTimeout)??;
            total = u64::try_from(count).unwrap_or(0);
        }

        Ok(UserPage {
            metadata: calculate_metadata(total, filter.page, filter.page_size),
            users,
        })
    }

    pub async fn get_user(&self, user_id: i64) -> AppResult<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_RETURNING} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        User::try_from(row)
    }

    /// Create a user with a bcrypt-hashed password
    pub async fn create_user(&self, input: CreateUserInput) -> AppResult<User> {
        input.validate()?;
        let password_hash = hash_password(&input.password)?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (name, email, password_hash, phone_number, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_RETURNING}
            "#
        ))
        .bind(input.name.trim())
        .bind(input.email.trim())
        .bind(&password_hash)
        .bind(&input.phone_number)
        .bind(input.role.as_str())
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;

        tracing::info!(user_id = row.id, role = %input.role, "User created");
        User::try_from(row)
    }

    /// Update a user; a new password is hashed before it is stored
    pub async fn update_user(&self, user_id: i64, input: UpdateUserInput) -> AppResult<User> {
        input.validate()?;
        let password_hash = input.password.as_deref().map(hash_password).transpose()?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                phone_number = COALESCE($5, phone_number),
                role = COALESCE($6, role)
            WHERE id = $1
            RETURNING {USER_RETURNING}
            "#
        ))
        .bind(user_id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.email.as_deref().map(str::trim))
        .bind(&password_hash)
        .bind(&input.phone_number)
        .bind(input.role.map(|role| role.as_str()))
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?
        .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        User::try_from(row)
    }

    /// Create the configured ADMIN when no user exists yet.
    ///
    /// Returns the new user, or `None` when the table already had rows.
    pub async fn ensure_admin(&self, admin: &BootstrapAdminConfig) -> AppResult<Option<User>> {
        let (exists,) = sqlx::query_as::<_, (bool,)>("SELECT EXISTS (SELECT 1 FROM users)")
            .fetch_one(&self.db)
            .await?;
        if exists {
            return Ok(None);
        }

        let user = self
            .create_user(CreateUserInput {
                name: admin.name.clone(),
                email: admin.email.clone(),
                password: admin.password.clone(),
                phone_number: admin.phone_number.clone(),
                role: Role::Admin,
            })
            .await?;
        Ok(Some(user))
    }

    pub async fn delete_user(&self, user_id: i64) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User".to_string()));
        }

        tracing::info!(user_id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CreateUserInput {
        CreateUserInput {
            name: "Sara Bekele".to_string(),
            email: "sara@shops.et".to_string(),
            password: "correct horse".to_string(),
            phone_number: "0712345678".to_string(),
            role: Role::Operator,
        }
    }

    fn row(role: &str) -> UserRow {
        UserRow {
            total_count: 1,
            id: 9,
            name: "Sara Bekele".to_string(),
            email: "sara@shops.et".to_string(),
            phone_number: "0712345678".to_string(),
            role: role.to_string(),
            is_verified: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_valid_create_input() {
        assert_eq!(input().validate(), Ok(()));
    }

    #[test]
    fn test_create_input_reports_every_field() {
        let errors = CreateUserInput {
            name: " ".to_string(),
            email: "sara".to_string(),
            password: "short".to_string(),
            phone_number: "0112345678".to_string(),
            role: Role::Sales,
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("password"), Some("must be at least 8 characters long"));
        for field in ["name", "email", "phone_number"] {
            assert!(errors.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_password_over_bcrypt_limit_is_rejected() {
        let errors = CreateUserInput {
            password: "x".repeat(73),
            ..input()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.get("password"), Some("must not be more than 72 bytes long"));
    }

    #[test]
    fn test_update_input_checks_only_present_fields() {
        assert_eq!(UpdateUserInput::default().validate(), Ok(()));

        let errors = UpdateUserInput {
            phone_number: Some("12345".to_string()),
            role: Some(Role::Admin),
            ..UpdateUserInput::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.get("phone_number").is_some());
    }

    #[test]
    fn test_stored_password_is_a_bcrypt_hash() {
        let stored = hash_password("correct horse").unwrap();
        assert_ne!(stored, "correct horse");
        assert!(bcrypt::verify("correct horse", &stored).unwrap());
        assert!(!bcrypt::verify("wrong horse", &stored).unwrap());
    }

    #[test]
    fn test_row_decodes_role() {
        let user = User::try_from(row("SALES")).unwrap();
        assert_eq!(user.role, Role::Sales);
        assert_eq!(user.id, 9);

        assert!(matches!(
            User::try_from(row("OWNER")),
            Err(AppError::RowDecode(_))
        ));
    }
}
