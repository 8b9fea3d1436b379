//! Authentication service for login and refresh token rotation

use bcrypt::verify;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::Role;
use crate::services::token::{AuthTokens, TokenService};

const ROTATE_REFRESH_TOKEN: &str = r#"
    UPDATE users
    SET refresh_token = $1, refresh_token_expires_at = $2
    WHERE refresh_token = $3 AND refresh_token_expires_at > NOW()
    RETURNING id, role
"#;

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    tokens: TokenService,
}

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh_token: String,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    password_hash: String,
    role: String,
}

impl UserRow {
    fn role(&self) -> AppResult<Role> {
        self.role
            .parse()
            .map_err(|e| AppError::RowDecode(format!("user {}: {}", self.id, e)))
    }
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, tokens: TokenService) -> Self {
        Self { db, tokens }
    }

    /// Authenticate user with email and password
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthTokens> {
        let user = sqlx::query_as::<_, UserRow>(
            "SELECT id, password_hash, role FROM users WHERE email = $1",
        )
        .bind(input.email.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        let valid = verify(&input.password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        let tokens = self.tokens.issue_pair(user.id, user.role()?)?;
        self.store_refresh_token(user.id, &tokens.refresh_token).await?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(tokens)
    }

    /// Exchange a refresh token for a new pair; the old one stops working.
    ///
    /// Lookup and rotation happen in one UPDATE, so a token is exchanged at
    /// most once.
    pub async fn refresh(&self, input: RefreshInput) -> AppResult<AuthTokens> {
        let refresh_token = TokenService::new_refresh_token();

        let (user_id, role) = sqlx::query_as::<_, (i64, String)>(ROTATE_REFRESH_TOKEN)
            .bind(&refresh_token)
            .bind(self.tokens.refresh_expires_at())
            .bind(&input.refresh_token)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::InvalidToken)?;

        let role = role
            .parse::<Role>()
            .map_err(|e| AppError::RowDecode(format!("user {}: {}", user_id, e)))?;

        tracing::debug!(user_id, "Refresh token rotated");
        self.tokens.pair(user_id, role, refresh_token)
    }

    /// Store refresh token on the user row
    async fn store_refresh_token(&self, user_id: i64, token: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE users SET refresh_token = $1, refresh_token_expires_at = $2 WHERE id = $3",
        )
        .bind(token)
        .bind(self.tokens.refresh_expires_at())
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::discovery::placeholder_indices;

    #[test]
    fn test_rotation_is_a_single_conditional_update() {
        let sql = ROTATE_REFRESH_TOKEN.trim();
        assert!(sql.starts_with("UPDATE users"));
        assert!(!sql.contains("SELECT"));
        assert!(sql.contains("WHERE refresh_token = $3 AND refresh_token_expires_at > NOW()"));
        assert!(sql.ends_with("RETURNING id, role"));
        assert_eq!(placeholder_indices(sql).len(), 3);
    }
}
