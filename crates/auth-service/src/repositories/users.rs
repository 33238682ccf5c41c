//! Postgres-backed user store.

use super::UserStore;
use crate::errors::AuthError;
use crate::models::{normalize_email, NewUser, Role, User};
use async_trait::async_trait;
use sqlx::PgPool;
use std::str::FromStr;

/// Row shape of the `users` table.
#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: i64,
    email: String,
    password_hash: String,
    role: String,
    refresh_token: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = AuthError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).map_err(AuthError::Database)?;
        Ok(User {
            user_id: row.user_id,
            email: row.email,
            password_hash: row.password_hash,
            role,
            refresh_token: row.refresh_token,
        })
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, email, password_hash, role, refresh_token
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to fetch user by email: {}", e)))?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT user_id, email, password_hash, role, refresh_token
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to fetch user by id: {}", e)))?;

        row.map(User::try_from).transpose()
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING user_id, email, password_hash, role, refresh_token
            "#,
        )
        .bind(normalize_email(&new_user.email))
        .bind(&new_user.password_hash)
        .bind(new_user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("users_email_unique") {
                AuthError::InvalidRequest("Email is already registered".to_string())
            } else {
                AuthError::Database(format!("Failed to create user: {}", e))
            }
        })?;

        User::try_from(row)
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to delete user: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn store_refresh_token(
        &self,
        user_id: i64,
        refresh_token: Option<&str>,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $2, updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(refresh_token)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to store refresh token: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn rotate_refresh_token(
        &self,
        user_id: i64,
        presented: &str,
        replacement: &str,
    ) -> Result<bool, AuthError> {
        // Single conditional UPDATE: row-level locking makes the second of two
        // concurrent callers re-evaluate the predicate against the new value.
        let result = sqlx::query(
            r#"
            UPDATE users
            SET refresh_token = $3, updated_at = NOW()
            WHERE user_id = $1 AND refresh_token = $2
            "#,
        )
        .bind(user_id)
        .bind(presented)
        .bind(replacement)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to rotate refresh token: {}", e)))?;

        Ok(result.rows_affected() == 1)
    }
}
