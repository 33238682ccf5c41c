//! In-memory user store for local development and tests.
//!
//! All operations take one async mutex, so the refresh-token compare-and-swap
//! is atomic in the same sense as the conditional UPDATE in Postgres.

use super::UserStore;
use crate::errors::AuthError;
use crate::models::{normalize_email, NewUser, User};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: HashMap<i64, User>,
}

#[derive(Default)]
pub struct InMemoryUserStore {
    inner: Mutex<Inner>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let email = normalize_email(email);
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, AuthError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&user_id).cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let email = normalize_email(&new_user.email);
        let mut inner = self.inner.lock().await;

        if inner.users.values().any(|u| u.email == email) {
            return Err(AuthError::InvalidRequest(
                "Email is already registered".to_string(),
            ));
        }

        inner.next_id += 1;
        let user = User {
            user_id: inner.next_id,
            email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            refresh_token: None,
        };
        inner.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, AuthError> {
        let mut inner = self.inner.lock().await;
        Ok(inner.users.remove(&user_id).is_some())
    }

    async fn store_refresh_token(
        &self,
        user_id: i64,
        refresh_token: Option<&str>,
    ) -> Result<bool, AuthError> {
        let mut inner = self.inner.lock().await;
        match inner.users.get_mut(&user_id) {
            Some(user) => {
                user.refresh_token = refresh_token.map(ToString::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rotate_refresh_token(
        &self,
        user_id: i64,
        presented: &str,
        replacement: &str,
    ) -> Result<bool, AuthError> {
        let mut inner = self.inner.lock().await;
        match inner.users.get_mut(&user_id) {
            Some(user) if user.refresh_token.as_deref() == Some(presented) => {
                user.refresh_token = Some(replacement.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
