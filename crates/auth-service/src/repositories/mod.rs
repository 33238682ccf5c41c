//! Principal storage.
//!
//! [`UserStore`] is the only seam between the token lifecycle and persistence.
//! The refresh-token slot is a single column per user; rotation is a
//! compare-and-swap on that column so two concurrent refreshes presenting the
//! same token cannot both win.

pub mod memory;
pub mod users;

pub use memory::InMemoryUserStore;
pub use users::PgUserStore;

use crate::errors::AuthError;
use crate::models::{NewUser, User};
use async_trait::async_trait;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up a user by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>, AuthError>;

    /// Insert a user. Fails with `InvalidRequest` if the email is taken.
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError>;

    /// Returns `false` when no such user existed.
    async fn delete_user(&self, user_id: i64) -> Result<bool, AuthError>;

    /// Unconditionally overwrite the refresh-token slot. `None` clears it.
    ///
    /// Returns `false` when no such user existed.
    async fn store_refresh_token(
        &self,
        user_id: i64,
        refresh_token: Option<&str>,
    ) -> Result<bool, AuthError>;

    /// Replace the slot with `replacement` only if it currently holds `presented`.
    ///
    /// Returns `true` if the swap happened.
    async fn rotate_refresh_token(
        &self,
        user_id: i64,
        presented: &str,
        replacement: &str,
    ) -> Result<bool, AuthError>;
}
