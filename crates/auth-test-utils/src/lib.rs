//! # Auth Test Utilities
//!
//! Shared test utilities for the auth service.
//!
//! This crate provides:
//! - Fixed RSA fixtures (the bundled dev key and a foreign key pair)
//! - Hand-built tokens with arbitrary claims (TestTokenBuilder)
//! - Server test harness (TestAuthServer for E2E tests)
//! - Fixed test identities
//! - Custom assertions (TokenAssertions trait)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<(), anyhow::Error> {
//!     let server = TestAuthServer::spawn().await?;
//!     let alice = server.create_user(TEST_EMAIL_ALICE, TEST_PASSWORD, Role::User).await?;
//!
//!     let token = TestTokenBuilder::for_principal(&alice).sign_with_foreign_key();
//!     token.assert_valid_jwt().assert_signed_by(TEST_FOREIGN_KEY_ID);
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod server_harness;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use server_harness::*;
pub use test_ids::*;
pub use token_builders::*;
