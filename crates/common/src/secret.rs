//! Secret types for credentials that must never reach a log line.
//!
//! Re-exports [`secrecy`] so request DTOs can hold passwords and refresh
//! tokens without risking `{:?}` or `tracing` leaking them. `SecretString`
//! prints as `[REDACTED]` and is zeroized on drop.
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct LoginRequest {
//!     email: String,
//!     password: SecretString,
//! }
//!
//! let req = LoginRequest {
//!     email: "a@b.com".to_string(),
//!     password: SecretString::from("p"),
//! };
//!
//! assert!(!format!("{req:?}").contains("\"p\""));
//! assert_eq!(req.password.expose_secret(), "p");
//! ```
//!
//! Wrap in `SecretString`: user passwords, refresh tokens arriving in request
//! bodies, PEM private key material read from disk.

pub use secrecy::{ExposeSecret, SecretBox, SecretString};
