//! Shared building blocks for the authentication service and its test tooling.

#![warn(clippy::pedantic)]

/// Secret wrappers that keep passwords and tokens out of logs
pub mod secret;

/// JWT helpers (size limits, clock skew, header inspection, JWK integers)
pub mod jwt;
