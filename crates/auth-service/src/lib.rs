//! Auth Service Library
//!
//! Issues RS256 access and refresh tokens, rotates refresh tokens against a
//! single persisted slot per principal, gates every request on a verified
//! bearer token, and publishes the verification key as JWKS.
//!
//! # Modules
//!
//! - `config` - Service configuration
//! - `crypto` - Key pair, JWT signing and verification, password hashing
//! - `errors` - Error types and their HTTP mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Request gateway and HTTP metrics
//! - `models` - Data models and wire DTOs
//! - `observability` - Metrics and log helpers
//! - `repositories` - Principal store (Postgres or in-memory)
//! - `routes` - Router and application state
//! - `services` - Token issuing, verification, sessions, discovery

pub mod config;
pub mod crypto;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod routes;
pub mod services;
