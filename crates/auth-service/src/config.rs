use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default bcrypt cost for stored password hashes.
pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// Lowest bcrypt cost accepted from configuration.
pub const MIN_BCRYPT_COST: u32 = 10;

/// Highest bcrypt cost accepted from configuration.
pub const MAX_BCRYPT_COST: u32 = 14;

/// Access tokens live for 30 minutes.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 30 * 60;

/// Refresh tokens live for 14 days.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;

/// Longest token lifetime accepted from configuration (one year).
pub const MAX_TOKEN_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

pub const DEFAULT_KEY_ID: &str = "auth-key-1";
pub const DEFAULT_ISSUER: &str = "http://localhost:8081/auth";
pub const DEFAULT_AUDIENCE: &str = "backend-services";

/// Paths reachable without a bearer token.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/api/auth/login",
    "/api/auth/refresh",
    "/api/users/signup",
    "/jwks",
    "/.well-known/**",
    "/health",
    "/metrics",
    "/internal/users/**",
];

pub const DEFAULT_CORS_ALLOWED_ORIGINS: &[&str] =
    &["http://localhost:3000", "http://localhost:5173"];

/// Where the signing key pair comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// Development key pair compiled into the binary.
    Bundled,
    /// PEM files on disk (PKCS#8 or PKCS#1 private key, SPKI or PKCS#1 public key).
    Files {
        private_key_path: PathBuf,
        public_key_path: PathBuf,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: String,
    /// `None` selects the in-memory user store.
    pub database_url: Option<String>,
    pub key_source: KeySource,
    pub key_id: String,
    pub issuer: String,
    pub audience: String,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub clock_skew: Duration,
    pub bcrypt_cost: u32,
    pub public_paths: Vec<String>,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing)
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| "0.0.0.0:8081".to_string());

        let database_url = vars
            .get("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .cloned();

        let key_source = match (
            vars.get("JWT_PRIVATE_KEY_PATH"),
            vars.get("JWT_PUBLIC_KEY_PATH"),
        ) {
            (None, None) => KeySource::Bundled,
            (Some(private_key_path), Some(public_key_path)) => KeySource::Files {
                private_key_path: PathBuf::from(private_key_path),
                public_key_path: PathBuf::from(public_key_path),
            },
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar(
                    "JWT_PUBLIC_KEY_PATH".to_string(),
                ))
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar(
                    "JWT_PRIVATE_KEY_PATH".to_string(),
                ))
            }
        };

        let key_id = non_empty(vars, "JWT_KEY_ID", DEFAULT_KEY_ID)?;
        let issuer = non_empty(vars, "JWT_ISSUER", DEFAULT_ISSUER)?;
        let audience = non_empty(vars, "JWT_AUDIENCE", DEFAULT_AUDIENCE)?;

        let access_token_ttl_seconds = positive_seconds(
            vars,
            "ACCESS_TOKEN_TTL_SECONDS",
            DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
        )?;
        let refresh_token_ttl_seconds = positive_seconds(
            vars,
            "REFRESH_TOKEN_TTL_SECONDS",
            DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
        )?;

        let clock_skew = match vars.get("JWT_CLOCK_SKEW_SECONDS") {
            None => DEFAULT_CLOCK_SKEW,
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|e| ConfigError::InvalidValue {
                    name: "JWT_CLOCK_SKEW_SECONDS".to_string(),
                    reason: format!("{e}"),
                })?;
                if secs == 0 || secs > MAX_CLOCK_SKEW.as_secs() {
                    return Err(ConfigError::InvalidValue {
                        name: "JWT_CLOCK_SKEW_SECONDS".to_string(),
                        reason: format!(
                            "must be between 1 and {} seconds, got {secs}",
                            MAX_CLOCK_SKEW.as_secs()
                        ),
                    });
                }
                Duration::from_secs(secs)
            }
        };

        let bcrypt_cost = match vars.get("BCRYPT_COST") {
            None => DEFAULT_BCRYPT_COST,
            Some(raw) => {
                let cost: u32 = raw.parse().map_err(|e| ConfigError::InvalidValue {
                    name: "BCRYPT_COST".to_string(),
                    reason: format!("{e}"),
                })?;
                if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&cost) {
                    return Err(ConfigError::InvalidValue {
                        name: "BCRYPT_COST".to_string(),
                        reason: format!(
                            "must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}, got {cost}"
                        ),
                    });
                }
                cost
            }
        };

        let public_paths = list_or_default(vars, "PUBLIC_PATHS", DEFAULT_PUBLIC_PATHS);
        if let Some(bad) = public_paths.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::InvalidValue {
                name: "PUBLIC_PATHS".to_string(),
                reason: format!("pattern must start with '/': {bad}"),
            });
        }

        let cors_allowed_origins = list_or_default(
            vars,
            "CORS_ALLOWED_ORIGINS",
            DEFAULT_CORS_ALLOWED_ORIGINS,
        );

        Ok(Config {
            bind_address,
            database_url,
            key_source,
            key_id,
            issuer,
            audience,
            access_token_ttl_seconds,
            refresh_token_ttl_seconds,
            clock_skew,
            bcrypt_cost,
            public_paths,
            cors_allowed_origins,
        })
    }
}

fn non_empty(
    vars: &HashMap<String, String>,
    name: &str,
    default: &str,
) -> Result<String, ConfigError> {
    match vars.get(name) {
        None => Ok(default.to_string()),
        Some(v) if v.trim().is_empty() => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must not be empty".to_string(),
        }),
        Some(v) => Ok(v.trim().to_string()),
    }
}

fn positive_seconds(
    vars: &HashMap<String, String>,
    name: &str,
    default: i64,
) -> Result<i64, ConfigError> {
    let Some(raw) = vars.get(name) else {
        return Ok(default);
    };
    let secs: i64 = raw.parse().map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("{e}"),
    })?;
    if secs <= 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("must be positive, got {secs}"),
        });
    }
    if secs > MAX_TOKEN_TTL_SECONDS {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: format!("must be at most {MAX_TOKEN_TTL_SECONDS}, got {secs}"),
        });
    }
    Ok(secs)
}

fn list_or_default(vars: &HashMap<String, String>, name: &str, default: &[&str]) -> Vec<String> {
    match vars.get(name) {
        Some(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        None => default.iter().map(ToString::to_string).collect(),
    }
}
