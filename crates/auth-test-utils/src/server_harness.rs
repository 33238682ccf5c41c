//! Test server harness for E2E testing
//!
//! Provides TestAuthServer for spawning real auth-service instances in tests.
//! Each server gets its own in-memory user store and a random port.

use crate::test_ids::TEST_BCRYPT_COST;
use auth_service::config::Config;
use auth_service::crypto::KeyStore;
use auth_service::models::{normalize_email, NewUser, Principal, Role};
use auth_service::observability::metrics::init_metrics_recorder;
use auth_service::repositories::{InMemoryUserStore, UserStore};
use auth_service::routes::{self, AppState};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the auth service in E2E tests
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_login_e2e() -> Result<(), anyhow::Error> {
///     let server = TestAuthServer::spawn().await?;
///     server.create_user("a@b.com", "password", Role::User).await?;
///
///     let response = reqwest::Client::new()
///         .post(format!("{}/api/auth/login", server.url()))
///         .json(&serde_json::json!({"email": "a@b.com", "password": "password"}))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestAuthServer {
    addr: SocketAddr,
    store: Arc<InMemoryUserStore>,
    keys: Arc<KeyStore>,
    config: Config,
    handle: JoinHandle<()>,
}

impl TestAuthServer {
    /// Spawn a server with default configuration and the bundled key pair.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        Self::spawn_with_env(&[]).await
    }

    /// Spawn a server with configuration overrides given as environment
    /// variable pairs, e.g. `[("JWT_ISSUER", "https://auth.example.com")]`.
    ///
    /// `BIND_ADDRESS` is always `127.0.0.1:0`.
    pub async fn spawn_with_env(vars: &[(&str, &str)]) -> Result<Self, anyhow::Error> {
        let mut vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string());
        vars.remove("DATABASE_URL");

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Invalid test configuration: {}", e))?;

        let keys = KeyStore::load(&config.key_source, &config.key_id)
            .map_err(|e| anyhow::anyhow!("Failed to load test key pair: {}", e))?;
        let keys = Arc::new(keys);

        let store = Arc::new(InMemoryUserStore::new());
        let state = Arc::new(AppState::new(
            config.clone(),
            Arc::clone(&keys),
            store.clone(),
        ));

        // The global recorder can only be installed once per test process.
        let metrics_handle = match init_metrics_recorder() {
            Ok(handle) => handle,
            Err(_) => {
                use metrics_exporter_prometheus::PrometheusBuilder;
                PrometheusBuilder::new().build_recorder().handle()
            }
        };

        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            store,
            keys,
            config,
            handle,
        })
    }

    /// Get the base URL of the test server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The key pair the server signs with.
    pub fn keys(&self) -> &KeyStore {
        &self.keys
    }

    /// Direct access to the server's principal store.
    pub fn store(&self) -> &InMemoryUserStore {
        &self.store
    }

    /// Insert a principal with a fast bcrypt hash of `password`.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Principal, anyhow::Error> {
        let password_hash = bcrypt::hash(password, TEST_BCRYPT_COST)?;
        let user = self
            .store
            .create_user(NewUser {
                email: normalize_email(email),
                password_hash,
                role,
            })
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create test user: {}", e))?;

        Ok(user.principal())
    }

    /// The refresh token currently persisted for `user_id`.
    pub async fn stored_refresh_token(&self, user_id: i64) -> Result<Option<String>, anyhow::Error> {
        let user = self
            .store
            .find_by_id(user_id)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read test user: {}", e))?;
        Ok(user.and_then(|u| u.refresh_token))
    }
}

impl Drop for TestAuthServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
