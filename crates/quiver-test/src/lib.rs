//! Quiver bookmark server - integration test support.
//!
//! Builds isolated server instances: every [`TestServer`] owns a fresh
//! account store and a fresh version key store.

use std::sync::Arc;

use salvo::Service;

use quiver_core::{
    config::{AuthConfig, LoggingConfig, ServerConfig, Settings},
    constants::DEFAULT_CATEGORIES,
};
use quiver_service::{auth::AuthServices, version::VersionKeyStore};
use quiver_store::{MemoryStore, Store};

/// Signing secret shared by every test server.
pub const TEST_TOKEN_SECRET: &str = "quiver-integration-test-secret";

/// Test configuration - static struct instead of loading from file.
#[must_use]
pub fn test_config(public_owner: Option<&str>) -> Settings {
    Settings {
        auth: AuthConfig {
            token_secret: Some(TEST_TOKEN_SECRET.to_string()),
            token_ttl_secs: quiver_core::config::DEFAULT_TOKEN_TTL_SECS,
            public_owner: public_owner.map(str::to_string),
            min_password_length: quiver_core::config::DEFAULT_MIN_PASSWORD_LENGTH,
            hash_workers: 2,
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8787,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
        },
    }
}

/// An isolated server plus handles to the state behind it.
pub struct TestServer {
    pub service: Service,
    pub store: Arc<MemoryStore>,
    pub versions: Arc<VersionKeyStore>,
    pub auth: Arc<AuthServices>,
}

impl TestServer {
    /// ## Summary
    /// Builds a server from the given settings.
    ///
    /// ## Errors
    /// Returns an error if the auth services reject the configuration.
    pub fn from_settings(settings: Settings) -> anyhow::Result<Self> {
        let store = Arc::new(MemoryStore::new());
        let versions = Arc::new(VersionKeyStore::new().with_categories(DEFAULT_CATEGORIES));
        let auth = Arc::new(AuthServices::from_config(&settings.auth)?);

        let shared_store: Arc<dyn Store> = store.clone();
        let router = quiver_app::app::router(
            settings,
            shared_store,
            Arc::clone(&auth),
            Arc::clone(&versions),
        );

        Ok(Self {
            service: Service::new(router),
            store,
            versions,
            auth,
        })
    }

    /// ## Errors
    /// Returns an error if the auth services reject the configuration.
    pub fn new() -> anyhow::Result<Self> {
        Self::from_settings(test_config(None))
    }

    /// ## Errors
    /// Returns an error if the auth services reject the configuration.
    pub fn with_public_owner(username: &str) -> anyhow::Result<Self> {
        Self::from_settings(test_config(Some(username)))
    }
}
