use std::time::Duration;

use anyhow::Result;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

/// Seven days, the lifetime of a bearer token unless configured otherwise.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;
pub const DEFAULT_HASH_WORKERS: usize = 4;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign bearer tokens. A random per-process secret is used when unset.
    pub token_secret: Option<String>,
    pub token_ttl_secs: u64,
    /// Username whose unencrypted spaces are readable without credentials.
    pub public_owner: Option<String>,
    pub min_password_length: usize,
    pub hash_workers: usize,
}

impl AuthConfig {
    /// ## Summary
    /// Returns the configured bearer token lifetime.
    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "token_secret",
                &self.token_secret.as_ref().map(|_| "<redacted>"),
            )
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("public_owner", &self.public_owner)
            .field("min_password_length", &self.min_password_length)
            .field("hash_workers", &self.hash_workers)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Settings {
    /// ## Summary
    /// Returns a configuration builder pre-populated with every default value.
    ///
    /// ## Errors
    /// Returns an error if a default cannot be registered.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8787)?
            .set_default("logging.level", "info")?
            .set_default("auth.token_ttl_secs", DEFAULT_TOKEN_TTL_SECS)?
            .set_default(
                "auth.min_password_length",
                u64::try_from(DEFAULT_MIN_PASSWORD_LENGTH)?,
            )?
            .set_default("auth.hash_workers", u64::try_from(DEFAULT_HASH_WORKERS)?)?)
    }

    /// ## Summary
    /// Loads configuration from environment variables (`QUIVER_` prefix, `__` nesting)
    /// and an optional `config.toml`. Environment variables take precedence.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Self::defaults()?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env
            .add_source(
                config::Environment::with_prefix("QUIVER")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
