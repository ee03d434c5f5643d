//! The access-control services shared by every request.

use std::sync::Arc;

use quiver_core::config::AuthConfig;

use crate::error::ServiceResult;

use super::{
    guard::SpaceAccessGuard, password::PasswordVerifier, resolve::AuthResolver,
    token::TokenService,
};

/// Token service, resolver, guard and password pool built once at startup.
///
/// Everything here is read-only after construction.
#[derive(Debug, Clone)]
pub struct AuthServices {
    pub tokens: Arc<TokenService>,
    pub resolver: AuthResolver,
    pub guard: SpaceAccessGuard,
    pub passwords: PasswordVerifier,
}

impl AuthServices {
    #[must_use]
    pub fn new(
        tokens: TokenService,
        passwords: PasswordVerifier,
        public_owner: Option<String>,
    ) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            resolver: AuthResolver::new(Arc::clone(&tokens), public_owner),
            guard: SpaceAccessGuard::new(passwords.clone()),
            tokens,
            passwords,
        }
    }

    /// ## Summary
    /// Builds the services from the `auth` configuration section.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the signing secret or TTL is unusable.
    pub fn from_config(config: &AuthConfig) -> ServiceResult<Self> {
        let tokens = TokenService::from_config(config)?;
        let passwords = PasswordVerifier::new(config.min_password_length, config.hash_workers);

        tracing::debug!(
            token_ttl_secs = config.token_ttl_secs,
            public_owner = ?config.public_owner,
            min_password_length = config.min_password_length,
            "Auth services configured"
        );

        Ok(Self::new(tokens, passwords, config.public_owner.clone()))
    }
}
