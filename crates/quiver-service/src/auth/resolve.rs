//! Maps request credential material to a [`Principal`].

use std::sync::Arc;

use quiver_store::{Store, model::account::Account};

use crate::{
    auth::{api_key::find_account_by_api_key, principal::Principal, token::TokenService},
    error::{AuthFailure, ServiceError, ServiceResult},
};

/// Credential material extracted from a request.
#[derive(Default, Clone, Copy)]
pub struct Credentials<'a> {
    pub bearer: Option<&'a str>,
    pub api_key: Option<&'a str>,
}

impl std::fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("bearer", &self.bearer.is_some())
            .field("api_key", &self.api_key.is_some())
            .finish()
    }
}

/// Resolves requests to principals.
///
/// Resolution order: API key, then bearer token, then anonymous. A bad
/// credential is never an error here; it resolves to `Anonymous` and the
/// endpoint decides whether that is acceptable.
#[derive(Debug, Clone)]
pub struct AuthResolver {
    tokens: Arc<TokenService>,
    public_owner: Option<String>,
}

impl AuthResolver {
    #[must_use]
    pub const fn new(tokens: Arc<TokenService>, public_owner: Option<String>) -> Self {
        Self {
            tokens,
            public_owner,
        }
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// ## Summary
    /// Resolves the principal for a request.
    ///
    /// ## Errors
    /// Returns an error only if the account store cannot be read.
    #[tracing::instrument(skip(self, store))]
    pub fn resolve(
        &self,
        credentials: &Credentials<'_>,
        store: &dyn Store,
    ) -> ServiceResult<Principal> {
        if let Some(key) = credentials.api_key {
            match find_account_by_api_key(store, key)? {
                Some(account) => {
                    tracing::debug!(user_id = %account.id, "Resolved principal from API key");
                    return Ok(Self::principal_for(&account));
                }
                None => tracing::debug!("API key did not match any account"),
            }
        }

        if let Some(token) = credentials.bearer {
            match self.tokens.verify(token) {
                Ok(user_id) => {
                    if let Some(account) = store.account_by_id(user_id)? {
                        tracing::debug!(user_id = %account.id, "Resolved principal from bearer token");
                        return Ok(Self::principal_for(&account));
                    }
                    tracing::debug!(%user_id, "Bearer token subject no longer exists");
                }
                Err(ServiceError::NotAuthenticated(reason)) => {
                    tracing::debug!(%reason, "Bearer token rejected");
                }
                Err(e) => return Err(e),
            }
        }

        self.anonymous(store)
    }

    fn anonymous(&self, store: &dyn Store) -> ServiceResult<Principal> {
        let Some(username) = self.public_owner.as_deref() else {
            return Ok(Principal::Anonymous(None));
        };

        let public_owner = store.account_by_username(username)?.map(|a| a.id);
        if public_owner.is_none() {
            tracing::debug!(%username, "Configured public owner does not exist");
        }
        Ok(Principal::Anonymous(public_owner))
    }

    fn principal_for(account: &Account) -> Principal {
        if account.is_admin() {
            Principal::Admin(account.id)
        } else {
            Principal::Owner(account.id)
        }
    }
}

/// ## Summary
/// Extracts the token from an `Authorization: Bearer <token>` header value.
///
/// ## Errors
/// Returns `NotAuthenticated` if the value is not a bearer credential.
pub fn parse_bearer(header: &str) -> ServiceResult<&str> {
    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(ServiceError::NotAuthenticated(AuthFailure::Malformed))?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ServiceError::NotAuthenticated(AuthFailure::Malformed));
    }
    Ok(token)
}
