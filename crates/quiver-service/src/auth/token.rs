//! Stateless bearer tokens.
//!
//! A token is `base64url(claims).base64url(HMAC-SHA256(claims))`. Every token
//! is signed with the single process-wide key held by [`TokenService`]; there
//! is no server-side session state and therefore no revocation.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{AuthFailure, ServiceError, ServiceResult};

type HmacSha256 = Hmac<Sha256>;

const GENERATED_SECRET_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: uuid::Uuid,
    iat: i64,
    exp: i64,
}

/// Issues and verifies signed, time-bounded bearer tokens.
pub struct TokenService {
    key: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// ## Summary
    /// Creates a token service signing with `secret`.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the secret is empty or the TTL is not positive
    /// or reaches past the last representable date.
    pub fn new(secret: &[u8], ttl: std::time::Duration) -> ServiceResult<Self> {
        if secret.is_empty() {
            return Err(ServiceError::InvalidConfiguration(
                "Token signing secret must not be empty".to_string(),
            ));
        }

        let ttl = Duration::from_std(ttl)
            .ok()
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or_else(|| {
                ServiceError::InvalidConfiguration("Token TTL must be positive".to_string())
            })?;
        if Utc::now().checked_add_signed(ttl).is_none() {
            return Err(ServiceError::InvalidConfiguration(
                "Token TTL exceeds the representable date range".to_string(),
            ));
        }

        Ok(Self {
            key: secret.to_vec(),
            ttl,
        })
    }

    /// ## Summary
    /// Builds the service from configuration, generating a random key when none is set.
    ///
    /// ## Errors
    /// Returns `InvalidConfiguration` if the configured secret or TTL is unusable.
    pub fn from_config(config: &quiver_core::config::AuthConfig) -> ServiceResult<Self> {
        if let Some(secret) = &config.token_secret {
            return Self::new(secret.as_bytes(), config.token_ttl());
        }

        tracing::warn!(
            "No token signing secret configured; using a random key. Tokens will not survive a restart"
        );
        let mut secret = [0_u8; GENERATED_SECRET_LEN];
        OsRng.fill_bytes(&mut secret);
        Self::new(&secret, config.token_ttl())
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// ## Summary
    /// Issues a token for `user_id` valid for the configured TTL from now.
    ///
    /// ## Errors
    /// Returns `Internal` if the claims cannot be encoded.
    pub fn issue(&self, user_id: uuid::Uuid) -> ServiceResult<String> {
        self.issue_at(user_id, Utc::now())
    }

    /// ## Summary
    /// Issues a token as if the current time were `now`.
    ///
    /// ## Errors
    /// Returns `Internal` if the expiry overflows or the claims cannot be encoded.
    pub fn issue_at(&self, user_id: uuid::Uuid, now: DateTime<Utc>) -> ServiceResult<String> {
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            ServiceError::Internal(format!("Token expiry overflows from {now}"))
        })?;
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let payload = serde_json::to_vec(&claims)
            .map_err(|e| ServiceError::Internal(format!("Failed to encode token claims: {e}")))?;
        let payload = URL_SAFE_NO_PAD.encode(payload);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(payload.as_bytes())?.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// ## Summary
    /// Verifies a token and returns the user it was issued to.
    ///
    /// ## Errors
    /// Returns `NotAuthenticated` if the token is malformed, forged or expired.
    pub fn verify(&self, token: &str) -> ServiceResult<uuid::Uuid> {
        self.verify_at(token, Utc::now())
    }

    /// ## Summary
    /// Verifies a token as if the current time were `now`.
    ///
    /// ## Errors
    /// Returns `NotAuthenticated` if the token is malformed, forged or expired.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<uuid::Uuid> {
        let (payload, signature) = token
            .split_once('.')
            .ok_or(ServiceError::NotAuthenticated(AuthFailure::Malformed))?;

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_e| ServiceError::NotAuthenticated(AuthFailure::Malformed))?;

        self.mac(payload.as_bytes())?
            .verify_slice(&signature)
            .map_err(|_e| ServiceError::NotAuthenticated(AuthFailure::BadSignature))?;

        // Only signed payloads reach the decoder.
        let claims: Claims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(ServiceError::NotAuthenticated(AuthFailure::Malformed))?;

        if now.timestamp() >= claims.exp {
            return Err(ServiceError::NotAuthenticated(AuthFailure::Expired));
        }

        Ok(claims.sub)
    }

    fn mac(&self, payload: &[u8]) -> ServiceResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| ServiceError::Internal(format!("Invalid token signing key: {e}")))?;
        mac.update(payload);
        Ok(mac)
    }
}
