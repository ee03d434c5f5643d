//! Argon2 password hashing for account and space passwords.

use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier as _,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use tokio::sync::Semaphore;

use crate::error::{ServiceError, ServiceResult};

/// Well-formed digest with the default Argon2id parameters that no password
/// matches. Checked on login for unknown usernames so they cost the same
/// hashing work as known ones.
const UNKNOWN_ACCOUNT_DIGEST: &str = "$argon2id$v=19$m=19456,t=2,p=1$VPyalhLfoehLdWkreTTrgA$uYocEL7yxkCSf7L8m65IQiFktGSVcpT4u+fAvGV634Q";

/// ## Summary
/// Hashes a password using Argon2id with a random salt.
///
/// ## Errors
/// Returns `ValidationError` for an empty password, or `Internal` if hashing fails.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    if password.is_empty() {
        return Err(ServiceError::ValidationError(
            "Password must not be empty".to_string(),
        ));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {e}")))?;

    Ok(password_hash.to_string())
}

/// ## Summary
/// Verifies a password against a stored Argon2 hash.
///
/// A mismatch is an ordinary `Ok(false)`; the digest comparison is constant-time.
///
/// ## Errors
/// Returns `Internal` if the stored hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> ServiceResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| ServiceError::Internal(format!("Invalid password hash: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => {
            tracing::trace!("Password verification failed");
            Ok(false)
        }
        Err(e) => Err(ServiceError::Internal(format!(
            "Password verification error: {e}"
        ))),
    }
}

/// Password policy plus a bounded pool for the deliberately slow hashing work.
///
/// Hashing and verification run on tokio's blocking threads; at most
/// `workers` jobs run at once so a burst of logins cannot occupy every
/// blocking thread.
#[derive(Debug, Clone)]
pub struct PasswordVerifier {
    min_length: usize,
    permits: Arc<Semaphore>,
}

impl PasswordVerifier {
    #[must_use]
    pub fn new(min_length: usize, workers: usize) -> Self {
        Self {
            min_length,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    #[must_use]
    pub const fn min_length(&self) -> usize {
        self.min_length
    }

    /// ## Summary
    /// Checks a new password against the length policy.
    ///
    /// ## Errors
    /// Returns `ValidationError` if the password is empty or too short.
    pub fn validate(&self, plaintext: &str) -> ServiceResult<()> {
        if plaintext.is_empty() {
            return Err(ServiceError::ValidationError(
                "Password must not be empty".to_string(),
            ));
        }
        if plaintext.chars().count() < self.min_length {
            return Err(ServiceError::ValidationError(format!(
                "Password must be at least {} characters",
                self.min_length
            )));
        }
        Ok(())
    }

    /// ## Summary
    /// Validates and hashes a new password off the async executor.
    ///
    /// ## Errors
    /// Returns `ValidationError` on a policy violation, `Internal` if hashing fails.
    pub async fn hash(&self, plaintext: &str) -> ServiceResult<String> {
        self.validate(plaintext)?;
        let plaintext = plaintext.to_string();
        self.run_blocking(move || hash_password(&plaintext)).await
    }

    /// ## Summary
    /// Verifies a password against a digest off the async executor.
    ///
    /// ## Errors
    /// Returns `Internal` if the digest is malformed or the worker fails.
    pub async fn verify(&self, plaintext: &str, digest: &str) -> ServiceResult<bool> {
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();
        self.run_blocking(move || verify_password(&plaintext, &digest))
            .await
    }

    /// ## Summary
    /// Spends one verification's worth of work for a login naming no account.
    ///
    /// ## Errors
    /// Returns `Internal` if the worker fails.
    pub async fn verify_unknown_account(&self, plaintext: &str) -> ServiceResult<()> {
        self.verify(plaintext, UNKNOWN_ACCOUNT_DIGEST).await.map(drop)
    }

    async fn run_blocking<T, F>(&self, job: F) -> ServiceResult<T>
    where
        F: FnOnce() -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ServiceError::Internal(format!("Password worker pool closed: {e}")))?;

        tokio::task::spawn_blocking(job)
            .await
            .map_err(|e| ServiceError::Internal(format!("Password worker failed: {e}")))?
    }
}
