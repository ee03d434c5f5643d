//! Long-lived API keys for the browser-extension integration.
//!
//! Keys are random and shown to the user once. Only their SHA-256 digest is
//! stored, and lookups compare digests in constant time.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use quiver_store::{Store, model::account::Account};

use crate::error::ServiceResult;

const API_KEY_PREFIX: &str = "qk_";
const API_KEY_BYTES: usize = 32;

/// A freshly generated API key and the digest to store for it.
pub struct IssuedApiKey {
    pub key: String,
    pub digest: String,
}

impl std::fmt::Debug for IssuedApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedApiKey")
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

/// ## Summary
/// Generates a new random API key.
#[must_use]
pub fn generate_api_key() -> IssuedApiKey {
    let mut bytes = [0_u8; API_KEY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let key = format!("{API_KEY_PREFIX}{}", hex::encode(bytes));
    let digest = digest_api_key(&key);
    IssuedApiKey { key, digest }
}

/// ## Summary
/// Returns the hex SHA-256 digest under which a key is stored.
#[must_use]
pub fn digest_api_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// ## Summary
/// Finds the account bound to an API key.
///
/// Every stored digest is compared so the time taken does not depend on
/// which account, if any, matches.
///
/// ## Errors
/// Returns an error if the account store cannot be read.
pub fn find_account_by_api_key(store: &dyn Store, key: &str) -> ServiceResult<Option<Account>> {
    let digest = digest_api_key(key);
    let mut found = None;

    for account in store.accounts()? {
        let Some(stored) = account.api_key_digest.as_deref() else {
            continue;
        };
        if bool::from(stored.as_bytes().ct_eq(digest.as_bytes())) && found.is_none() {
            found = Some(account);
        }
    }

    Ok(found)
}
