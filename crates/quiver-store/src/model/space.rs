use chrono::{DateTime, Utc};
use serde::Serialize;

/// A named container of folders and bookmarks owned by one account.
///
/// `password_hash` must be present exactly when `is_encrypted` is set. Records
/// read back from the store are not trusted to uphold this; see
/// [`Space::has_consistent_protection`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    pub id: uuid::Uuid,
    pub owner_id: uuid::Uuid,
    pub name: String,
    pub is_encrypted: bool,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Space {
    /// Returns `true` if the encryption flag agrees with the presence of a password hash.
    #[must_use]
    pub const fn has_consistent_protection(&self) -> bool {
        self.is_encrypted == self.password_hash.is_some()
    }
}

/// Values needed to insert a space. The space is encrypted iff a hash is supplied.
#[derive(Debug, Clone)]
pub struct NewSpace {
    pub owner_id: uuid::Uuid,
    pub name: String,
    pub password_hash: Option<String>,
}

/// How an update changes a space's password protection.
#[derive(Debug, Clone, Default)]
pub enum ProtectionChange {
    #[default]
    Keep,
    /// Encrypt (or re-key) the space with the given digest.
    Enable(String),
    /// Remove protection and clear the digest.
    Disable,
}

#[derive(Debug, Clone, Default)]
pub struct SpaceUpdate {
    pub name: Option<String>,
    pub protection: ProtectionChange,
}
