use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role assigned once, when the account is created.
///
/// The first account created in an installation becomes the administrator;
/// every later account is a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored user account. Secrets are never serialized.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: uuid::Uuid,
    pub username: String,
    /// PHC-format Argon2 digest.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    /// Hex SHA-256 digest of the account's API key, if one was issued.
    #[serde(skip_serializing)]
    pub api_key_digest: Option<String>,
}

impl Account {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .field("has_api_key", &self.api_key_digest.is_some())
            .finish_non_exhaustive()
    }
}

/// Values needed to insert an account. The store assigns id, role and timestamp.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub password_hash: String,
}
