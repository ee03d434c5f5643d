//! Per-space access decisions.
//!
//! There is no session-level unlock: every read or write of an encrypted
//! space re-verifies the supplied password.

use quiver_store::model::space::Space;

use crate::{
    auth::{password::PasswordVerifier, principal::Principal},
    error::{AuthFailure, ServiceError, ServiceResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// Why access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The space has no password.
    Unprotected,
    /// The owner supplied the correct space password.
    PasswordVerified,
    /// The administrator acted on an encrypted space without its password.
    AdminBypass,
    /// Anonymous read of the public owner's unprotected space.
    PublicRead,
}

/// Why access was refused. Maps onto the client-facing error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Authentication,
    Authorization,
    NotFound,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(Access),
    Deny(Denial),
}

impl Decision {
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow(_))
    }

    /// ## Summary
    /// Converts the decision into a `Result` for `?`-style call sites.
    ///
    /// ## Errors
    /// Returns the service error corresponding to the denial.
    pub fn into_result(self) -> ServiceResult<Access> {
        match self {
            Self::Allow(access) => Ok(access),
            Self::Deny(denial) => Err(denial.into_error()),
        }
    }
}

impl Denial {
    /// Returns the service error that reports this denial to the client.
    #[must_use]
    pub fn into_error(self) -> ServiceError {
        match self {
            Self::Authentication => ServiceError::NotAuthenticated(AuthFailure::Missing),
            Self::Authorization => {
                ServiceError::AuthorizationError("wrong space password".to_string())
            }
            Self::NotFound => ServiceError::NotFound("space".to_string()),
            Self::Internal => {
                ServiceError::InvariantViolation("encrypted space without password hash")
            }
        }
    }
}

/// Decides whether a principal may read or mutate a space.
#[derive(Debug, Clone)]
pub struct SpaceAccessGuard {
    passwords: PasswordVerifier,
}

impl SpaceAccessGuard {
    #[must_use]
    pub const fn new(passwords: PasswordVerifier) -> Self {
        Self { passwords }
    }

    pub async fn authorize_read(
        &self,
        principal: &Principal,
        space: &Space,
        supplied_password: Option<&str>,
    ) -> Decision {
        self.authorize(principal, space, supplied_password, Operation::Read)
            .await
    }

    /// Writes to an encrypted space need its password from the owner too.
    pub async fn authorize_write(
        &self,
        principal: &Principal,
        space: &Space,
        supplied_password: Option<&str>,
    ) -> Decision {
        self.authorize(principal, space, supplied_password, Operation::Write)
            .await
    }

    #[tracing::instrument(skip(self, space, supplied_password), fields(space_id = %space.id))]
    async fn authorize(
        &self,
        principal: &Principal,
        space: &Space,
        supplied_password: Option<&str>,
        operation: Operation,
    ) -> Decision {
        let decision = match principal {
            Principal::Anonymous(public_owner) => {
                if operation == Operation::Write {
                    Decision::Deny(Denial::Authentication)
                } else if *public_owner != Some(space.owner_id) {
                    Decision::Deny(Denial::NotFound)
                } else if !space.has_consistent_protection() {
                    Self::integrity_violation(space)
                } else if space.is_encrypted {
                    Decision::Deny(Denial::Authentication)
                } else {
                    Decision::Allow(Access::PublicRead)
                }
            }
            Principal::Admin(user_id) => {
                if !space.has_consistent_protection() {
                    Self::integrity_violation(space)
                } else if space.is_encrypted {
                    tracing::info!(
                        admin_id = %user_id,
                        owner_id = %space.owner_id,
                        %operation,
                        "Admin bypassing space password"
                    );
                    Decision::Allow(Access::AdminBypass)
                } else {
                    Decision::Allow(Access::Unprotected)
                }
            }
            Principal::Owner(user_id) if *user_id != space.owner_id => {
                Decision::Deny(Denial::NotFound)
            }
            Principal::Owner(_) => self.check_owner(space, supplied_password).await,
        };

        if let Decision::Deny(denial) = decision {
            tracing::debug!(?denial, "Space access denied");
        }
        decision
    }

    async fn check_owner(&self, space: &Space, supplied_password: Option<&str>) -> Decision {
        match (space.is_encrypted, space.password_hash.as_deref()) {
            (false, None) => Decision::Allow(Access::Unprotected),
            (true, Some(digest)) => {
                let Some(password) = supplied_password else {
                    return Decision::Deny(Denial::Authorization);
                };
                match self.passwords.verify(password, digest).await {
                    Ok(true) => Decision::Allow(Access::PasswordVerified),
                    Ok(false) => Decision::Deny(Denial::Authorization),
                    Err(e) => {
                        tracing::error!(error = ?e, space_id = %space.id, "Space password check failed");
                        Decision::Deny(Denial::Internal)
                    }
                }
            }
            _ => Self::integrity_violation(space),
        }
    }

    fn integrity_violation(space: &Space) -> Decision {
        tracing::error!(
            space_id = %space.id,
            is_encrypted = space.is_encrypted,
            has_password_hash = space.password_hash.is_some(),
            "Space protection fields disagree"
        );
        Decision::Deny(Denial::Internal)
    }
}
