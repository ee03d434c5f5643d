//! The resolved identity of a request.

use serde::Serialize;

use crate::error::{AuthFailure, ServiceError, ServiceResult};

/// Who a request acts as.
///
/// `Admin` is an `Owner` whose account holds the administrator role; it is
/// never produced for an unauthenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Owner(uuid::Uuid),
    Admin(uuid::Uuid),
    /// No usable credential. Carries the configured public owner, if any.
    Anonymous(Option<uuid::Uuid>),
}

impl Principal {
    /// Returns the authenticated user's id, if any.
    #[must_use]
    pub const fn user_id(&self) -> Option<uuid::Uuid> {
        match self {
            Self::Owner(id) | Self::Admin(id) => Some(*id),
            Self::Anonymous(_) => None,
        }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin(_))
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Owner(_) => "owner",
            Self::Admin(_) => "admin",
            Self::Anonymous(_) => "anonymous",
        }
    }

    /// ## Summary
    /// Returns the user id for endpoints that require a logged-in caller.
    ///
    /// ## Errors
    /// Returns `NotAuthenticated` for an anonymous principal.
    pub fn require_authenticated(&self) -> ServiceResult<uuid::Uuid> {
        match self {
            Self::Owner(id) | Self::Admin(id) => Ok(*id),
            Self::Anonymous(_) => Err(ServiceError::NotAuthenticated(AuthFailure::Missing)),
        }
    }

    /// ## Summary
    /// Returns the user id for endpoints reserved to the administrator.
    ///
    /// ## Errors
    /// Returns `NotAuthenticated` for an anonymous principal and
    /// `AuthorizationError` for a non-admin owner.
    pub fn require_admin(&self) -> ServiceResult<uuid::Uuid> {
        match self {
            Self::Admin(id) => Ok(*id),
            Self::Owner(_) => Err(ServiceError::AuthorizationError(
                "administrator role required".to_string(),
            )),
            Self::Anonymous(_) => Err(ServiceError::NotAuthenticated(AuthFailure::Missing)),
        }
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owner(id) | Self::Admin(id) => write!(f, "{}:{id}", self.kind()),
            Self::Anonymous(_) => f.write_str(self.kind()),
        }
    }
}

/// Client-facing view of a principal.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalView {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<uuid::Uuid>,
}

impl From<&Principal> for PrincipalView {
    fn from(principal: &Principal) -> Self {
        Self {
            kind: principal.kind(),
            user_id: principal.user_id(),
        }
    }
}
