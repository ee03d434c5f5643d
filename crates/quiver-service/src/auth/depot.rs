//! Helpers for reading the resolved principal out of a Salvo depot.

use crate::error::ServiceResult;

use super::principal::Principal;

pub mod depot_keys {
    pub const RESOLVED_PRINCIPAL: &str = "__resolved_principal";
}

/// Get the resolved principal from the depot.
///
/// A depot without a principal means the auth middleware did not run; the
/// request is treated as anonymous.
#[must_use]
pub fn get_principal_from_depot(depot: &salvo::Depot) -> Principal {
    match depot.get::<Principal>(depot_keys::RESOLVED_PRINCIPAL) {
        Ok(principal) => *principal,
        Err(_missing) => {
            tracing::warn!("Depot missing principal; treating request as anonymous");
            Principal::Anonymous(None)
        }
    }
}

/// Get the authenticated user's id from the depot.
///
/// ## Errors
///
/// Returns `NotAuthenticated` if the request is anonymous.
pub fn get_user_id_from_depot(depot: &salvo::Depot) -> ServiceResult<uuid::Uuid> {
    get_principal_from_depot(depot).require_authenticated()
}
