use salvo::async_trait;
use std::sync::Arc;

use crate::error::AppResult;
use quiver_core::error::CoreError;
use quiver_service::{auth::AuthServices, version::VersionKeyStore};

/// Injects the process-wide auth services and version store into every request.
pub struct ServicesHandler {
    pub auth: Arc<AuthServices>,
    pub versions: Arc<VersionKeyStore>,
}

#[async_trait]
impl salvo::Handler for ServicesHandler {
    #[tracing::instrument(skip(self, _req, depot, _res, _ctrl))]
    async fn handle(
        &self,
        _req: &mut salvo::Request,
        depot: &mut salvo::Depot,
        _res: &mut salvo::Response,
        _ctrl: &mut salvo::FlowCtrl,
    ) {
        depot.inject(Arc::clone(&self.auth));
        depot.inject(Arc::clone(&self.versions));
    }
}

/// ## Summary
/// Retrieves the auth services from the depot.
///
/// ## Errors
/// Returns an error if the services are not found in the depot.
pub fn get_auth_from_depot(depot: &salvo::Depot) -> AppResult<Arc<AuthServices>> {
    depot
        .obtain::<Arc<AuthServices>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Auth services not found in depot").into())
}

/// ## Summary
/// Retrieves the version key store from the depot.
///
/// ## Errors
/// Returns an error if the store is not found in the depot.
pub fn get_versions_from_depot(depot: &salvo::Depot) -> AppResult<Arc<VersionKeyStore>> {
    depot
        .obtain::<Arc<VersionKeyStore>>()
        .cloned()
        .map_err(|_err| CoreError::InvariantViolation("Version store not found in depot").into())
}
