pub mod api;

use std::sync::Arc;

use salvo::Router;

use crate::{
    config::{ConfigHandler, Settings},
    services_handler::ServicesHandler,
    store_handler::StoreHandler,
};
use quiver_service::{auth::AuthServices, version::VersionKeyStore};
use quiver_store::Store;

/// ## Summary
/// Builds the full application router with its injection hoops.
///
/// Shared by the binary and the integration tests so both serve the same tree.
#[must_use]
pub fn router(
    settings: Settings,
    store: Arc<dyn Store>,
    auth: Arc<AuthServices>,
    versions: Arc<VersionKeyStore>,
) -> Router {
    Router::new()
        .hoop(StoreHandler { store })
        .hoop(ConfigHandler { settings })
        .hoop(ServicesHandler { auth, versions })
        .push(api::routes())
}
