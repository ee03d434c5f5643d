use salvo::Depot;
use salvo::http::{StatusCode, header::AUTHORIZATION};
use tracing::error;

use crate::{services_handler::get_auth_from_depot, store_handler::get_store_from_depot};
use quiver_core::constants::API_KEY_HEADER;
use quiver_service::auth::{Credentials, Principal, depot::depot_keys, parse_bearer};

/// ## Summary
/// Resolves the request's credentials to a [`Principal`] and stores it in the depot.
///
/// A missing or rejected credential is not an error here: the request continues
/// as `Anonymous` and each handler decides whether that is acceptable.
///
/// ## Side Effects
/// Inserts the principal into the depot under `depot_keys::RESOLVED_PRINCIPAL`.
///
/// ## Errors
/// Returns an HTTP 500 response if the account store cannot be read.
#[salvo::async_trait]
impl salvo::Handler for AuthMiddleware {
    #[tracing::instrument(skip(self, req, depot, res, ctrl), fields(
        method = %req.method(),
        path = %req.uri().path()
    ))]
    async fn handle(
        &self,
        req: &mut salvo::Request,
        depot: &mut Depot,
        res: &mut salvo::Response,
        ctrl: &mut salvo::FlowCtrl,
    ) {
        tracing::trace!("Resolving principal");

        if req.method() == salvo::http::Method::OPTIONS {
            depot.insert(depot_keys::RESOLVED_PRINCIPAL, Principal::Anonymous(None));
            return;
        }

        let auth = match get_auth_from_depot(depot) {
            Ok(auth) => auth,
            Err(e) => {
                error!(error = ?e, "Failed to get auth services from depot");
                res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                ctrl.skip_rest();
                return;
            }
        };

        let store = match get_store_from_depot(depot) {
            Ok(store) => store,
            Err(e) => {
                error!(error = ?e, "Failed to get store from depot");
                res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                ctrl.skip_rest();
                return;
            }
        };

        let authorization = header_value(req, AUTHORIZATION.as_str());
        let api_key = header_value(req, API_KEY_HEADER);

        let bearer = authorization
            .as_deref()
            .and_then(|value| match parse_bearer(value) {
                Ok(token) => Some(token),
                Err(_malformed) => {
                    tracing::debug!("Ignoring non-bearer Authorization header");
                    None
                }
            });

        let credentials = Credentials {
            bearer,
            api_key: api_key.as_deref().filter(|key| !key.is_empty()),
        };

        match auth.resolver.resolve(&credentials, store.as_ref()) {
            Ok(principal) => {
                tracing::debug!(%principal, "Principal resolved");
                depot.insert(depot_keys::RESOLVED_PRINCIPAL, principal);
            }
            Err(e) => {
                error!(error = ?e, "Principal resolution failed");
                res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
                res.body("Internal Server Error");
                ctrl.skip_rest();
            }
        }
    }
}

fn header_value(req: &salvo::Request, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// ## Summary
/// Middleware that resolves every request to a principal.
pub struct AuthMiddleware;
