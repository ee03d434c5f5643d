mod auth;
mod healthcheck;
mod spaces;
mod system_config;
mod version;

use salvo::{Request, Router};
use serde::de::DeserializeOwned;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthMiddleware,
};
use quiver_service::error::ServiceError;

/// ## Summary
/// Constructs the API router. Everything except the health check runs behind
/// [`AuthMiddleware`].
#[must_use]
pub fn routes() -> Router {
    Router::new().push(healthcheck::routes()).push(
        Router::new()
            .hoop(AuthMiddleware)
            .push(auth::routes())
            .push(spaces::routes())
            .push(version::routes())
            .push(system_config::routes()),
    )
}

/// ## Summary
/// Parses the JSON request body.
///
/// ## Errors
/// Returns `InvalidBody` if the body is missing or does not match `T`.
async fn parse_body<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
    req.parse_json::<T>().await.map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        AppError::InvalidBody(e.to_string())
    })
}

/// ## Summary
/// Reads a UUID path parameter. A value that is not a UUID names no resource.
///
/// ## Errors
/// Returns `NotFound` if the parameter is absent or malformed.
fn uuid_param(req: &Request, name: &str) -> AppResult<uuid::Uuid> {
    req.param::<String>(name)
        .and_then(|raw| uuid::Uuid::parse_str(&raw).ok())
        .ok_or_else(|| ServiceError::NotFound(format!("{name} path parameter")).into())
}
