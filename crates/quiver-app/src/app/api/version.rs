use std::collections::BTreeMap;

use salvo::{
    Depot, Response, Router, handler,
    http::{HeaderValue, header::CACHE_CONTROL},
    writing::Json,
};
use serde::Serialize;

use crate::{error::AppResult, services_handler::get_versions_from_depot};
use quiver_core::constants::VERSION_ROUTE_COMPONENT;
use quiver_service::{auth::get_user_id_from_depot, version::VersionToken};

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub success: bool,
    pub data: BTreeMap<String, VersionToken>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

fn no_store(res: &mut Response) {
    res.headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
}

/// ## Summary
/// GET /version - Returns the current version token of every category
///
/// ## Errors
/// Returns HTTP 500 if the version store is not configured
#[handler]
async fn get_versions(depot: &mut Depot, res: &mut Response) -> AppResult<Json<VersionResponse>> {
    let versions = get_versions_from_depot(depot)?;
    no_store(res);

    Ok(Json(VersionResponse {
        success: true,
        data: versions.get_all(),
        message: None,
    }))
}

/// ## Summary
/// POST /version - Advances every category so clients refetch everything
///
/// ## Errors
/// Returns HTTP 401 when anonymous
#[handler]
async fn refresh_versions(
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<VersionResponse>> {
    let user_id = get_user_id_from_depot(depot)?;
    let versions = get_versions_from_depot(depot)?;

    let data = versions.bump_all();
    tracing::info!(%user_id, categories = data.len(), "Version keys refreshed");
    no_store(res);

    Ok(Json(VersionResponse {
        success: true,
        data,
        message: Some("Version keys refreshed"),
    }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(VERSION_ROUTE_COMPONENT)
        .get(get_versions)
        .post(refresh_versions)
}
