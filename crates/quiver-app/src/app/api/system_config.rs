use salvo::{Depot, Request, Router, handler, writing::Json};
use serde::{Deserialize, Serialize};

use super::parse_body;
use crate::{
    error::AppResult,
    services_handler::get_auth_from_depot,
    store_handler::get_store_from_depot,
};
use quiver_core::constants::SYSTEM_CONFIG_ROUTE_COMPONENT;
use quiver_service::{auth::get_principal_from_depot, error::ServiceError};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub new_password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordResponse {
    pub success: bool,
    pub user_id: uuid::Uuid,
    pub username: String,
}

/// ## Summary
/// POST /system-config/reset-password - Replaces the administrator's password
///
/// ## Errors
/// Returns HTTP 404 if no account exists, 401/403 unless the caller is the
/// administrator, 400 if the new password violates policy
#[handler]
async fn reset_password(
    req: &mut Request,
    depot: &mut Depot,
) -> AppResult<Json<ResetPasswordResponse>> {
    let body: ResetPasswordRequest = parse_body(req).await?;
    let store = get_store_from_depot(depot)?;

    if store.account_count()? == 0 {
        return Err(ServiceError::NotFound("account".to_string()).into());
    }

    let admin_id = get_principal_from_depot(depot).require_admin()?;
    let auth = get_auth_from_depot(depot)?;

    let password_hash = auth.passwords.hash(&body.new_password).await?;
    let account = store.set_password_hash(admin_id, password_hash)?;
    tracing::info!(user_id = %account.id, "Administrator password reset");

    Ok(Json(ResetPasswordResponse {
        success: true,
        user_id: account.id,
        username: account.username,
    }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(SYSTEM_CONFIG_ROUTE_COMPONENT)
        .push(Router::with_path("reset-password").post(reset_password))
}
