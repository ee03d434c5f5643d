use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};

use super::{parse_body, uuid_param};
use crate::{
    error::{AppError, AppResult},
    services_handler::{get_auth_from_depot, get_versions_from_depot},
    store_handler::get_store_from_depot,
};
use quiver_core::constants::{
    BOOKMARKS_CATEGORY, FOLDERS_CATEGORY, SPACE_PASSWORD_HEADER, SPACES_CATEGORY,
    SPACES_ROUTE_COMPONENT,
};
use quiver_service::{
    auth::{
        Access, Decision, Denial, PasswordVerifier, Principal, get_principal_from_depot,
        get_user_id_from_depot,
    },
    error::ServiceError,
};
use quiver_store::model::space::{NewSpace, ProtectionChange, Space, SpaceUpdate};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpaceRequest {
    pub name: String,
    pub is_encrypted: Option<bool>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSpaceRequest {
    pub name: Option<String>,
    pub is_encrypted: Option<bool>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct VerifyPasswordRequest {
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpaceResponse {
    pub success: bool,
    pub data: Space,
}

#[derive(Debug, Serialize)]
pub struct SpaceListResponse {
    pub success: bool,
    pub data: Vec<Space>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: &'static str,
}

/// ## Summary
/// Outcome of a password check. `valid` is always present; a failure carries `error`.
#[derive(Debug, Serialize)]
pub struct VerifyPasswordResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

impl VerifyPasswordResponse {
    const fn valid(message: &'static str) -> Self {
        Self {
            valid: true,
            message: Some(message),
            error: None,
        }
    }

    const fn invalid(error: &'static str) -> Self {
        Self {
            valid: false,
            message: None,
            error: Some(error),
        }
    }
}

fn supplied_password(req: &Request) -> Option<String> {
    req.headers()
        .get(SPACE_PASSWORD_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn required_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::ValidationError("Space name is required".to_string()).into());
    }
    Ok(name.to_string())
}

fn load_space(depot: &Depot, id: uuid::Uuid) -> AppResult<Space> {
    get_store_from_depot(depot)?
        .space_by_id(id)?
        .ok_or_else(|| ServiceError::NotFound(format!("space {id}")).into())
}

/// ## Summary
/// GET /spaces - Lists the spaces visible to the caller
///
/// Admins see every space, owners their own, and anonymous callers the
/// public owner's unprotected spaces.
///
/// ## Errors
/// Returns HTTP 500 if the store cannot be read
#[handler]
async fn list_spaces(depot: &mut Depot) -> AppResult<Json<SpaceListResponse>> {
    let store = get_store_from_depot(depot)?;

    let data = match get_principal_from_depot(depot) {
        Principal::Admin(_) => store.spaces(None)?,
        Principal::Owner(user_id) => store.spaces(Some(user_id))?,
        Principal::Anonymous(Some(public_owner)) => store
            .spaces(Some(public_owner))?
            .into_iter()
            .filter(|space| !space.is_encrypted && space.has_consistent_protection())
            .collect(),
        Principal::Anonymous(None) => Vec::new(),
    };

    Ok(Json(SpaceListResponse {
        success: true,
        data,
    }))
}

/// ## Summary
/// POST /spaces - Creates a space owned by the caller
///
/// ## Side Effects
/// Bumps the `spaces` version key.
///
/// ## Errors
/// Returns HTTP 401 when anonymous, 400 for an invalid name or password combination
#[handler]
async fn create_space(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<SpaceResponse>> {
    let owner_id = get_user_id_from_depot(depot)?;
    let body: CreateSpaceRequest = parse_body(req).await?;
    let store = get_store_from_depot(depot)?;
    let auth = get_auth_from_depot(depot)?;
    let versions = get_versions_from_depot(depot)?;

    let name = required_name(&body.name)?;
    let password_hash = match (body.is_encrypted.unwrap_or(false), body.password) {
        (true, Some(password)) => Some(auth.passwords.hash(&password).await?),
        (true, None) => {
            return Err(ServiceError::ValidationError(
                "Password is required for encrypted spaces".to_string(),
            )
            .into());
        }
        (false, Some(_)) => {
            return Err(ServiceError::ValidationError(
                "Password is only allowed for encrypted spaces".to_string(),
            )
            .into());
        }
        (false, None) => None,
    };

    let space = store.create_space(NewSpace {
        owner_id,
        name,
        password_hash,
    })?;
    versions.bump(SPACES_CATEGORY);
    tracing::info!(space_id = %space.id, %owner_id, is_encrypted = space.is_encrypted, "Space created");

    res.status_code(StatusCode::CREATED);
    Ok(Json(SpaceResponse {
        success: true,
        data: space,
    }))
}

/// ## Summary
/// GET /spaces/{id} - Returns a space the caller may read
///
/// An encrypted space needs its password in the `x-space-password` header
/// unless the caller is the administrator.
///
/// ## Errors
/// Returns HTTP 404 for unknown or foreign spaces, 401/403 when access is refused
#[handler]
async fn get_space(req: &mut Request, depot: &mut Depot) -> AppResult<Json<SpaceResponse>> {
    let id = uuid_param(req, "id")?;
    let principal = get_principal_from_depot(depot);
    let auth = get_auth_from_depot(depot)?;
    let space = load_space(depot, id)?;

    auth.guard
        .authorize_read(&principal, &space, supplied_password(req).as_deref())
        .await
        .into_result()?;

    Ok(Json(SpaceResponse {
        success: true,
        data: space,
    }))
}

/// Maps an update request onto a protection change for `space`.
async fn protection_change(
    space: &Space,
    is_encrypted: Option<bool>,
    password: Option<String>,
    passwords: &PasswordVerifier,
) -> AppResult<ProtectionChange> {
    match (is_encrypted, password) {
        (Some(false), _) => Ok(ProtectionChange::Disable),
        (Some(true), None) if space.is_encrypted => Ok(ProtectionChange::Keep),
        (Some(true), None) => Err(ServiceError::ValidationError(
            "Password is required to encrypt a space".to_string(),
        )
        .into()),
        (None, Some(_)) if !space.is_encrypted => Err(ServiceError::ValidationError(
            "Password is only allowed for encrypted spaces".to_string(),
        )
        .into()),
        (Some(true) | None, Some(password)) => {
            Ok(ProtectionChange::Enable(passwords.hash(&password).await?))
        }
        (None, None) => Ok(ProtectionChange::Keep),
    }
}

/// ## Summary
/// PUT /spaces/{id} - Renames a space or changes its password protection
///
/// ## Side Effects
/// Bumps the `spaces` version key.
///
/// ## Errors
/// Returns HTTP 404 for unknown or foreign spaces, 401/403 when access is refused,
/// 400 for an invalid name or password combination
#[handler]
async fn update_space(req: &mut Request, depot: &mut Depot) -> AppResult<Json<SpaceResponse>> {
    let id = uuid_param(req, "id")?;
    let principal = get_principal_from_depot(depot);
    let store = get_store_from_depot(depot)?;
    let auth = get_auth_from_depot(depot)?;
    let versions = get_versions_from_depot(depot)?;

    let space = load_space(depot, id)?;
    auth.guard
        .authorize_write(&principal, &space, supplied_password(req).as_deref())
        .await
        .into_result()?;

    let body: UpdateSpaceRequest = parse_body(req).await?;
    let name = body.name.as_deref().map(required_name).transpose()?;
    let protection =
        protection_change(&space, body.is_encrypted, body.password, &auth.passwords).await?;

    let updated = store.update_space(id, SpaceUpdate { name, protection })?;
    versions.bump(SPACES_CATEGORY);
    tracing::info!(
        space_id = %id,
        %principal,
        is_encrypted = updated.is_encrypted,
        "Space updated"
    );

    Ok(Json(SpaceResponse {
        success: true,
        data: updated,
    }))
}

/// ## Summary
/// DELETE /spaces/{id} - Deletes a space together with its folders and bookmarks
///
/// ## Side Effects
/// Bumps the `spaces`, `folders` and `bookmarks` version keys.
///
/// ## Errors
/// Returns HTTP 404 for unknown or foreign spaces, 401/403 when access is refused
#[handler]
async fn delete_space(req: &mut Request, depot: &mut Depot) -> AppResult<Json<DeleteResponse>> {
    let id = uuid_param(req, "id")?;
    let principal = get_principal_from_depot(depot);
    let store = get_store_from_depot(depot)?;
    let auth = get_auth_from_depot(depot)?;
    let versions = get_versions_from_depot(depot)?;

    let space = load_space(depot, id)?;
    auth.guard
        .authorize_write(&principal, &space, supplied_password(req).as_deref())
        .await
        .into_result()?;

    store.delete_space(id)?;
    for category in [SPACES_CATEGORY, FOLDERS_CATEGORY, BOOKMARKS_CATEGORY] {
        versions.bump(category);
    }
    tracing::info!(space_id = %id, %principal, "Space deleted");

    Ok(Json(DeleteResponse {
        success: true,
        message: "Space deleted",
    }))
}

/// ## Summary
/// POST /spaces/{id}/verify-password - Checks a space password
///
/// The administrator always succeeds, with a message telling an encrypted
/// space's bypass apart from a space that has no password.
///
/// ## Errors
/// Returns HTTP 401 when anonymous or for a wrong password, 400 when the space
/// is not encrypted or the password is missing, 404 for unknown or foreign spaces
#[handler]
async fn verify_password(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<VerifyPasswordResponse>> {
    let id = uuid_param(req, "id")?;
    let principal = get_principal_from_depot(depot);
    if principal.user_id().is_none() {
        res.status_code(StatusCode::UNAUTHORIZED);
        return Ok(Json(VerifyPasswordResponse::invalid("Unauthorized")));
    }

    let auth = get_auth_from_depot(depot)?;
    let space = load_space(depot, id)?;
    let body: VerifyPasswordRequest = parse_body(req).await?;
    let password = body.password.filter(|p| !p.is_empty());

    let decision = auth
        .guard
        .authorize_read(&principal, &space, password.as_deref())
        .await;

    let response = match decision {
        Decision::Allow(Access::AdminBypass) => {
            VerifyPasswordResponse::valid("Administrator access; no password needed")
        }
        Decision::Allow(Access::Unprotected | Access::PublicRead) if principal.is_admin() => {
            VerifyPasswordResponse::valid("Space is not password protected; no password needed")
        }
        Decision::Allow(Access::Unprotected | Access::PublicRead) => {
            return Err(
                ServiceError::ValidationError("Space is not encrypted".to_string()).into(),
            );
        }
        Decision::Allow(Access::PasswordVerified) => {
            VerifyPasswordResponse::valid("Password verified")
        }
        Decision::Deny(Denial::Authorization) if password.is_none() => {
            return Err(
                ServiceError::ValidationError("Password is required".to_string()).into(),
            );
        }
        Decision::Deny(Denial::Authorization | Denial::Authentication) => {
            tracing::debug!(space_id = %id, %principal, "Space password rejected");
            res.status_code(StatusCode::UNAUTHORIZED);
            VerifyPasswordResponse::invalid("Invalid password")
        }
        Decision::Deny(denial @ (Denial::NotFound | Denial::Internal)) => {
            return Err(AppError::from(denial.into_error()));
        }
    };

    Ok(Json(response))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(SPACES_ROUTE_COMPONENT)
        .get(list_spaces)
        .post(create_space)
        .push(
            Router::with_path("{id}")
                .get(get_space)
                .put(update_space)
                .delete(delete_space)
                .push(Router::with_path("verify-password").post(verify_password)),
        )
}
