use salvo::{Depot, Request, Response, Router, handler, http::StatusCode, writing::Json};
use serde::{Deserialize, Serialize};

use super::parse_body;
use crate::{
    config::get_config_from_depot,
    error::{AppError, AppResult},
    services_handler::{get_auth_from_depot, get_versions_from_depot},
    store_handler::get_store_from_depot,
};
use quiver_core::constants::{AUTH_ROUTE_COMPONENT, DEFAULT_SPACE_NAME, SPACES_CATEGORY};
use quiver_service::{
    auth::{
        PrincipalView, api_key::generate_api_key, get_principal_from_depot, get_user_id_from_depot,
    },
    error::ServiceError,
};
use quiver_store::model::{
    account::{Account, NewAccount},
    space::Space,
};

/// ## Summary
/// Username and password, shared by init, login and register.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for CredentialsRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialsRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitStatusResponse {
    pub needs_init: bool,
    pub min_password_length: usize,
}

#[derive(Debug, Serialize)]
pub struct InitResponse {
    pub success: bool,
    pub token: String,
    pub user: Account,
    pub space: Space,
}

/// ## Summary
/// Login response payload
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub user: Account,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub user: Account,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub success: bool,
    pub api_key: String,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub principal: PrincipalView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

fn required_username(username: &str) -> AppResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(ServiceError::ValidationError("Username is required".to_string()).into());
    }
    Ok(username.to_string())
}

/// ## Summary
/// GET /auth/init - Reports whether the first account still has to be created
/// and the password policy it must satisfy
///
/// ## Errors
/// Returns HTTP 500 if the store cannot be read
#[handler]
async fn init_status(depot: &mut Depot) -> AppResult<Json<InitStatusResponse>> {
    let store = get_store_from_depot(depot)?;
    let config = get_config_from_depot(depot)?;
    Ok(Json(InitStatusResponse {
        needs_init: store.account_count()? == 0,
        min_password_length: config.auth.min_password_length,
    }))
}

/// ## Summary
/// POST /auth/init - Creates the administrator account and its default space
///
/// ## Side Effects
/// - Creates the first account, which holds the admin role
/// - Creates the default space owned by it
/// - Bumps the `spaces` version key
///
/// ## Errors
/// Returns HTTP 400 if any account exists or the credentials violate policy
#[handler]
async fn init(req: &mut Request, depot: &mut Depot) -> AppResult<Json<InitResponse>> {
    let body: CredentialsRequest = parse_body(req).await?;
    let store = get_store_from_depot(depot)?;
    let auth = get_auth_from_depot(depot)?;
    let versions = get_versions_from_depot(depot)?;

    if store.account_count()? > 0 {
        tracing::debug!("Rejected init: accounts already exist");
        return Err(
            ServiceError::ValidationError("System is already initialized".to_string()).into(),
        );
    }

    let username = required_username(&body.username)?;
    let password_hash = auth.passwords.hash(&body.password).await?;

    let (user, space) = store.initialize(
        NewAccount {
            username,
            password_hash,
        },
        DEFAULT_SPACE_NAME,
    )?;
    versions.bump(SPACES_CATEGORY);

    let token = auth.tokens.issue(user.id)?;
    tracing::info!(user_id = %user.id, username = %user.username, "System initialized");

    Ok(Json(InitResponse {
        success: true,
        token,
        user,
        space,
    }))
}

/// ## Summary
/// POST /auth/login - Exchanges a username and password for a bearer token
///
/// ## Errors
/// Returns HTTP 401 with a single generic message for every credential failure
#[handler]
async fn login(req: &mut Request, depot: &mut Depot) -> AppResult<Json<LoginResponse>> {
    let body: CredentialsRequest = parse_body(req).await?;
    let store = get_store_from_depot(depot)?;
    let auth = get_auth_from_depot(depot)?;

    let username = body.username.trim();
    if username.is_empty() || body.password.is_empty() {
        tracing::debug!("Login rejected: missing credentials");
        return Err(AppError::InvalidCredentials);
    }

    let Some(user) = store.account_by_username(username)? else {
        auth.passwords.verify_unknown_account(&body.password).await?;
        tracing::debug!(%username, "Login rejected: unknown user");
        return Err(AppError::InvalidCredentials);
    };

    if !auth
        .passwords
        .verify(&body.password, &user.password_hash)
        .await?
    {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = auth.tokens.issue(user.id)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        success: true,
        token,
        user,
    }))
}

/// ## Summary
/// POST /auth/register - Creates a member account (administrator only)
///
/// ## Errors
/// Returns HTTP 401 when anonymous, 403 for non-admins,
/// 400 for a taken username or a policy violation
#[handler]
async fn register(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> AppResult<Json<RegisterResponse>> {
    let admin_id = get_principal_from_depot(depot).require_admin()?;
    let body: CredentialsRequest = parse_body(req).await?;
    let store = get_store_from_depot(depot)?;
    let auth = get_auth_from_depot(depot)?;

    let username = required_username(&body.username)?;
    let password_hash = auth.passwords.hash(&body.password).await?;
    let user = store.create_account(NewAccount {
        username,
        password_hash,
    })?;

    tracing::info!(%admin_id, user_id = %user.id, role = %user.role, "Account registered");

    res.status_code(StatusCode::CREATED);
    Ok(Json(RegisterResponse {
        success: true,
        user,
    }))
}

/// ## Summary
/// POST /auth/api-key - Issues a new API key for the caller, replacing any previous one
///
/// ## Side Effects
/// Stores the key's digest on the account; the plaintext is returned once.
///
/// ## Errors
/// Returns HTTP 401 when anonymous
#[handler]
async fn issue_api_key(depot: &mut Depot) -> AppResult<Json<ApiKeyResponse>> {
    let user_id = get_user_id_from_depot(depot)?;
    let store = get_store_from_depot(depot)?;

    let issued = generate_api_key();
    store.set_api_key_digest(user_id, issued.digest)?;
    tracing::info!(%user_id, "API key issued");

    Ok(Json(ApiKeyResponse {
        success: true,
        api_key: issued.key,
        message: "Store this key now; it cannot be shown again",
    }))
}

/// ## Summary
/// GET /auth/me - Describes the principal the request resolved to
///
/// ## Errors
/// Returns HTTP 500 if the store cannot be read
#[handler]
async fn me(depot: &mut Depot) -> AppResult<Json<MeResponse>> {
    let principal = get_principal_from_depot(depot);
    let username = match principal.user_id() {
        Some(id) => get_store_from_depot(depot)?
            .account_by_id(id)?
            .map(|account| account.username),
        None => None,
    };

    Ok(Json(MeResponse {
        principal: PrincipalView::from(&principal),
        username,
    }))
}

#[must_use]
pub fn routes() -> Router {
    Router::with_path(AUTH_ROUTE_COMPONENT)
        .push(Router::with_path("init").get(init_status).post(init))
        .push(Router::with_path("login").post(login))
        .push(Router::with_path("register").post(register))
        .push(Router::with_path("api-key").post(issue_api_key))
        .push(Router::with_path("me").get(me))
}
