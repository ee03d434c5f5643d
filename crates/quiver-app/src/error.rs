use salvo::{Depot, Request, Response, Writer, async_trait, http::StatusCode, writing::Json};
use serde::Serialize;
use thiserror::Error;

use quiver_core::error::CoreError;
use quiver_service::error::ServiceError;
use quiver_store::error::StoreError;

/// Application-level errors (HTTP layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] ServiceError),

    #[error(transparent)]
    StoreError(#[from] StoreError),

    #[error(transparent)]
    CoreError(#[from] CoreError),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Login failed. One variant for every cause so responses never reveal which.
    #[error("Invalid username or password")]
    InvalidCredentials,
}

pub type AppResult<T> = std::result::Result<T, AppError>;

/// ## Summary
/// Error response payload
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl AppError {
    /// ## Summary
    /// Maps the error onto the client-facing status code.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::ServiceError(e) => match e {
                ServiceError::NotAuthenticated(_) => StatusCode::UNAUTHORIZED,
                ServiceError::AuthorizationError(_) => StatusCode::FORBIDDEN,
                ServiceError::NotFound(_) | ServiceError::StoreError(StoreError::NotFound(_)) => {
                    StatusCode::NOT_FOUND
                }
                ServiceError::ValidationError(_)
                | ServiceError::StoreError(StoreError::Conflict(_)) => StatusCode::BAD_REQUEST,
                ServiceError::InvalidConfiguration(_)
                | ServiceError::InvariantViolation(_)
                | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::StoreError(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::StoreError(StoreError::Conflict(_)) | Self::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::CoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// ## Summary
    /// Returns the message shown to the client.
    ///
    /// Validation and conflict messages pass through verbatim; everything else
    /// is generic so internal detail and credential failure reasons never leak.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::ServiceError(
                ServiceError::ValidationError(msg)
                | ServiceError::StoreError(StoreError::Conflict(msg)),
            )
            | Self::StoreError(StoreError::Conflict(msg)) => msg.clone(),
            Self::InvalidBody(_) => "Invalid request body".to_string(),
            Self::InvalidCredentials => self.to_string(),
            _ => match self.status_code() {
                StatusCode::UNAUTHORIZED => "Unauthorized".to_string(),
                StatusCode::FORBIDDEN => "Forbidden".to_string(),
                StatusCode::NOT_FOUND => "Not found".to_string(),
                _ => "Internal server error".to_string(),
            },
        }
    }
}

#[async_trait]
impl Writer for AppError {
    async fn write(self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::debug!(error = %self, %status, "Request rejected");
        }

        res.status_code(status);
        res.render(Json(ErrorResponse {
            error: self.client_message(),
        }));
    }
}
