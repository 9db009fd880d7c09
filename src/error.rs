use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ports::RepositoryError;
use crate::validation::ValidationError;

/// Fixed body for every Role Gate denial.
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied: missing, invalid or expired token";

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Errors surfaced at the HTTP boundary.
///
/// `Display` carries the full detail for server-side logs. Clients only ever see
/// [`AppError::client_message`].
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied")]
    AuthDenied,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::AuthDenied => StatusCode::FORBIDDEN,
        }
    }

    /// The sanitized message placed in the response body.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => INTERNAL_MESSAGE.to_string(),
            AppError::AuthDenied => ACCESS_DENIED_MESSAGE.to_string(),
            AppError::Validation(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::Unauthorized(msg) => msg.clone(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            RepositoryError::Conflict(what) => {
                AppError::Conflict(format!("{} already exists", what))
            }
            RepositoryError::InvalidReference(what) => {
                AppError::Validation(format!("Referenced {} does not exist", what))
            }
            RepositoryError::Database(e) => AppError::Database(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = Json(json!({
            "message": self.client_message(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_validation_error_status_code() {
        let error = AppError::Validation("Invalid input".to_string());
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_not_found_error_status_code() {
        let error = AppError::NotFound("Role not found".to_string());
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_database_error_status_code() {
        let error = AppError::Database(sqlx::Error::PoolTimedOut);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_denied_status_code() {
        assert_eq!(AppError::AuthDenied.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_unauthorized_error_status_code() {
        let error = AppError::Unauthorized("Invalid email or password".to_string());
        assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_repository_errors_map_to_http_errors() {
        let not_found: AppError = RepositoryError::NotFound("Role".to_string()).into();
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.client_message(), "Role not found");

        let conflict: AppError = RepositoryError::Conflict("Role 'admin'".to_string()).into();
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);

        let bad_ref: AppError = RepositoryError::InvalidReference("permission".to_string()).into();
        assert_eq!(bad_ref.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(bad_ref.client_message(), "Referenced permission does not exist");
    }

    #[tokio::test]
    async fn test_foreign_key_response_hides_constraint_name() {
        let error: AppError = RepositoryError::InvalidReference("user".to_string()).into();
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Referenced user does not exist");
        assert!(!body.to_string().contains("_fkey"));
    }

    #[tokio::test]
    async fn test_internal_errors_are_sanitized() {
        let error = AppError::Internal("connection refused at 10.0.0.5:5432".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], INTERNAL_MESSAGE);
        assert!(!body.to_string().contains("10.0.0.5"));
    }

    #[tokio::test]
    async fn test_database_error_response_hides_detail() {
        let error = AppError::Database(sqlx::Error::Protocol("relation \"roles\" does not exist".into()));
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], INTERNAL_MESSAGE);
        assert_eq!(body["status"], 500);
    }

    #[tokio::test]
    async fn test_validation_error_response_keeps_message() {
        let error = AppError::Validation("permissionIds must be an array".to_string());
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "permissionIds must be an array");
    }
}
