pub mod auth;
pub mod clock_ins;
pub mod roles;
pub mod tasks;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::auth::Claims;
use crate::domain::ObjectId;
use crate::error::AppError;
use crate::health::{check_health, HealthResponse};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Service is unhealthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let report = check_health(&state.dependencies, state.start_time).await;

    let status_code = if report.status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(report))
}

/// Unwraps a JSON body, turning any rejection into a 400.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// The caller's user id, taken from claims verified by the Role Gate.
pub(crate) fn caller_id(claims: &Claims) -> Result<ObjectId, AppError> {
    claims.user_object_id().ok_or_else(|| {
        tracing::warn!(user_id = %claims.user_id, "Verified token carries a malformed user id");
        AppError::AuthDenied
    })
}
