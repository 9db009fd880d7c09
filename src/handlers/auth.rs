use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::json_body;
use crate::auth::password::{verify_dummy, verify_password};
use crate::domain::ObjectId;
use crate::error::AppError;
use crate::validation::{validate_email, validate_required};
use crate::AppState;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoggedInUser {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    pub success: bool,
    pub user: LoggedInUser,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; sets the token cookie", body = LoginResponse),
        (status = 400, description = "Malformed body"),
        (status = 401, description = "Unknown email or wrong password")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = json_body(payload)?;
    let email = validate_email(&payload.email)?;
    validate_required("password", &payload.password)?;

    // Unknown emails still pay for a hash verify.
    let user = match state.repos.users.find_credentials_by_email(&email).await? {
        Some(user) if verify_password(&payload.password, &user.password_hash) => Some(user),
        Some(_) => None,
        None => {
            verify_dummy(&payload.password);
            None
        }
    };

    let Some(user) = user else {
        tracing::info!(email = %email, "Login rejected");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let token = state
        .auth
        .codec
        .issue(&user.id, &user.role)
        .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))?;
    let cookie = state
        .auth
        .cookies
        .issue(&token)
        .map_err(|e| AppError::Internal(format!("failed to build session cookie: {}", e)))?;

    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");

    let body = LoginResponse {
        message: "Logged in successfully".to_string(),
        success: true,
        user: LoggedInUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        },
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Token cookie cleared", body = MessageResponse),
        (status = 500, description = "Response could not be built")
    ),
    tag = "Auth"
)]
pub async fn logout(State(state): State<AppState>) -> Result<Response, AppError> {
    // Stateless: nothing server-side to revoke, the client is told to drop the cookie.
    let cookie = state
        .auth
        .cookies
        .clear()
        .map_err(|e| AppError::Internal(format!("failed to build logout cookie: {}", e)))?;

    tracing::info!("User logged out");

    let body = MessageResponse {
        message: "Logged out successfully".to_string(),
        success: true,
    };

    Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}
