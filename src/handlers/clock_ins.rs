use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::{caller_id, json_body};
use crate::auth::Claims;
use crate::domain::{ClockIn, NewClockIn};
use crate::error::AppError;
use crate::validation::{sanitize_optional, validate_coordinates, validate_max_len, NOTE_MAX_LEN};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ClockInRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub note: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/clockins",
    request_body = ClockInRequest,
    responses(
        (status = 201, description = "Clock-in recorded for the caller", body = ClockIn),
        (status = 400, description = "Coordinates out of range or note too long"),
        (status = 403, description = "Missing, invalid or expired token")
    ),
    tag = "Clock-ins"
)]
pub async fn clock_in(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<ClockInRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClockIn>), AppError> {
    let user = caller_id(&claims)?;
    let payload = json_body(payload)?;
    validate_coordinates(payload.latitude, payload.longitude)?;

    let note = sanitize_optional(payload.note);
    if let Some(text) = &note {
        validate_max_len("note", text, NOTE_MAX_LEN)?;
    }

    let recorded = state
        .repos
        .clock_ins
        .record(NewClockIn {
            user,
            latitude: payload.latitude,
            longitude: payload.longitude,
            note,
        })
        .await?;
    tracing::info!(clock_in_id = %recorded.id, user_id = %recorded.user, "Clock-in recorded");

    Ok((StatusCode::CREATED, Json(recorded)))
}

#[utoipa::path(
    get,
    path = "/api/clockins",
    responses(
        (status = 200, description = "The caller's clock-ins, newest first", body = Vec<ClockIn>),
        (status = 403, description = "Missing, invalid or expired token")
    ),
    tag = "Clock-ins"
)]
pub async fn list_my_clock_ins(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ClockIn>>, AppError> {
    let user = caller_id(&claims)?;
    let clock_ins = state.repos.clock_ins.list_for_user(&user).await?;
    Ok(Json(clock_ins))
}
