use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::{caller_id, json_body};
use crate::auth::Claims;
use crate::domain::task::{ACTIVITY_ACTION_MAX_LEN, TASK_TITLE_MAX_LEN};
use crate::domain::{NewTask, NewTaskActivity, ObjectId, Task, TaskActivity, TaskPriority, TaskStatus};
use crate::error::AppError;
use crate::validation::{
    sanitize_optional, validate_enum, validate_max_len, validate_name, DESCRIPTION_MAX_LEN,
};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    /// One of `todo`, `in_progress`, `done`. Defaults to `todo`.
    pub status: Option<String>,
    /// One of `low`, `medium`, `high`. Defaults to `medium`.
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordActivityRequest {
    pub action: String,
    pub details: Option<String>,
}

fn task_id(raw: &str) -> Result<ObjectId, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation("Invalid task id".to_string()))
}

fn checked_text(field: &'static str, value: Option<String>) -> Result<Option<String>, AppError> {
    let value = sanitize_optional(value);
    if let Some(text) = &value {
        validate_max_len(field, text, DESCRIPTION_MAX_LEN)?;
    }
    Ok(value)
}

fn parse_status(value: Option<String>) -> Result<TaskStatus, AppError> {
    match value {
        None => Ok(TaskStatus::default()),
        Some(raw) => {
            validate_enum("status", &raw, &TaskStatus::ALL)?;
            raw.parse().map_err(AppError::Validation)
        }
    }
}

fn parse_priority(value: Option<String>) -> Result<TaskPriority, AppError> {
    match value {
        None => Ok(TaskPriority::default()),
        Some(raw) => {
            validate_enum("priority", &raw, &TaskPriority::ALL)?;
            raw.parse().map_err(AppError::Validation)
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid task fields"),
        (status = 403, description = "Missing, invalid or expired token")
    ),
    tag = "Tasks"
)]
pub async fn create_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let user = caller_id(&claims)?;
    let payload = json_body(payload)?;

    let task = NewTask {
        title: validate_name("title", &payload.title, TASK_TITLE_MAX_LEN)?,
        description: checked_text("description", payload.description)?,
        status: parse_status(payload.status)?,
        priority: parse_priority(payload.priority)?,
        created_by: user.clone(),
    };

    let created = state.repos.tasks.create(task).await?;
    tracing::info!(task_id = %created.id, user_id = %user, "Task created");

    // The task exists either way; a missing log entry is not worth failing the request.
    let activity = NewTaskActivity {
        task: created.id.clone(),
        user,
        action: "created".to_string(),
        details: None,
    };
    if let Err(e) = state.repos.activity.record(activity).await {
        tracing::warn!(task_id = %created.id, error = %e, "Failed to record creation activity");
    }

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = Task),
        (status = 400, description = "Invalid task id"),
        (status = 404, description = "Task not found")
    ),
    tag = "Tasks"
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Task>, AppError> {
    let id = task_id(&id)?;
    let task = state.repos.tasks.get(&id).await?;
    Ok(Json(task))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{id}/activity",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "Activity log, newest first, users populated", body = Vec<TaskActivity>),
        (status = 400, description = "Invalid task id"),
        (status = 500, description = "Storage failure")
    ),
    tag = "Tasks"
)]
pub async fn list_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TaskActivity>>, AppError> {
    let id = task_id(&id)?;
    let activity = state.repos.activity.list_for_task(&id).await?;
    Ok(Json(activity))
}

#[utoipa::path(
    post,
    path = "/api/tasks/{id}/activity",
    params(("id" = String, Path, description = "Task id")),
    request_body = RecordActivityRequest,
    responses(
        (status = 201, description = "Activity recorded", body = TaskActivity),
        (status = 400, description = "Invalid task id or fields"),
        (status = 403, description = "Missing, invalid or expired token"),
        (status = 404, description = "Task not found")
    ),
    tag = "Tasks"
)]
pub async fn record_activity(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    payload: Result<Json<RecordActivityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TaskActivity>), AppError> {
    let id = task_id(&id)?;
    let user = caller_id(&claims)?;
    let payload = json_body(payload)?;
    let action = validate_name("action", &payload.action, ACTIVITY_ACTION_MAX_LEN)?;
    let details = checked_text("details", payload.details)?;

    // 404 rather than the 400 a dangling reference would produce.
    state.repos.tasks.get(&id).await?;

    let activity = NewTaskActivity {
        task: id,
        user,
        action,
        details,
    };
    let recorded = state.repos.activity.record(activity).await?;
    tracing::info!(task_id = %recorded.task, action = %recorded.action, "Task activity recorded");

    Ok((StatusCode::CREATED, Json(recorded)))
}
