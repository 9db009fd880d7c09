use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use utoipa::ToSchema;

use super::json_body;
use crate::domain::role::{PERMISSION_NAME_MAX_LEN, ROLE_NAME_MAX_LEN};
use crate::domain::{NewPermission, NewRole, ObjectId, Permission, Role};
use crate::error::AppError;
use crate::validation::{
    parse_object_id, sanitize_optional, validate_max_len, validate_name, DESCRIPTION_MAX_LEN,
};
use crate::AppState;

const NOT_AN_ARRAY: &str = "permissionIds must be an array";

#[derive(Debug, Serialize, ToSchema)]
pub struct RolesResponse {
    pub roles: Vec<Role>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionsResponse {
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePermissionRequest {
    pub name: String,
    pub description: Option<String>,
}

/// Body of the permission replace. Parsed loosely so that a non-array value
/// gets its own message.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolePermissionsRequest {
    #[schema(value_type = Vec<String>)]
    pub permission_ids: Vec<ObjectId>,
}

fn checked_description(description: Option<String>) -> Result<Option<String>, AppError> {
    let description = sanitize_optional(description);
    if let Some(text) = &description {
        validate_max_len("description", text, DESCRIPTION_MAX_LEN)?;
    }
    Ok(description)
}

/// Pulls `permissionIds` out of a loosely typed body, keeping the first
/// occurrence of each id.
fn permission_ids_from(body: &Value) -> Result<Vec<ObjectId>, AppError> {
    let Some(items) = body.get("permissionIds").and_then(Value::as_array) else {
        return Err(AppError::Validation(NOT_AN_ARRAY.to_string()));
    };

    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(items.len());
    for item in items {
        let raw = item.as_str().ok_or_else(|| {
            AppError::Validation("permissionIds: every entry must be a string id".to_string())
        })?;
        let id = parse_object_id("permissionIds", raw)?;
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }

    Ok(ids)
}

#[utoipa::path(
    get,
    path = "/api/allroles",
    responses(
        (status = 200, description = "Every role with its permissions populated", body = RolesResponse),
        (status = 500, description = "Storage failure")
    ),
    tag = "Roles"
)]
pub async fn list_roles(State(state): State<AppState>) -> Result<Json<RolesResponse>, AppError> {
    let roles = state.repos.roles.list().await?;
    Ok(Json(RolesResponse { roles }))
}

#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Invalid name or description"),
        (status = 403, description = "Missing, invalid or expired token"),
        (status = 409, description = "Role name already taken")
    ),
    tag = "Roles"
)]
pub async fn create_role(
    State(state): State<AppState>,
    payload: Result<Json<CreateRoleRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    let payload = json_body(payload)?;
    let role = NewRole {
        name: validate_name("name", &payload.name, ROLE_NAME_MAX_LEN)?,
        description: checked_description(payload.description)?,
    };

    let created = state.repos.roles.create(role).await?;
    tracing::info!(role_id = %created.id, name = %created.name, "Role created");

    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/permissions/{id}/permissions",
    params(("id" = String, Path, description = "Role id")),
    request_body = UpdateRolePermissionsRequest,
    responses(
        (status = 200, description = "Role with its replaced permission list", body = Role),
        (status = 400, description = "Invalid role id, non-array body or unknown permission"),
        (status = 404, description = "Role not found")
    ),
    tag = "Roles"
)]
pub async fn update_role_permissions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Role>, AppError> {
    let role_id: ObjectId = id
        .parse()
        .map_err(|_| AppError::Validation("Invalid role id".to_string()))?;
    let body = json_body(payload)?;
    let permission_ids = permission_ids_from(&body)?;

    let role = state
        .repos
        .roles
        .set_permissions(&role_id, &permission_ids)
        .await?;
    tracing::info!(
        role_id = %role.id,
        permissions = role.permissions.len(),
        "Role permissions replaced"
    );

    Ok(Json(role))
}

#[utoipa::path(
    get,
    path = "/api/permissions",
    responses(
        (status = 200, description = "Every permission, by name", body = PermissionsResponse),
        (status = 500, description = "Storage failure")
    ),
    tag = "Roles"
)]
pub async fn list_permissions(
    State(state): State<AppState>,
) -> Result<Json<PermissionsResponse>, AppError> {
    let permissions = state.repos.permissions.list().await?;
    Ok(Json(PermissionsResponse { permissions }))
}

#[utoipa::path(
    post,
    path = "/api/permissions",
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = Permission),
        (status = 400, description = "Invalid name or description"),
        (status = 403, description = "Missing, invalid or expired token"),
        (status = 409, description = "Permission name already taken")
    ),
    tag = "Roles"
)]
pub async fn create_permission(
    State(state): State<AppState>,
    payload: Result<Json<CreatePermissionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Permission>), AppError> {
    let payload = json_body(payload)?;
    let permission = NewPermission {
        name: validate_name("name", &payload.name, PERMISSION_NAME_MAX_LEN)?,
        description: checked_description(payload.description)?,
    };

    let created = state.repos.permissions.create(permission).await?;
    tracing::info!(permission_id = %created.id, name = %created.name, "Permission created");

    Ok((StatusCode::CREATED, Json(created)))
}
