//! Storage ports. Handlers depend on these traits, never on a concrete store.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{
    ClockIn, NewClockIn, NewPermission, NewRole, NewTask, NewTaskActivity, NewUser, ObjectId,
    Permission, Role, Task, TaskActivity, UserCredentials, UserSummary,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    Conflict(String),

    #[error("unknown reference: {0}")]
    InvalidReference(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return RepositoryError::Conflict(
                        db_err.constraint().unwrap_or("unique constraint").to_string(),
                    )
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    let constraint = db_err.constraint();
                    tracing::debug!(constraint = ?constraint, "Foreign key violation");
                    return RepositoryError::InvalidReference(
                        referenced_entity(constraint).to_string(),
                    );
                }
                _ => {}
            }
        }
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("row".to_string()),
            other => RepositoryError::Database(other),
        }
    }
}

/// Names the record a foreign key points at, from the `<table>_<column>_fkey`
/// constraint name. The constraint itself never leaves the server.
fn referenced_entity(constraint: Option<&str>) -> &'static str {
    let column = constraint
        .and_then(|name| name.strip_suffix("_fkey"))
        .unwrap_or_default();

    if column.ends_with("_created_by") || column.ends_with("_user_id") {
        "user"
    } else if column.ends_with("_task_id") {
        "task"
    } else if column.ends_with("_permission_id") {
        "permission"
    } else if column.ends_with("_role_id") {
        "role"
    } else {
        "record"
    }
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// All roles with permissions populated, oldest first.
    async fn list(&self) -> RepositoryResult<Vec<Role>>;

    async fn create(&self, role: NewRole) -> RepositoryResult<Role>;

    /// Replaces the role's permission list with `permission_ids`, in order.
    async fn set_permissions(
        &self,
        role_id: &ObjectId,
        permission_ids: &[ObjectId],
    ) -> RepositoryResult<Role>;
}

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn list(&self) -> RepositoryResult<Vec<Permission>>;

    async fn create(&self, permission: NewPermission) -> RepositoryResult<Permission>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_credentials_by_email(&self, email: &str)
        -> RepositoryResult<Option<UserCredentials>>;

    async fn create(&self, user: NewUser) -> RepositoryResult<UserSummary>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn create(&self, task: NewTask) -> RepositoryResult<Task>;

    async fn get(&self, id: &ObjectId) -> RepositoryResult<Task>;
}

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Activity for a task with users populated, newest first.
    async fn list_for_task(&self, task_id: &ObjectId) -> RepositoryResult<Vec<TaskActivity>>;

    async fn record(&self, activity: NewTaskActivity) -> RepositoryResult<TaskActivity>;
}

#[async_trait]
pub trait ClockInRepository: Send + Sync {
    async fn record(&self, clock_in: NewClockIn) -> RepositoryResult<ClockIn>;

    /// Newest first.
    async fn list_for_user(&self, user_id: &ObjectId) -> RepositoryResult<Vec<ClockIn>>;
}

/// The full set of collections a running service talks to.
#[derive(Clone)]
pub struct Repositories {
    pub roles: Arc<dyn RoleRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tasks: Arc<dyn TaskRepository>,
    pub activity: Arc<dyn ActivityRepository>,
    pub clock_ins: Arc<dyn ClockInRepository>,
}

impl Repositories {
    /// Backs every collection with the same store.
    pub fn from_store<S>(store: S) -> Self
    where
        S: RoleRepository
            + PermissionRepository
            + UserRepository
            + TaskRepository
            + ActivityRepository
            + ClockInRepository
            + 'static,
    {
        let store = Arc::new(store);
        Self {
            roles: store.clone(),
            permissions: store.clone(),
            users: store.clone(),
            tasks: store.clone(),
            activity: store.clone(),
            clock_ins: store,
        }
    }
}
