//! In-process store used by tests and `serve --in-memory`.
//!
//! Mirrors the Postgres adapter's observable behavior: unique names and emails,
//! ordered permission links, populated references, newest-first listings.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::{
    ClockIn, NewClockIn, NewPermission, NewRole, NewTask, NewTaskActivity, NewUser, ObjectId,
    Permission, Role, Task, TaskActivity, UserCredentials, UserSummary,
};
use crate::ports::{
    ActivityRepository, ClockInRepository, PermissionRepository, RepositoryError,
    RepositoryResult, RoleRepository, TaskRepository, UserRepository,
};

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    permissions: Vec<Permission>,
    roles: Vec<RoleRecord>,
    users: Vec<UserRecord>,
    tasks: Vec<Task>,
    activities: Vec<ActivityRecord>,
    clock_ins: Vec<ClockIn>,
}

struct RoleRecord {
    id: ObjectId,
    name: String,
    description: Option<String>,
    permission_ids: Vec<ObjectId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

struct UserRecord {
    id: ObjectId,
    name: String,
    email: String,
    password_hash: String,
    role_id: ObjectId,
}

struct ActivityRecord {
    id: ObjectId,
    task: ObjectId,
    user: ObjectId,
    action: String,
    details: Option<String>,
    timestamp: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl State {
    fn populate_role(&self, record: &RoleRecord) -> Role {
        let permissions = record
            .permission_ids
            .iter()
            .filter_map(|id| self.permissions.iter().find(|p| &p.id == id).cloned())
            .collect();

        Role {
            id: record.id.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            permissions,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    fn user_summary(&self, id: &ObjectId) -> Option<UserSummary> {
        self.users.iter().find(|u| &u.id == id).map(|u| UserSummary {
            id: u.id.clone(),
            name: u.name.clone(),
            email: u.email.clone(),
        })
    }

    fn populate_activity(&self, record: &ActivityRecord) -> TaskActivity {
        TaskActivity {
            id: record.id.clone(),
            task: record.task.clone(),
            user: self.user_summary(&record.user),
            action: record.action.clone(),
            details: record.details.clone(),
            timestamp: record.timestamp,
        }
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn list(&self) -> RepositoryResult<Vec<Role>> {
        let state = self.state();
        Ok(state.roles.iter().map(|r| state.populate_role(r)).collect())
    }

    async fn create(&self, role: NewRole) -> RepositoryResult<Role> {
        let mut state = self.state();
        if state.roles.iter().any(|r| r.name == role.name) {
            return Err(RepositoryError::Conflict(format!("Role '{}'", role.name)));
        }

        let now = Utc::now();
        let record = RoleRecord {
            id: ObjectId::new(),
            name: role.name,
            description: role.description,
            permission_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let created = state.populate_role(&record);
        state.roles.push(record);
        Ok(created)
    }

    async fn set_permissions(
        &self,
        role_id: &ObjectId,
        permission_ids: &[ObjectId],
    ) -> RepositoryResult<Role> {
        let mut state = self.state();

        let index = state
            .roles
            .iter()
            .position(|r| &r.id == role_id)
            .ok_or_else(|| RepositoryError::NotFound("Role".to_string()))?;

        if permission_ids
            .iter()
            .any(|id| !state.permissions.iter().any(|p| &p.id == id))
        {
            return Err(RepositoryError::InvalidReference("permission id".to_string()));
        }

        let mut seen = HashSet::new();
        let ordered: Vec<ObjectId> = permission_ids
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();

        let record = &mut state.roles[index];
        record.permission_ids = ordered;
        record.updated_at = Utc::now();

        let state = &*state;
        Ok(state.populate_role(&state.roles[index]))
    }
}

#[async_trait]
impl PermissionRepository for MemoryStore {
    async fn list(&self) -> RepositoryResult<Vec<Permission>> {
        let mut permissions = self.state().permissions.clone();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(permissions)
    }

    async fn create(&self, permission: NewPermission) -> RepositoryResult<Permission> {
        let mut state = self.state();
        if state.permissions.iter().any(|p| p.name == permission.name) {
            return Err(RepositoryError::Conflict(format!(
                "Permission '{}'",
                permission.name
            )));
        }

        let created = Permission {
            id: ObjectId::new(),
            name: permission.name,
            description: permission.description,
            created_at: Utc::now(),
        };
        state.permissions.push(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<UserCredentials>> {
        let state = self.state();
        let Some(user) = state.users.iter().find(|u| u.email == email) else {
            return Ok(None);
        };
        let role = state
            .roles
            .iter()
            .find(|r| r.id == user.role_id)
            .map(|r| r.name.clone())
            .ok_or_else(|| RepositoryError::NotFound("Role".to_string()))?;

        Ok(Some(UserCredentials {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            role,
        }))
    }

    async fn create(&self, user: NewUser) -> RepositoryResult<UserSummary> {
        let mut state = self.state();
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict(format!("User '{}'", user.email)));
        }
        let role_id = state
            .roles
            .iter()
            .find(|r| r.name == user.role_name)
            .map(|r| r.id.clone())
            .ok_or_else(|| RepositoryError::InvalidReference(format!("role '{}'", user.role_name)))?;

        let record = UserRecord {
            id: ObjectId::new(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role_id,
        };
        let summary = UserSummary {
            id: record.id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
        };
        state.users.push(record);
        Ok(summary)
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn create(&self, task: NewTask) -> RepositoryResult<Task> {
        let now = Utc::now();
        let created = Task {
            id: ObjectId::new(),
            title: task.title,
            description: task.description,
            status: task.status,
            priority: task.priority,
            created_by: Some(task.created_by),
            created_at: now,
            updated_at: now,
        };
        self.state().tasks.push(created.clone());
        Ok(created)
    }

    async fn get(&self, id: &ObjectId) -> RepositoryResult<Task> {
        self.state()
            .tasks
            .iter()
            .find(|t| &t.id == id)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound("Task".to_string()))
    }
}

#[async_trait]
impl ActivityRepository for MemoryStore {
    async fn list_for_task(&self, task_id: &ObjectId) -> RepositoryResult<Vec<TaskActivity>> {
        let state = self.state();
        let mut records: Vec<&ActivityRecord> = state
            .activities
            .iter()
            .filter(|a| &a.task == task_id)
            .collect();
        // Stable sort keeps later insertions first among equal timestamps.
        records.reverse();
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(records.into_iter().map(|r| state.populate_activity(r)).collect())
    }

    async fn record(&self, activity: NewTaskActivity) -> RepositoryResult<TaskActivity> {
        let mut state = self.state();
        if !state.tasks.iter().any(|t| t.id == activity.task) {
            return Err(RepositoryError::InvalidReference("task".to_string()));
        }

        let record = ActivityRecord {
            id: ObjectId::new(),
            task: activity.task,
            user: activity.user,
            action: activity.action,
            details: activity.details,
            timestamp: Utc::now(),
        };
        let created = state.populate_activity(&record);
        state.activities.push(record);
        Ok(created)
    }
}

#[async_trait]
impl ClockInRepository for MemoryStore {
    async fn record(&self, clock_in: NewClockIn) -> RepositoryResult<ClockIn> {
        let created = ClockIn {
            id: ObjectId::new(),
            user: clock_in.user,
            latitude: clock_in.latitude,
            longitude: clock_in.longitude,
            note: clock_in.note,
            clocked_in_at: Utc::now(),
        };
        self.state().clock_ins.push(created.clone());
        Ok(created)
    }

    async fn list_for_user(&self, user_id: &ObjectId) -> RepositoryResult<Vec<ClockIn>> {
        let mut found: Vec<ClockIn> = self
            .state()
            .clock_ins
            .iter()
            .rev()
            .filter(|c| &c.user == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.clocked_in_at.cmp(&a.clocked_in_at));
        Ok(found)
    }
}
