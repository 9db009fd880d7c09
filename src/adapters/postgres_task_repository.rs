//! Tasks in Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::PostgresStore;
use crate::domain::{NewTask, ObjectId, Task};
use crate::ports::{RepositoryError, RepositoryResult, TaskRepository};

#[async_trait]
impl TaskRepository for PostgresStore {
    async fn create(&self, task: NewTask) -> RepositoryResult<Task> {
        let row = sqlx::query_as::<_, TaskRow>(
            r#"
            INSERT INTO tasks (id, title, description, status, priority, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, status, priority, created_by, created_at, updated_at
            "#,
        )
        .bind(ObjectId::new())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(task.priority.as_str())
        .bind(&task.created_by)
        .fetch_one(&self.pool)
        .await?;

        row.try_into_domain()
    }

    async fn get(&self, id: &ObjectId) -> RepositoryResult<Task> {
        sqlx::query_as::<_, TaskRow>(
            r#"
            SELECT id, title, description, status, priority, created_by, created_at, updated_at
            FROM tasks WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Task".to_string()))?
        .try_into_domain()
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: ObjectId,
    title: String,
    description: Option<String>,
    status: String,
    priority: String,
    created_by: Option<ObjectId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TaskRow {
    fn try_into_domain(self) -> RepositoryResult<Task> {
        let status = self.status.parse().map_err(decode_error)?;
        let priority = self.priority.parse().map_err(decode_error)?;

        Ok(Task {
            id: self.id,
            title: self.title,
            description: self.description,
            status,
            priority,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn decode_error(message: String) -> RepositoryError {
    RepositoryError::Database(sqlx::Error::Decode(message.into()))
}
