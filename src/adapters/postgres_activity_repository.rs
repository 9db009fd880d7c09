//! Task activity in Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::PostgresStore;
use crate::domain::{NewTaskActivity, ObjectId, TaskActivity, UserSummary};
use crate::ports::{ActivityRepository, RepositoryResult};

#[async_trait]
impl ActivityRepository for PostgresStore {
    async fn list_for_task(&self, task_id: &ObjectId) -> RepositoryResult<Vec<TaskActivity>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT a.id, a.task_id, a.action, a.details, a.occurred_at,
                   u.id AS user_id, u.name AS user_name, u.email AS user_email
            FROM task_activities a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.task_id = $1
            ORDER BY a.occurred_at DESC, a.id DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ActivityRow::into_domain).collect())
    }

    async fn record(&self, activity: NewTaskActivity) -> RepositoryResult<TaskActivity> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            WITH inserted AS (
                INSERT INTO task_activities (id, task_id, user_id, action, details)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, task_id, user_id, action, details, occurred_at
            )
            SELECT a.id, a.task_id, a.action, a.details, a.occurred_at,
                   u.id AS user_id, u.name AS user_name, u.email AS user_email
            FROM inserted a
            LEFT JOIN users u ON u.id = a.user_id
            "#,
        )
        .bind(ObjectId::new())
        .bind(&activity.task)
        .bind(&activity.user)
        .bind(&activity.action)
        .bind(&activity.details)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_domain())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ActivityRow {
    id: ObjectId,
    task_id: ObjectId,
    action: String,
    details: Option<String>,
    occurred_at: DateTime<Utc>,
    user_id: Option<ObjectId>,
    user_name: Option<String>,
    user_email: Option<String>,
}

impl ActivityRow {
    fn into_domain(self) -> TaskActivity {
        let user = match (self.user_id, self.user_name, self.user_email) {
            (Some(id), Some(name), Some(email)) => Some(UserSummary { id, name, email }),
            _ => None,
        };

        TaskActivity {
            id: self.id,
            task: self.task_id,
            user,
            action: self.action,
            details: self.details,
            timestamp: self.occurred_at,
        }
    }
}
