//! Clock-ins in Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::PostgresStore;
use crate::domain::{ClockIn, NewClockIn, ObjectId};
use crate::ports::{ClockInRepository, RepositoryResult};

#[async_trait]
impl ClockInRepository for PostgresStore {
    async fn record(&self, clock_in: NewClockIn) -> RepositoryResult<ClockIn> {
        let row = sqlx::query_as::<_, ClockInRow>(
            r#"
            INSERT INTO clock_ins (id, user_id, latitude, longitude, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, latitude, longitude, note, clocked_in_at
            "#,
        )
        .bind(ObjectId::new())
        .bind(&clock_in.user)
        .bind(clock_in.latitude)
        .bind(clock_in.longitude)
        .bind(&clock_in.note)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn list_for_user(&self, user_id: &ObjectId) -> RepositoryResult<Vec<ClockIn>> {
        let rows = sqlx::query_as::<_, ClockInRow>(
            r#"
            SELECT id, user_id, latitude, longitude, note, clocked_in_at
            FROM clock_ins
            WHERE user_id = $1
            ORDER BY clocked_in_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClockInRow {
    id: ObjectId,
    user_id: ObjectId,
    latitude: f64,
    longitude: f64,
    note: Option<String>,
    clocked_in_at: DateTime<Utc>,
}

impl From<ClockInRow> for ClockIn {
    fn from(row: ClockInRow) -> Self {
        ClockIn {
            id: row.id,
            user: row.user_id,
            latitude: row.latitude,
            longitude: row.longitude,
            note: row.note,
            clocked_in_at: row.clocked_in_at,
        }
    }
}
