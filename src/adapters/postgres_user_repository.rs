//! Users in Postgres.

use async_trait::async_trait;

use super::PostgresStore;
use crate::domain::{NewUser, ObjectId, UserCredentials, UserSummary};
use crate::ports::{RepositoryError, RepositoryResult, UserRepository};

#[async_trait]
impl UserRepository for PostgresStore {
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, CredentialsRow>(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, r.name AS role
            FROM users u
            JOIN roles r ON r.id = u.role_id
            WHERE u.email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CredentialsRow::into_domain))
    }

    async fn create(&self, user: NewUser) -> RepositoryResult<UserSummary> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r#"
            INSERT INTO users (id, name, email, password_hash, role_id)
            SELECT $1, $2, $3, $4, r.id FROM roles r WHERE r.name = $5
            RETURNING id, name, email
            "#,
        )
        .bind(ObjectId::new())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Conflict(_) => RepositoryError::Conflict(format!("User '{}'", user.email)),
            other => other,
        })?
        .ok_or_else(|| RepositoryError::InvalidReference(format!("role '{}'", user.role_name)))?;

        Ok(UserSummary {
            id: row.id,
            name: row.name,
            email: row.email,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialsRow {
    id: ObjectId,
    name: String,
    email: String,
    password_hash: String,
    role: String,
}

impl CredentialsRow {
    fn into_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: ObjectId,
    name: String,
    email: String,
}
