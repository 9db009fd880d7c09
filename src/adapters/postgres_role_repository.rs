//! Roles and permissions in Postgres.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};

use super::PostgresStore;
use crate::domain::{NewPermission, NewRole, ObjectId, Permission, Role};
use crate::ports::{PermissionRepository, RepositoryError, RepositoryResult, RoleRepository};

impl PostgresStore {
    async fn permissions_by_role(
        &self,
        role_ids: &[ObjectId],
    ) -> RepositoryResult<HashMap<ObjectId, Vec<Permission>>> {
        let ids: Vec<String> = role_ids.iter().map(ToString::to_string).collect();
        let rows = sqlx::query_as::<_, LinkedPermissionRow>(
            r#"
            SELECT rp.role_id, p.id, p.name, p.description, p.created_at
            FROM role_permissions rp
            JOIN permissions p ON p.id = rp.permission_id
            WHERE rp.role_id = ANY($1)
            ORDER BY rp.role_id, rp.position
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<ObjectId, Vec<Permission>> = HashMap::new();
        for row in rows {
            let (role_id, permission) = row.into_domain();
            grouped.entry(role_id).or_default().push(permission);
        }
        Ok(grouped)
    }

    async fn load_role(&self, id: &ObjectId) -> RepositoryResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, created_at, updated_at FROM roles WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("Role".to_string()))?;

        let mut permissions = self.permissions_by_role(std::slice::from_ref(id)).await?;
        Ok(row.into_domain(permissions.remove(id).unwrap_or_default()))
    }
}

#[async_trait]
impl RoleRepository for PostgresStore {
    async fn list(&self) -> RepositoryResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            "SELECT id, name, description, created_at, updated_at FROM roles ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<ObjectId> = rows.iter().map(|r| r.id.clone()).collect();
        let mut permissions = self.permissions_by_role(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let linked = permissions.remove(&row.id).unwrap_or_default();
                row.into_domain(linked)
            })
            .collect())
    }

    async fn create(&self, role: NewRole) -> RepositoryResult<Role> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            INSERT INTO roles (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(ObjectId::new())
        .bind(&role.name)
        .bind(&role.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Conflict(_) => RepositoryError::Conflict(format!("Role '{}'", role.name)),
            other => other,
        })?;

        Ok(row.into_domain(Vec::new()))
    }

    async fn set_permissions(
        &self,
        role_id: &ObjectId,
        permission_ids: &[ObjectId],
    ) -> RepositoryResult<Role> {
        let ids: Vec<String> = permission_ids.iter().map(ToString::to_string).collect();
        let distinct: BTreeSet<&str> = ids.iter().map(String::as_str).collect();

        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, ObjectId>("SELECT id FROM roles WHERE id = $1 FOR UPDATE")
            .bind(role_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound("Role".to_string()));
        }

        if !ids.is_empty() {
            let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permissions WHERE id = ANY($1)")
                .bind(&ids)
                .fetch_one(&mut *tx)
                .await?;
            if known as usize != distinct.len() {
                return Err(RepositoryError::InvalidReference("permission id".to_string()));
            }
        }

        sqlx::query("DELETE FROM role_permissions WHERE role_id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_id, permission_id, position)
            SELECT $1, t.permission_id, t.ord::INTEGER - 1
            FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS t(permission_id, ord)
            ON CONFLICT (role_id, permission_id) DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(&ids)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE roles SET updated_at = NOW() WHERE id = $1")
            .bind(role_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.load_role(role_id).await
    }
}

#[async_trait]
impl PermissionRepository for PostgresStore {
    async fn list(&self) -> RepositoryResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            "SELECT id, name, description, created_at FROM permissions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PermissionRow::into_domain).collect())
    }

    async fn create(&self, permission: NewPermission) -> RepositoryResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO permissions (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(ObjectId::new())
        .bind(&permission.name)
        .bind(&permission.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match RepositoryError::from(e) {
            RepositoryError::Conflict(_) => {
                RepositoryError::Conflict(format!("Permission '{}'", permission.name))
            }
            other => other,
        })?;

        Ok(row.into_domain())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RoleRow {
    id: ObjectId,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_domain(self, permissions: Vec<Permission>) -> Role {
        Role {
            id: self.id,
            name: self.name,
            description: self.description,
            permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PermissionRow {
    id: ObjectId,
    name: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl PermissionRow {
    fn into_domain(self) -> Permission {
        Permission {
            id: self.id,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LinkedPermissionRow {
    role_id: ObjectId,
    #[sqlx(flatten)]
    permission: PermissionRow,
}

impl LinkedPermissionRow {
    fn into_domain(self) -> (ObjectId, Permission) {
        (self.role_id, self.permission.into_domain())
    }
}
