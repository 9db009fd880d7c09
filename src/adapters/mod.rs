//! Concrete stores behind the repository ports.

mod memory_store;
mod postgres_activity_repository;
mod postgres_clock_in_repository;
mod postgres_role_repository;
mod postgres_task_repository;
mod postgres_user_repository;

use sqlx::PgPool;

pub use memory_store::MemoryStore;

/// Postgres-backed store implementing every repository port.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
