use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use utoipa::ToSchema;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, DependencyStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum DependencyStatus {
    Healthy { status: String, latency_ms: u64 },
    Unhealthy { status: String, error: String },
}

impl DependencyStatus {
    fn unhealthy(error: impl Into<String>) -> Self {
        DependencyStatus::Unhealthy {
            status: "unhealthy".to_string(),
            error: error.into(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, DependencyStatus::Healthy { .. })
    }
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    async fn check(&self) -> DependencyStatus;
}

pub struct PostgresChecker {
    pool: sqlx::PgPool,
}

impl PostgresChecker {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependencyChecker for PostgresChecker {
    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => DependencyStatus::Healthy {
                status: "healthy".to_string(),
                latency_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => {
                tracing::warn!("Postgres health check failed: {}", e);
                DependencyStatus::unhealthy("database unreachable")
            }
        }
    }
}

/// A named dependency. A failing critical dependency makes the service
/// unhealthy; any other failure only degrades it.
#[derive(Clone)]
pub struct Dependency {
    pub name: &'static str,
    pub critical: bool,
    pub checker: Arc<dyn DependencyChecker>,
}

pub async fn check_health(dependencies: &[Dependency], start_time: Instant) -> HealthResponse {
    let mut results = HashMap::new();
    let mut has_critical_failure = false;
    let mut has_non_critical_failure = false;

    for dependency in dependencies {
        let status = timeout(CHECK_TIMEOUT, dependency.checker.check())
            .await
            .unwrap_or_else(|_| DependencyStatus::unhealthy("timeout"));

        if !status.is_healthy() {
            if dependency.critical {
                has_critical_failure = true;
            } else {
                has_non_critical_failure = true;
            }
        }
        results.insert(dependency.name.to_string(), status);
    }

    let status = if has_critical_failure {
        "unhealthy"
    } else if has_non_critical_failure {
        "degraded"
    } else {
        "healthy"
    };

    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: start_time.elapsed().as_secs(),
        dependencies: results,
    }
}
