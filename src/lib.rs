pub mod adapters;
pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod docs;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod ports;
pub mod startup;
pub mod utils;
pub mod validation;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{role_gate, AuthContext, RoleGate};
use crate::config::Config;
use crate::docs::{ApiDoc, OPENAPI_JSON_PATH};
use crate::handlers::{auth as auth_handlers, clock_ins, roles, tasks};
use crate::health::Dependency;
use crate::middleware::{request_logger_middleware, RequestLogSettings};
use crate::ports::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub auth: AuthContext,
    pub dependencies: Arc<[Dependency]>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(repos: Repositories, auth: AuthContext, dependencies: Vec<Dependency>) -> Self {
        Self {
            repos,
            auth,
            dependencies: dependencies.into(),
            start_time: Instant::now(),
        }
    }
}

/// Router-level options that do not belong in request state.
#[derive(Debug, Clone, Default)]
pub struct HttpSettings {
    pub log_request_body: bool,
    pub allowed_origins: Vec<String>,
}

impl HttpSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            log_request_body: config.log_request_body,
            allowed_origins: config.allowed_origins(),
        }
    }
}

fn guarded(route: MethodRouter<AppState>, gate: RoleGate) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(gate, role_gate::require_role))
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

pub fn create_app(state: AppState, settings: &HttpSettings) -> Router {
    let any_role = state.auth.any_role();
    let admin_only = state.auth.gate(["admin"]);

    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/auth/login", post(auth_handlers::login))
        .route("/api/auth/logout", post(auth_handlers::logout))
        .route(
            "/api/auth/role",
            get(role_gate::respond).with_state(any_role.clone()),
        )
        .route(
            "/api/auth/admin",
            get(role_gate::respond).with_state(admin_only.clone()),
        )
        .route("/api/allroles", get(roles::list_roles))
        .route(
            "/api/roles",
            guarded(post(roles::create_role), admin_only.clone()),
        )
        .route(
            "/api/permissions",
            get(roles::list_permissions)
                .merge(guarded(post(roles::create_permission), admin_only)),
        )
        .route(
            "/api/permissions/:id/permissions",
            axum::routing::put(roles::update_role_permissions),
        )
        .route(
            "/api/tasks",
            guarded(post(tasks::create_task), any_role.clone()),
        )
        .route("/api/tasks/:id", get(tasks::get_task))
        .route(
            "/api/tasks/:id/activity",
            get(tasks::list_activity).merge(guarded(post(tasks::record_activity), any_role.clone())),
        )
        .route(
            "/api/clockins",
            guarded(
                get(clock_ins::list_my_clock_ins).post(clock_ins::clock_in),
                any_role,
            ),
        )
        .merge(SwaggerUi::new("/docs").url(OPENAPI_JSON_PATH, ApiDoc::openapi()))
        .with_state(state)
        .layer(from_fn_with_state(
            RequestLogSettings {
                log_body: settings.log_request_body,
            },
            request_logger_middleware,
        ));

    if let Some(cors) = cors_layer(&settings.allowed_origins) {
        app = app.layer(cors);
    }

    app
}
