#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

use taskdesk::adapters::MemoryStore;
use taskdesk::auth::{password::hash_password, AllowlistPolicy, AuthContext};
use taskdesk::domain::{NewPermission, NewRole, NewUser, ObjectId, Permission, Role, UserSummary};
use taskdesk::ports::Repositories;
use taskdesk::{create_app, AppState, HttpSettings};

pub const SECRET: &str = "integration_test_secret";
pub const PASSWORD: &str = "correct-horse-battery";

pub struct TestApp {
    pub router: Router,
    pub repos: Repositories,
    pub auth: AuthContext,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
    }
}

pub fn auth_context(policy: AllowlistPolicy) -> AuthContext {
    AuthContext::new(SECRET, Duration::from_secs(3600), false, policy)
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(Repositories::from_store(MemoryStore::new()), AllowlistPolicy::Ignore)
}

pub fn spawn_app_with(repos: Repositories, policy: AllowlistPolicy) -> TestApp {
    let auth = auth_context(policy);
    let state = AppState::new(repos.clone(), auth.clone(), Vec::new());
    let router = create_app(state, &HttpSettings::default());

    TestApp { router, repos, auth }
}

impl TestApp {
    pub fn token_for(&self, user_id: &ObjectId, role: &str) -> String {
        self.auth.codec.issue(user_id, role).unwrap()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PUT, uri, None, Some(body)).await
    }

    pub async fn seed_role(&self, name: &str) -> Role {
        self.repos
            .roles
            .create(NewRole {
                name: name.to_string(),
                description: None,
            })
            .await
            .unwrap()
    }

    pub async fn seed_permission(&self, name: &str) -> Permission {
        self.repos
            .permissions
            .create(NewPermission {
                name: name.to_string(),
                description: None,
            })
            .await
            .unwrap()
    }

    /// Creates a user holding `role`, creating the role first if needed.
    pub async fn seed_user(&self, email: &str, role: &str) -> UserSummary {
        let roles = self.repos.roles.list().await.unwrap();
        if !roles.iter().any(|r| r.name == role) {
            self.seed_role(role).await;
        }

        self.repos
            .users
            .create(NewUser {
                name: "Test User".to_string(),
                email: email.to_string(),
                password_hash: hash_password(PASSWORD).unwrap(),
                role_name: role.to_string(),
            })
            .await
            .unwrap()
    }
}
