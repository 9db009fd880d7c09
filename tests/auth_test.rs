mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;

use common::{spawn_app, spawn_app_with, PASSWORD, SECRET};
use taskdesk::adapters::MemoryStore;
use taskdesk::auth::{AllowlistPolicy, Claims};
use taskdesk::domain::ObjectId;
use taskdesk::error::ACCESS_DENIED_MESSAGE;
use taskdesk::ports::Repositories;

fn signed(secret: &str, role: &str, exp_offset_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        user_id: ObjectId::new().to_string(),
        role: role.to_string(),
        iat: now,
        exp: now + exp_offset_secs,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
}

#[tokio::test]
async fn logout_clears_cookie_without_incoming_cookie() {
    let app = spawn_app();

    let res = app.request(Method::POST, "/api/auth/logout", None, None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["message"], "Logged out successfully");
    let cookie = res.set_cookie().unwrap();
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
}

#[tokio::test]
async fn logout_clears_cookie_with_incoming_cookie() {
    let app = spawn_app();
    let token = app.token_for(&ObjectId::new(), "admin");

    let res = app
        .request(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert!(res.set_cookie().unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn gate_echoes_role_regardless_of_allowed_set() {
    let app = spawn_app();
    let token = app.token_for(&ObjectId::new(), "intern");

    let res = app.get("/api/auth/role", Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!("intern"));

    // `/api/auth/admin` is bound to `admin`, but the default policy admits any valid token.
    let res = app.get("/api/auth/admin", Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!("intern"));
}

#[tokio::test]
async fn enforced_allowlist_denies_roles_outside_the_set() {
    let app = spawn_app_with(
        Repositories::from_store(MemoryStore::new()),
        AllowlistPolicy::Enforce,
    );

    let intern = app.token_for(&ObjectId::new(), "intern");
    let res = app.get("/api/auth/admin", Some(&intern)).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body["message"], ACCESS_DENIED_MESSAGE);

    let admin = app.token_for(&ObjectId::new(), "admin");
    let res = app.get("/api/auth/admin", Some(&admin)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!("admin"));
}

#[tokio::test]
async fn gate_denies_bad_tokens_with_fixed_message() {
    let app = spawn_app();
    let cases = [
        None,
        Some(String::new()),
        Some("not-a-jwt".to_string()),
        Some(signed("some_other_secret", "admin", 3600)),
        Some(signed(SECRET, "admin", -3600)),
    ];

    for token in cases {
        let res = app.get("/api/auth/role", token.as_deref()).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "token {:?}", token);
        assert_eq!(res.body["message"], ACCESS_DENIED_MESSAGE);
        assert_eq!(res.body["status"], 403);
    }
}

#[tokio::test]
async fn login_sets_cookie_usable_by_the_gate() {
    let app = spawn_app();
    let user = app.seed_user("ana@example.com", "manager").await;

    let res = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "Ana@Example.com", "password": PASSWORD }),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["success"], true);
    assert_eq!(res.body["user"]["_id"], user.id.as_str());
    assert_eq!(res.body["user"]["role"], "manager");
    assert!(res.body["user"].get("passwordHash").is_none());

    let cookie = res.set_cookie().unwrap();
    assert!(cookie.contains("Max-Age=3600"));
    let token = cookie
        .strip_prefix("token=")
        .and_then(|rest| rest.split(';').next())
        .unwrap();

    let res = app.get("/api/auth/role", Some(token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, json!("manager"));
}

#[tokio::test]
async fn login_rejects_bad_credentials() {
    let app = spawn_app();
    app.seed_user("ana@example.com", "manager").await;

    let wrong_password = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "ana@example.com", "password": "wrong-password" }),
        )
        .await;
    let unknown_email = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": "bo@example.com", "password": PASSWORD }),
        )
        .await;

    for res in [wrong_password, unknown_email] {
        assert_eq!(res.status, StatusCode::UNAUTHORIZED);
        assert_eq!(res.body["message"], "Invalid email or password");
        assert!(res.set_cookie().is_none());
    }
}

#[tokio::test]
async fn login_rejects_malformed_body() {
    let app = spawn_app();

    let res = app
        .post("/api/auth/login", None, json!({ "email": "ana@example.com" }))
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}
