//! Login and bearer-token enforcement

use std::time::Duration;

use axum::http::StatusCode;
use secrecy::SecretString;
use serde_json::json;
use xistra::app::options::AuthOptions;
use xistra::authn::token::JwtKeys;

use crate::common::{test_app_with, ScriptedRunner, TestApp};

const SECRET: &str = "test-signing-secret";

async fn secured_app() -> TestApp {
    let auth = AuthOptions {
        required: true,
        jwt_secret: SecretString::from(SECRET.to_string()),
        admin_email: "admin@xistra.local".to_string(),
        admin_password: Some(SecretString::from("hunter2".to_string())),
        token_ttl: Duration::from_secs(3600),
    };
    test_app_with(ScriptedRunner::healthy(), true, auth).await
}

#[tokio::test]
async fn test_public_routes_need_no_token() {
    let app = secured_app().await;
    let (status, body) = app.request("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, _) = app.request("GET", "/apps/templates", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token() {
    let app = secured_app().await;
    let (status, body) = app.request("GET", "/projects", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "MISSING_TOKEN");
}

#[tokio::test]
async fn test_login_and_use_token() {
    let app = secured_app().await;

    let (status, body) = app
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "email": "admin@xistra.local", "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    let (status, body) = app
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "email": "Admin@Xistra.local", "password": "hunter2" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["token_type"], "Bearer");
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .request_with_token("GET", "/projects", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_foreign_and_expired_tokens() {
    let app = secured_app().await;

    let foreign = JwtKeys::new(&SecretString::from("someone-else".to_string()))
        .issue("admin@xistra.local", "owner", chrono::Duration::hours(1))
        .unwrap();
    let (status, body) = app
        .request_with_token("GET", "/projects", None, Some(&foreign.raw))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");

    let expired = JwtKeys::new(&SecretString::from(SECRET.to_string()))
        .issue("admin@xistra.local", "owner", chrono::Duration::hours(-2))
        .unwrap();
    let (status, body) = app
        .request_with_token("GET", "/projects", None, Some(&expired.raw))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_login_disabled_without_password() {
    let app = crate::common::test_app().await;
    let (status, body) = app
        .request(
            "POST",
            "/auth/login",
            Some(json!({ "email": "admin@xistra.local", "password": "anything" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIALS");
}
