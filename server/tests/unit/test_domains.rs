//! Domain endpoints

use axum::http::StatusCode;
use serde_json::json;
use xistra::app::options::AuthOptions;

use crate::common::{test_app, test_app_with, ScriptedRunner};

#[tokio::test]
async fn test_malformed_domain_is_400() {
    let app = test_app().await;
    for domain in ["not a domain", "localhost", "-bad.com", ""] {
        let (status, body) = app
            .request("POST", "/domains", Some(json!({ "domain": domain })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{domain}");
        assert_eq!(body["error"], "Invalid domain format");
    }
}

#[tokio::test]
async fn test_duplicate_domain_is_409() {
    let app = test_app().await;
    let (status, body) = app
        .request("POST", "/domains", Some(json!({ "domain": "App.Example.com" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["domain"], "app.example.com");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["ssl_enabled"], true);

    let (status, body) = app
        .request("POST", "/domains", Some(json!({ "domain": "app.example.com" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Domain already exists");
}

#[tokio::test]
async fn test_domain_for_unknown_project_is_404() {
    let app = test_app().await;
    let (status, _) = app
        .request(
            "POST",
            "/domains",
            Some(json!({ "domain": "a.example.com", "project_id": uuid::Uuid::new_v4() })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_verify_domain() {
    let app = test_app().await;
    let (_, body) = app
        .request("POST", "/domains", Some(json!({ "domain": "shop.example.com" })))
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request("POST", &format!("/domains/{id}/verify"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "verified");
    assert!(body["data"]["verified_at"].is_string());
    assert_eq!(body["data"]["dns_records"]["A"][0], "203.0.113.7");

    // Already verified domains are returned unchanged
    let (status, again) = app
        .request("POST", &format!("/domains/{id}/verify"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["data"]["verified_at"], body["data"]["verified_at"]);
}

#[tokio::test]
async fn test_unresolvable_domain_fails_and_can_retry() {
    let app = test_app_with(ScriptedRunner::healthy(), false, AuthOptions::disabled()).await;
    let (_, body) = app
        .request("POST", "/domains", Some(json!({ "domain": "nowhere.example.org" })))
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    for _ in 0..2 {
        let (status, body) = app
            .request("POST", &format!("/domains/{id}/verify"), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "failed");
        assert!(body["data"]["verified_at"].is_null());
    }
}

#[tokio::test]
async fn test_delete_domain() {
    let app = test_app().await;
    let (_, body) = app
        .request("POST", "/domains", Some(json!({ "domain": "old.example.net" })))
        .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app.request("DELETE", &format!("/domains/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.request("DELETE", &format!("/domains/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.request("GET", "/domains", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}
