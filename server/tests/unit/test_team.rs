use axum::http::StatusCode;
use serde_json::json;

use crate::common::test_app;

#[tokio::test]
async fn test_admin_is_seeded_as_owner() {
    let app = test_app().await;
    let (status, body) = app.request("GET", "/team", None).await;
    assert_eq!(status, StatusCode::OK);
    let members = body["data"]["members"].as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["role"], "owner");
    assert_eq!(members[0]["email"], app.state.auth.admin_email());
}

#[tokio::test]
async fn test_invitations() {
    let app = test_app().await;

    let (status, body) = app
        .request(
            "POST",
            "/team/invitations",
            Some(json!({ "email": "Dev@Acme.io", "role": "admin" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["email"], "dev@acme.io");
    assert_eq!(body["data"]["role"], "admin");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["token"].as_str().unwrap().len(), 64);

    let (status, _) = app
        .request("POST", "/team/invitations", Some(json!({ "email": "dev@acme.io" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let owner = app.state.auth.admin_email().to_string();
    let (status, _) = app
        .request("POST", "/team/invitations", Some(json!({ "email": owner })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.request("GET", "/team", None).await;
    assert_eq!(body["data"]["invitations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_invitations() {
    let app = test_app().await;
    for body in [
        json!({ "email": "not-an-email" }),
        json!({ "email": "x@acme.io", "role": "owner" }),
        json!({ "email": "x@acme.io", "role": "superuser" }),
    ] {
        let (status, _) = app.request("POST", "/team/invitations", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn test_last_owner_cannot_be_removed() {
    let app = test_app().await;
    let (_, body) = app.request("GET", "/team", None).await;
    let owner_id = body["data"]["members"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request("DELETE", &format!("/team/{owner_id}"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Cannot remove the last owner");

    let (status, _) = app
        .request("DELETE", &format!("/team/{}", uuid::Uuid::new_v4()), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
