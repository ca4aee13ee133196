//! Backup endpoints

use axum::http::StatusCode;
use serde_json::json;

use crate::common::{test_app, CONTAINER_ID};

#[tokio::test]
async fn test_database_backup_lifecycle() {
    let app = test_app().await;
    app.create_project("kept").await;

    // No body at all means a database backup
    let (status, body) = app.request("POST", "/backups", None).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let data = &body["data"];
    assert_eq!(data["backup_type"], "database");
    assert_eq!(data["status"], "completed");
    assert!(data["size_bytes"].as_i64().unwrap() > 0);
    assert!(data["name"].as_str().unwrap().starts_with("database-"));

    let location = std::path::PathBuf::from(data["location"].as_str().unwrap());
    assert!(location.starts_with(&app.backup_dir));
    assert!(location.exists());

    let id = data["id"].as_str().unwrap().to_string();
    let (status, _) = app.request("DELETE", &format!("/backups/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!location.exists());

    let (status, _) = app.request("DELETE", &format!("/backups/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_project_backup_commits_container() {
    let app = test_app().await;
    let (status, body) = app
        .request(
            "POST",
            "/apps/deploy",
            Some(json!({ "name": "blog", "repository_url": "https://github.com/acme/blog.git" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let project_id = body["data"]["project"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .request(
            "POST",
            "/backups",
            Some(json!({ "backup_type": "project", "project_id": project_id, "name": "nightly" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["name"], "nightly");
    assert!(body["data"]["location"]
        .as_str()
        .unwrap()
        .starts_with("xistra-backup/blog:"));
    assert_eq!(app.runner.count("docker", &["commit", CONTAINER_ID]), 1);
}

#[tokio::test]
async fn test_failed_commit_is_recorded() {
    let app = test_app().await;
    let (_, body) = app
        .request(
            "POST",
            "/apps/deploy",
            Some(json!({ "name": "api", "repository_url": "https://github.com/acme/api.git" })),
        )
        .await;
    let project_id = body["data"]["project"]["id"].as_str().unwrap().to_string();

    app.runner.on(
        "docker",
        &["commit"],
        xistra::deploy::cmd::CommandOutput::failed("No such container"),
    );
    let (status, body) = app
        .request(
            "POST",
            "/backups",
            Some(json!({ "backup_type": "project", "project_id": project_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "failed");
    assert!(body["data"]["error"]
        .as_str()
        .unwrap()
        .contains("No such container"));
}

#[tokio::test]
async fn test_invalid_backup_requests() {
    let app = test_app().await;

    let (status, _) = app
        .request("POST", "/backups", Some(json!({ "backup_type": "project" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .request("POST", "/backups", Some(json!({ "backup_type": "tarball" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid backup type: tarball");

    // A project that was never deployed has nothing to commit
    let id = app.create_project("idle").await;
    let (status, _) = app
        .request(
            "POST",
            "/backups",
            Some(json!({ "backup_type": "project", "project_id": id })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app.request("GET", "/backups", None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}
