//! Project endpoints and the deploy flow

use axum::http::StatusCode;
use serde_json::json;
use xistra::deploy::cmd::CommandOutput;
use xistra::models::deployment::Deployment;
use xistra::models::project::{Project, ProjectStatus};

use xistra::app::options::AuthOptions;

use crate::common::{test_app, test_app_with, ScriptedRunner, CONTAINER_ID};

#[tokio::test]
async fn test_create_project_returns_201() {
    let app = test_app().await;
    let (status, body) = app
        .request(
            "POST",
            "/projects",
            Some(json!({ "name": "  Blog  ", "repository_url": "https://github.com/acme/blog.git" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Blog");
    assert_eq!(body["data"]["status"], "pending");

    let (status, body) = app.request("GET", "/projects", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_project_validation() {
    let app = test_app().await;

    let (status, body) = app
        .request("POST", "/projects", Some(json!({ "name": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .request(
            "POST",
            "/projects",
            Some(json!({ "name": "x", "repository_url": "not a url" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .request("POST", "/projects", Some(json!({ "nom": "missing name" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_project_name_conflicts() {
    let app = test_app().await;
    app.create_project("blog").await;
    let (status, body) = app
        .request("POST", "/projects", Some(json!({ "name": "blog" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A project with this name already exists");
}

#[tokio::test]
async fn test_missing_project_is_404() {
    let app = test_app().await;
    let missing = uuid::Uuid::new_v4();

    let (status, body) = app.request("GET", &format!("/projects/{missing}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Project not found");

    let (status, _) = app
        .request("DELETE", &format!("/projects/{missing}"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_project_cascades() {
    let app = test_app().await;
    let id = app.create_project("shop").await;

    let (status, _) = app
        .request(
            "POST",
            "/domains",
            Some(json!({ "domain": "shop.example.com", "project_id": id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app
        .request(
            "POST",
            &format!("/projects/{id}/env"),
            Some(json!({ "key": "API_KEY", "value": "secret", "is_secret": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request("DELETE", &format!("/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id.as_str());

    let pool = &app.state.db.pool;
    let domains: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domains")
        .fetch_one(pool)
        .await
        .unwrap();
    let vars: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM environment_variables")
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(domains, 0);
    assert_eq!(vars, 0);

    let (status, _) = app.request("GET", &format!("/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deploy_records_outcome() {
    let app = test_app().await;
    let (status, body) = app
        .request(
            "POST",
            "/apps/deploy",
            Some(json!({
                "name": "Landing Page",
                "repository_url": "https://github.com/acme/landing.git",
                "branch": "main"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let data = &body["data"];
    assert_eq!(data["outcome"]["method"], "generated");
    assert_eq!(data["outcome"]["container_id"], CONTAINER_ID);
    assert_eq!(data["project"]["status"], "deployed");
    assert_eq!(data["project"]["deploy_type"], "generated");
    assert_eq!(data["project"]["url"], "http://localhost:49153");
    assert_eq!(data["deployment"]["status"], "success");
    assert_eq!(data["deployment"]["commit_hash"], "abc123");
    assert_eq!(data["deployment"]["commit_message"], "Initial commit");

    assert_eq!(
        app.runner.count("git", &["clone", "--depth", "1", "--branch", "main"]),
        1
    );
    assert_eq!(app.runner.count("docker", &["run", "-d", "--name", "xistra-landing-page"]), 1);

    // Options end before the URL
    let clone = app
        .runner
        .calls()
        .into_iter()
        .find(|c| c.starts_with("git", &["clone"]))
        .unwrap();
    let url_at = clone
        .args
        .iter()
        .position(|a| a == "https://github.com/acme/landing.git")
        .unwrap();
    assert_eq!(clone.args[url_at - 1], "--");

    let (status, body) = app.request("GET", "/apps/deployed", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "Landing Page");

    // The checkout is gone once the deploy returns
    let leftovers = std::fs::read_dir(&app.work_dir)
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_failed_clone_marks_project_failed() {
    let app = test_app().await;
    app.runner.on(
        "git",
        &["clone"],
        CommandOutput::failed("fatal: repository not found"),
    );

    let (status, body) = app
        .request(
            "POST",
            "/apps/deploy",
            Some(json!({ "name": "ghost", "repository_url": "https://github.com/acme/missing.git" })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("repository not found"));

    let pool = &app.state.db.pool;
    let project = Project::find_by_name(pool, "ghost").await.unwrap().unwrap();
    assert_eq!(project.status, ProjectStatus::Failed);

    let deployments = Deployment::find_by_project_id(pool, project.id).await.unwrap();
    assert_eq!(deployments.len(), 1);
    assert!(deployments[0].error.as_deref().unwrap().contains("Git clone failed"));
    assert_eq!(app.runner.count("docker", &[]), 0);
}

#[tokio::test]
async fn test_deploy_rejects_bad_repository_url() {
    let app = test_app().await;
    let (status, _) = app
        .request(
            "POST",
            "/apps/deploy",
            Some(json!({ "name": "x", "repository_url": "file:///etc/passwd" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.runner.calls().is_empty());
}

#[tokio::test]
async fn test_redeploy_reuses_project_and_stop() {
    let app = test_app().await;
    let request = json!({ "name": "api", "repository_url": "https://github.com/acme/api.git" });

    let (status, first) = app.request("POST", "/apps/deploy", Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = app.request("POST", "/apps/deploy", Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(first["data"]["project"]["id"], second["data"]["project"]["id"]);

    let id = first["data"]["project"]["id"].as_str().unwrap().to_string();
    let (status, body) = app
        .request("GET", &format!("/projects/{id}/deployments"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .request("POST", &format!("/projects/{id}/stop"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "stopped");
    assert_eq!(app.runner.count("docker", &["stop", CONTAINER_ID]), 1);

    // Stopping twice is not a valid transition
    let (status, _) = app
        .request("POST", &format!("/projects/{id}/stop"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_names_with_the_same_slug_collide() {
    let app = test_app().await;
    let (status, body) = app
        .request(
            "POST",
            "/apps/deploy",
            Some(json!({ "name": "My App", "repository_url": "https://github.com/acme/app.git" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["project"]["slug"], "my-app");

    let (status, body) = app
        .request(
            "POST",
            "/apps/deploy",
            Some(json!({ "name": "my-app", "repository_url": "https://github.com/acme/other.git" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "A project with this name already exists");

    let (status, _) = app
        .request("POST", "/projects", Some(json!({ "name": "my_app!" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The first project's container was never touched
    assert_eq!(app.runner.count("docker", &["rm", "-f", "xistra-my-app"]), 1);
    let project = Project::find_by_name(&app.state.db.pool, "My App")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(project.status, ProjectStatus::Deployed);
    assert_eq!(project.container_id.as_deref(), Some(CONTAINER_ID));
}

#[tokio::test]
async fn test_name_without_letters_or_digits_is_400() {
    let app = test_app().await;
    let (status, body) = app
        .request("POST", "/projects", Some(json!({ "name": "!!!" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Project name must contain letters or digits");
}

#[tokio::test]
async fn test_overlapping_deploys_are_rejected() {
    let runner = ScriptedRunner::healthy();
    let gate = runner.hold("git", &["clone"]);
    let app = test_app_with(runner, true, AuthOptions::disabled()).await;
    let request = json!({ "name": "api", "repository_url": "https://github.com/acme/api.git" });

    let first = app.request("POST", "/apps/deploy", Some(request.clone()));
    let second = async {
        gate.reached().await;
        let response = app.request("POST", "/apps/deploy", Some(request.clone())).await;
        gate.open();
        response
    };
    let ((first_status, _), (second_status, second_body)) = tokio::join!(first, second);

    assert_eq!(first_status, StatusCode::CREATED);
    assert_eq!(second_status, StatusCode::CONFLICT);
    assert_eq!(second_body["error"], "A deployment of api is already running");
    assert_eq!(app.runner.count("git", &["clone"]), 1);

    // The guard is gone once the first deploy returns
    let (status, _) = app.request("POST", "/apps/deploy", Some(request)).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_failed_deploy_releases_guard() {
    let app = test_app().await;
    app.runner
        .once("git", &["clone"], CommandOutput::failed("fatal: could not read Username"));
    let request = json!({ "name": "api", "repository_url": "https://github.com/acme/api.git" });

    let (status, _) = app.request("POST", "/apps/deploy", Some(request.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, body) = app.request("POST", "/apps/deploy", Some(request)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["project"]["status"], "deployed");
}

#[tokio::test]
async fn test_delete_during_deploy_is_409() {
    let runner = ScriptedRunner::healthy();
    let gate = runner.hold("git", &["clone"]);
    let app = test_app_with(runner, true, AuthOptions::disabled()).await;
    let id = app.create_project("api").await;

    let deploy = app.request(
        "POST",
        "/apps/deploy",
        Some(json!({ "name": "api", "repository_url": "https://github.com/acme/api.git" })),
    );
    let delete = async {
        gate.reached().await;
        let response = app.request("DELETE", &format!("/projects/{id}"), None).await;
        gate.open();
        response
    };
    let ((deploy_status, body), (delete_status, _)) = tokio::join!(deploy, delete);

    assert_eq!(delete_status, StatusCode::CONFLICT);
    assert_eq!(deploy_status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["project"]["id"], id.as_str());

    // Once the deploy is done the project and its container go together
    let (status, _) = app.request("DELETE", &format!("/projects/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.runner.count("docker", &["rm", "-f", CONTAINER_ID]), 1);
}
