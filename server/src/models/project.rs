//! Projects: deployed (or deployable) applications

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::utils::slugify;

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display, Default,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Pending,
    Building,
    Deployed,
    Failed,
    Stopped,
}

/// Strategy that produced the running deployment
#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[sqlx(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DeployType {
    DockerCompose,
    Dockerfile,
    Generated,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Docker-safe identity: container, image and compose project names derive from it
    pub slug: String,
    pub repository_url: Option<String>,
    pub branch: Option<String>,
    pub framework: Option<String>,
    pub status: ProjectStatus,
    pub deploy_type: Option<DeployType>,
    pub container_id: Option<String>,
    pub image: Option<String>,
    pub compose_path: Option<String>,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateProject {
    pub name: String,
    pub repository_url: Option<String>,
    pub branch: Option<String>,
    pub framework: Option<String>,
}

/// Runtime identifiers recorded after a successful deploy
#[derive(Debug, Clone, Default)]
pub struct DeployedArtifacts {
    pub container_id: Option<String>,
    pub image: Option<String>,
    pub compose_path: Option<String>,
    pub url: Option<String>,
}

const COLUMNS: &str = "id, name, slug, repository_url, branch, framework, status, deploy_type, \
                       container_id, image, compose_path, url, created_at, updated_at";

impl Project {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {COLUMNS} FROM projects ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!("SELECT {COLUMNS} FROM projects WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!("SELECT {COLUMNS} FROM projects WHERE name = $1"))
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_status(
        pool: &SqlitePool,
        status: ProjectStatus,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {COLUMNS} FROM projects WHERE status = $1 ORDER BY updated_at DESC"
        ))
        .bind(status)
        .fetch_all(pool)
        .await
    }

    /// Insert a pending project. Names that slugify alike collide on the `slug` constraint.
    pub async fn create(pool: &SqlitePool, data: &CreateProject) -> Result<Self, sqlx::Error> {
        let now = Utc::now();
        sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (id, name, slug, repository_url, branch, framework, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(slugify(&data.name))
        .bind(&data.repository_url)
        .bind(&data.branch)
        .bind(&data.framework)
        .bind(ProjectStatus::Pending)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Refresh the source fields of an existing project before a redeploy
    pub async fn update_source(
        pool: &SqlitePool,
        id: Uuid,
        repository_url: &str,
        branch: Option<&str>,
        framework: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects
             SET repository_url = $2, branch = $3, framework = COALESCE($4, framework), updated_at = $5
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(repository_url)
        .bind(branch)
        .bind(framework)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        id: Uuid,
        status: ProjectStatus,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Mark the project deployed and store what the winning strategy produced
    pub async fn record_deploy(
        pool: &SqlitePool,
        id: Uuid,
        deploy_type: DeployType,
        artifacts: &DeployedArtifacts,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects
             SET status = $2, deploy_type = $3, container_id = $4, image = $5,
                 compose_path = $6, url = $7, updated_at = $8
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(ProjectStatus::Deployed)
        .bind(deploy_type)
        .bind(&artifacts.container_id)
        .bind(&artifacts.image)
        .bind(&artifacts.compose_path)
        .bind(&artifacts.url)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    /// Delete a project and everything scoped to it in one transaction.
    /// Returns the number of deleted project rows.
    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        for table in ["environment_variables", "domains", "deployments", "backups"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE project_id = $1"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected())
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM projects")
            .fetch_one(pool)
            .await
    }

    pub async fn count_by_status(
        pool: &SqlitePool,
        status: ProjectStatus,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE status = $1")
            .bind(status)
            .fetch_one(pool)
            .await
    }
}
