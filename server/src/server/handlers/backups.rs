//! Database snapshots and container backups

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use chrono::Utc;
use openapi_server::models::CreateBackupRequest;
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::state::AppState;
use crate::errors::AppError;
use crate::filesys::file::File;
use crate::models::backup::{Backup, BackupStatus, BackupType, CreateBackup};
use crate::server::handlers::{created, load_project, ok, ApiResult, Created, Deleted};

pub async fn list_handler(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Backup>> {
    Ok(ok(Backup::find_all(&state.db.pool).await?))
}

/// Take a backup now. A failed attempt is recorded with status `failed`.
pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBackupRequest>, JsonRejection>,
) -> Created<Backup> {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(JsonRejection::MissingJsonContentType(_)) => CreateBackupRequest::default(),
        Err(e) => return Err(e.into()),
    };
    let backup_type = match req.backup_type.as_deref() {
        Some(t) => t
            .parse::<BackupType>()
            .map_err(|_| AppError::ValidationError(format!("Invalid backup type: {}", t)))?,
        None => BackupType::default(),
    };

    let id = Uuid::new_v4();
    let stamp = Utc::now().format("%Y%m%d%H%M%S");
    let (name, result) = match backup_type {
        BackupType::Database => {
            let name = req.name.unwrap_or_else(|| format!("database-{}", stamp));
            (name, snapshot_database(&state, id).await)
        }
        BackupType::Project => {
            let project_id = req.project_id.ok_or_else(|| {
                AppError::ValidationError("project_id is required for project backups".to_string())
            })?;
            let project = load_project(&state.db.pool, project_id).await?;
            let name = req
                .name
                .unwrap_or_else(|| format!("{}-{}", project.slug, stamp));
            let result = match &project.container_id {
                Some(container) => {
                    let image = format!("xistra-backup/{}:{}", project.slug, stamp);
                    let committed = state
                        .deploys
                        .engine()
                        .commit_container(container, &image)
                        .await;
                    committed.map(|_| (image, None))
                }
                None => Err(AppError::ValidationError(format!(
                    "Project {} has no running container",
                    project.name
                ))),
            };
            (name, result)
        }
    };

    let data = match result {
        Ok((location, size_bytes)) => CreateBackup {
            id,
            project_id: req.project_id,
            name,
            backup_type,
            status: BackupStatus::Completed,
            location: Some(location),
            size_bytes,
            error: None,
        },
        Err(AppError::ValidationError(msg)) => return Err(AppError::ValidationError(msg)),
        Err(e) => {
            warn!("Backup {} failed: {}", name, e);
            CreateBackup {
                id,
                project_id: req.project_id,
                name,
                backup_type,
                status: BackupStatus::Failed,
                location: None,
                size_bytes: None,
                error: Some(e.to_string()),
            }
        }
    };

    let backup = Backup::create(&state.db.pool, &data).await?;
    info!("Backup {} {}", backup.name, backup.status);
    Ok(created(backup))
}

/// `VACUUM INTO` a fresh file under the backup directory
async fn snapshot_database(
    state: &AppState,
    id: Uuid,
) -> Result<(String, Option<i64>), AppError> {
    tokio::fs::create_dir_all(&state.backup_dir).await?;
    let file = File::new(state.backup_dir.join(format!("{}.sqlite", id)));
    let location = file.path().to_string_lossy().into_owned();

    sqlx::query("VACUUM INTO $1")
        .bind(&location)
        .execute(&state.db.pool)
        .await?;

    let size = file.size().await?;
    Ok((location, i64::try_from(size).ok()))
}

pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<Deleted> {
    let backup = Backup::find_by_id(&state.db.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Backup not found".to_string()))?;

    if let (BackupType::Database, Some(location)) = (backup.backup_type, &backup.location) {
        if let Err(e) = File::new(location).delete().await {
            warn!("Failed to remove backup file {}: {}", location, e);
        }
    }

    Backup::delete(&state.db.pool, id).await?;
    Ok(ok(Deleted { id }))
}
