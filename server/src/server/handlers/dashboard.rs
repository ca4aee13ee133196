use std::sync::Arc;

use axum::extract::State;
use openapi_server::models::{DashboardStats, SystemSnapshot};

use crate::app::state::AppState;
use crate::models::deployment::{Deployment, DeploymentStatus};
use crate::models::domain::{Domain, DomainStatus};
use crate::models::project::{Project, ProjectStatus};
use crate::models::system_metric::SystemMetric;
use crate::models::team::TeamMember;
use crate::server::handlers::{ok, ApiResult};

pub async fn stats_handler(State(state): State<Arc<AppState>>) -> ApiResult<DashboardStats> {
    let pool = &state.db.pool;

    let system = SystemMetric::latest(pool).await?.map(|m| SystemSnapshot {
        cpu_usage: m.cpu_usage,
        memory_percent: m.memory_percent,
        disk_percent: m.disk_percent,
        sampled_at: m.sampled_at,
    });

    Ok(ok(DashboardStats {
        total_projects: Project::count(pool).await?,
        deployed_projects: Project::count_by_status(pool, ProjectStatus::Deployed).await?,
        building_projects: Project::count_by_status(pool, ProjectStatus::Building).await?,
        failed_projects: Project::count_by_status(pool, ProjectStatus::Failed).await?,
        total_domains: Domain::count(pool).await?,
        verified_domains: Domain::count_by_status(pool, DomainStatus::Verified).await?,
        total_deployments: Deployment::count(pool).await?,
        successful_deployments: Deployment::count_by_status(pool, DeploymentStatus::Success)
            .await?,
        team_members: TeamMember::count(pool).await?,
        system,
    }))
}
