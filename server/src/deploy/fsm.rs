//! Project lifecycle state machine

use crate::errors::AppError;
use crate::models::project::ProjectStatus;

/// Lifecycle event
#[derive(Debug, Clone)]
pub enum ProjectEvent {
    /// A deploy was requested
    Build,

    /// The cascade produced a running deployment
    Succeeded,

    /// Every strategy failed
    Failed(String),

    /// Containers were stopped on request
    Stop,
}

/// Project FSM
#[derive(Debug, Clone)]
pub struct ProjectFsm {
    state: ProjectStatus,
    error: Option<String>,
}

impl ProjectFsm {
    pub fn new(state: ProjectStatus) -> Self {
        Self { state, error: None }
    }

    pub fn state(&self) -> ProjectStatus {
        self.state
    }

    /// Error message of the last failed build
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: ProjectEvent) -> Result<ProjectStatus, AppError> {
        let new_state = match (self.state, &event) {
            (
                ProjectStatus::Pending
                | ProjectStatus::Deployed
                | ProjectStatus::Failed
                | ProjectStatus::Stopped,
                ProjectEvent::Build,
            ) => {
                self.error = None;
                ProjectStatus::Building
            }

            (ProjectStatus::Building, ProjectEvent::Succeeded) => ProjectStatus::Deployed,
            (ProjectStatus::Building, ProjectEvent::Failed(err)) => {
                self.error = Some(err.clone());
                ProjectStatus::Failed
            }

            (ProjectStatus::Deployed, ProjectEvent::Stop) => ProjectStatus::Stopped,

            (state, event) => {
                return Err(AppError::Conflict(format!(
                    "Invalid transition: {} -> {:?}",
                    state, event
                )));
            }
        };

        self.state = new_state;
        Ok(new_state)
    }
}

impl Default for ProjectFsm {
    fn default() -> Self {
        Self::new(ProjectStatus::Pending)
    }
}
