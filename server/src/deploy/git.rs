//! Git repository fetching

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::deploy::cmd::{CommandRunner, CommandSpec};
use crate::errors::AppError;

/// Commit checked out by a clone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
}

/// Clones repositories through `git`
pub struct RepositoryFetcher {
    runner: Arc<dyn CommandRunner>,
}

impl RepositoryFetcher {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Shallow-clone `repo_url` into `target_dir`, which must be empty or absent
    pub async fn shallow_clone(
        &self,
        repo_url: &str,
        branch: Option<&str>,
        target_dir: &Path,
    ) -> Result<(), AppError> {
        info!(
            "Cloning {} (branch: {}) into {}",
            repo_url,
            branch.unwrap_or("default"),
            target_dir.display()
        );

        let mut spec = CommandSpec::new("git").args(["clone", "--depth", "1"]);
        if let Some(branch) = branch {
            spec = spec.args(["--branch", branch]);
        }
        let spec = spec
            .arg("--")
            .arg(repo_url)
            .arg(target_dir.to_string_lossy().into_owned());

        self.runner
            .run(&spec)
            .await?
            .check(&spec)
            .map_err(|e| AppError::DeployError(format!("Git clone failed: {}", e)))?;

        debug!("Clone of {} complete", repo_url);
        Ok(())
    }

    /// The HEAD commit of a checkout, or `None` when git cannot tell
    pub async fn head_commit(&self, repo_dir: &Path) -> Option<CommitInfo> {
        let spec = CommandSpec::new("git")
            .arg("-C")
            .arg(repo_dir.to_string_lossy().into_owned())
            .args(["log", "-1", "--format=%H%n%s"]);

        match self.runner.run(&spec).await.and_then(|o| o.check(&spec)) {
            Ok(output) => parse_commit(&output.stdout),
            Err(e) => {
                debug!("Unable to read HEAD commit: {}", e);
                None
            }
        }
    }
}

fn parse_commit(stdout: &str) -> Option<CommitInfo> {
    let mut lines = stdout.lines();
    let hash = lines.next()?.trim();
    if hash.is_empty() {
        return None;
    }
    Some(CommitInfo {
        hash: hash.to_string(),
        message: lines.next().unwrap_or_default().trim().to_string(),
    })
}
