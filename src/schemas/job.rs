use std::fmt;
use std::path::{Path, PathBuf};

use crate::schemas::technology::TechnologyProfile;

/// Position of a job in the bootstrap state machine.
///
/// ```text
/// Pending -> Validating -> Cloning -> Detecting -> Installing -> Configuring -> Ready
///                |            |           |            |             |
///                +----- any failure after a successful clone -----> RollingBack -> Failed
/// ```
///
/// Validation failures (and a declined or impossible overwrite) go straight to
/// `Failed`; nothing was created, so there is nothing to roll back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Validating,
    Cloning,
    Detecting,
    Installing,
    Configuring,
    Ready,
    RollingBack,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Ready | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobState::Pending => "PENDING",
            JobState::Validating => "VALIDATING",
            JobState::Cloning => "CLONING",
            JobState::Detecting => "DETECTING",
            JobState::Installing => "INSTALLING",
            JobState::Configuring => "CONFIGURING",
            JobState::Ready => "READY",
            JobState::RollingBack => "ROLLING_BACK",
            JobState::Failed => "FAILED",
        })
    }
}

/// One repository to bootstrap. Owned by the orchestrator for the duration of
/// a run and discarded afterwards; nothing about a job persists across runs.
#[derive(Debug)]
pub struct RepositoryJob {
    pub url: String,
    pub local_path: PathBuf,
    pub state: JobState,
    pub profile: Option<TechnologyProfile>,
    pub error: Option<String>,
}

impl RepositoryJob {
    /// Creates a pending job whose local path is `<base_dir>/<repo name>`,
    /// with the repository name derived from the URL's last path segment.
    pub fn new(url: &str, base_dir: &Path) -> Self {
        RepositoryJob {
            url: url.to_string(),
            local_path: base_dir.join(repo_name_from_url(url)),
            state: JobState::Pending,
            profile: None,
            error: None,
        }
    }

    /// Records a failure message and moves the job to `Failed`.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.state = JobState::Failed;
    }

    pub fn is_ready(&self) -> bool {
        self.state == JobState::Ready
    }
}

/// Extracts the repository name from its URL: the last non-empty path
/// segment, with any `.git` suffix stripped.
pub fn repo_name_from_url(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let name = name.strip_suffix(".git").unwrap_or(name);
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn repo_name_strips_git_suffix() {
        assert_eq!(
            repo_name_from_url("https://github.com/u/my-project.git"),
            "my-project"
        );
    }

    #[test]
    fn repo_name_ignores_trailing_slash() {
        assert_eq!(
            repo_name_from_url("https://github.com/u/my-project/"),
            "my-project"
        );
    }

    #[test]
    fn repo_name_handles_plain_urls() {
        assert_eq!(
            repo_name_from_url("git://host.example/team/tool"),
            "tool"
        );
    }

    #[test]
    fn job_derives_local_path_from_url() {
        let job = RepositoryJob::new("https://github.com/u/demo.git", Path::new("/tmp/projects"));
        assert_eq!(job.local_path, Path::new("/tmp/projects/demo"));
        assert_eq!(job.state, JobState::Pending);
        assert!(job.profile.is_none());
    }
}
