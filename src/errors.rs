// Error taxonomy for the bootstrap pipeline.
//
// The variants map one-to-one onto how callers are allowed to react:
// validation and checksum failures are terminal and never retried, download
// failures may be retried against a mirror, process failures end a step but
// not necessarily the job, and rollback failures are reported without
// changing the job's outcome.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BootstrapError>;

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A repository URL failed one of the safety rules. Raised before any I/O.
    #[error("invalid repository URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A proxy URL is not of the form `scheme://host[:port]`.
    #[error("invalid proxy URL '{url}': expected http://host:port or https://host:port")]
    InvalidProxyUrl { url: String },

    /// An environment variable name is not `[A-Za-z_][A-Za-z0-9_]*`.
    #[error(
        "invalid environment variable name '{name}': names must start with a letter or \
         underscore and contain only letters, digits and underscores"
    )]
    InvalidEnvVarName { name: String },

    /// Network or HTTP failure while fetching an artifact. Retryable across
    /// mirrors when a mirror list exists; otherwise terminal for the artifact.
    #[error("failed to download {url}: {reason}")]
    Download { url: String, reason: String },

    /// The fetched bytes do not match the pinned digest. Never retried against
    /// the same URL; the partial file has already been deleted when this is
    /// returned.
    #[error("checksum verification failed for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// The archive could not be unpacked. Terminal for the artifact.
    #[error("failed to extract archive {archive}: {reason}")]
    Extraction { archive: PathBuf, reason: String },

    /// An external process could not be spawned, exited non-zero, or timed out.
    #[error("command '{command}' failed: {reason}")]
    Process { command: String, reason: String },

    /// `git clone` failed.
    #[error("failed to clone repository {url}: {reason}")]
    Clone { url: String, reason: String },

    /// No supported technology markers were found in the repository root.
    #[error("could not detect a supported technology in {repo}")]
    UnknownTechnology { repo: PathBuf },

    /// A required tool is absent and cannot be installed automatically.
    #[error("required tool not found: {tool}. {guidance}")]
    ToolNotFound { tool: String, guidance: String },

    /// Project or toolchain configuration failed past the point of warnings.
    #[error("failed to configure {component}: {reason}")]
    Configuration { component: String, reason: String },

    /// Cleanup of a partially processed job failed; the job is already FAILED.
    #[error("rollback failed for {path}: {reason}")]
    Rollback { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BootstrapError {
    /// True when retrying the same artifact from another mirror is permitted.
    pub fn is_retryable_download(&self) -> bool {
        matches!(self, BootstrapError::Download { .. })
    }
}
