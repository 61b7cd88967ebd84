use std::path::{Path, PathBuf};

/// One download request: where to fetch from, where the bytes land, and the
/// digest they must match. Consumed once per pipeline invocation.
#[derive(Debug, Clone)]
pub struct DownloadSpec {
    pub url: String,
    pub destination: PathBuf,
    /// Hex-encoded SHA-256 the downloaded bytes must hash to. `None` is
    /// accepted for sources that publish no stable hash.
    pub expected_checksum: Option<String>,
}

impl DownloadSpec {
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        DownloadSpec {
            url: url.into(),
            destination: destination.into(),
            expected_checksum: None,
        }
    }

    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.expected_checksum = Some(checksum.into());
        self
    }
}

/// One tool installed on the host. Presence of `home_path` on disk (or a
/// successful version probe) is what makes a later install a no-op; there is
/// no manifest.
#[derive(Debug, Clone)]
pub struct ToolchainInstallation {
    pub tool_name: String,
    pub home_path: PathBuf,
    pub bin_path: PathBuf,
    pub version: String,
}

impl ToolchainInstallation {
    pub fn new(
        tool_name: impl Into<String>,
        home_path: impl Into<PathBuf>,
        bin_path: impl Into<PathBuf>,
        version: impl Into<String>,
    ) -> Self {
        ToolchainInstallation {
            tool_name: tool_name.into(),
            home_path: home_path.into(),
            bin_path: bin_path.into(),
            version: version.into(),
        }
    }

    pub fn home(&self) -> &Path {
        &self.home_path
    }
}
