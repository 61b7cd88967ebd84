// Centralized constants and configuration values for repo-bootstrap.
// Directory layout, timeouts, default toolchain versions, download URL tables
// (with mirror lists where upstream publishes them) and pinned checksums all
// live here so the rest of the crate never hard-codes a URL or a version.

use std::path::PathBuf;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Directory configuration
// ---------------------------------------------------------------------------

/// Directory under the user's home that receives cloned projects.
pub const PROJECTS_DIR_NAME: &str = "bootstrap-projects";
/// Hidden directory under the user's home holding everything we install.
pub const APP_DIR_NAME: &str = ".repo-bootstrap";
/// Subdirectory of [`APP_DIR_NAME`] holding one directory per installed tool.
pub const TOOLS_SUBDIR: &str = "tools";

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Base directory for cloned projects (`~/bootstrap-projects`).
pub fn projects_root() -> PathBuf {
    home_dir().join(PROJECTS_DIR_NAME)
}

/// Root of the per-tool installation directories (`~/.repo-bootstrap/tools`).
pub fn tools_root() -> PathBuf {
    home_dir().join(APP_DIR_NAME).join(TOOLS_SUBDIR)
}

// ---------------------------------------------------------------------------
// Timeouts
// ---------------------------------------------------------------------------

/// Network timeout for toolchain downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);
/// Timeout for build-tool invocations (mvn, gradle, npm, pip).
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(600);
/// Timeout for general commands (clone, config writes via CLIs).
pub const COMMAND_TIMEOUT: Duration = Duration::from_secs(120);
/// Timeout for short version probes (`git --version` and friends).
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Default toolchain versions
// ---------------------------------------------------------------------------

pub const DEFAULT_JAVA_VERSION: &str = "17";
pub const DEFAULT_PYTHON_VERSION: &str = "3.11";
pub const DEFAULT_NODE_VERSION: &str = "20.11.0";
pub const MAVEN_VERSION: &str = "3.9.9";

// ---------------------------------------------------------------------------
// Download URLs
// ---------------------------------------------------------------------------

/// JDK archive for a given major version. Oracle's `latest` URLs track the
/// newest patch release, which also means they carry no stable published hash.
pub fn jdk_download_url(version: &str) -> Option<&'static str> {
    match version {
        "17" => Some("https://download.oracle.com/java/17/latest/jdk-17_linux-x64_bin.tar.gz"),
        "11" => Some("https://download.oracle.com/java/11/latest/jdk-11_linux-x64_bin.tar.gz"),
        _ => None,
    }
}

/// Maven download mirrors, tried in order until one answers.
pub fn maven_mirror_urls() -> &'static [&'static str] {
    &[
        "https://dlcdn.apache.org/maven/maven-3/3.9.9/binaries/apache-maven-3.9.9-bin.zip",
        "https://archive.apache.org/dist/maven/maven-3/3.9.9/binaries/apache-maven-3.9.9-bin.zip",
        "https://mirrors.estointernet.in/apache/maven/maven-3/3.9.9/binaries/apache-maven-3.9.9-bin.zip",
    ]
}

/// Node.js archive for a given exact version.
pub fn node_download_url(version: &str) -> Option<&'static str> {
    match version {
        "20.11.0" => Some("https://nodejs.org/dist/v20.11.0/node-v20.11.0-linux-x64.tar.xz"),
        _ => None,
    }
}

/// Where to send users for a manual Python installation.
pub const PYTHON_DOWNLOAD_PAGE: &str = "https://www.python.org/downloads/";

// ---------------------------------------------------------------------------
// Pinned SHA-256 checksums
// ---------------------------------------------------------------------------

/// Known-good digest for a (tool, version) pair, where upstream publishes one.
/// Oracle `latest` JDK URLs and the rotating Maven mirrors have no stable hash
/// to pin; entries must be updated whenever a pinned URL changes.
pub fn pinned_checksum(tool: &str, version: &str) -> Option<&'static str> {
    match (tool, version) {
        ("nodejs", "20.11.0") => {
            Some("4226e02e78f7fd54294f31b2a945f5e04e9e0ffa399a6fb16ccbe9d4cfcf5f80")
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// URL validation
// ---------------------------------------------------------------------------

/// Schemes a repository URL may use.
pub const ALLOWED_URL_SCHEMES: &[&str] = &["http", "https", "git"];

// ---------------------------------------------------------------------------
// Retry configuration
// ---------------------------------------------------------------------------

/// Attempts made to remove a locked directory tree before giving up.
pub const MAX_RMTREE_RETRIES: usize = 3;
/// Fixed backoff between removal attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Buffer size for streamed downloads.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8192;
