// The shared install algorithm: every archive-distributed toolchain (JDK,
// Maven, Node.js) goes through the same sequence, implemented once here.
//
// 1. If the tool's installation directory already exists, skip the download
//    entirely and only re-wire the environment. This is what turns a re-run
//    on a prepared machine into a no-op instead of a multi-hundred-megabyte
//    fetch.
// 2. Otherwise run the download/verify/extract pipeline against the resolved
//    URL list and rename the extracted root to the stable directory name.
// 3. Wire the environment twice: the current process (so later stages of
//    this run see the tool immediately) and the persistent sink (so future
//    shells do). A failed persistent write is a warning; the install still
//    works for this run.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;

use crate::constants::DOWNLOAD_TIMEOUT;
use crate::errors::{BootstrapError, Result};
use crate::installers::InstallerContext;
use crate::libs::download::download_and_extract;
use crate::libs::env_manager::{
    EnvironmentManager, PersistentEnvironmentSink, prepend_process_path, set_process_var,
};
use crate::libs::fileops;
use crate::schemas::download::ToolchainInstallation;
use crate::{log_info, log_success, log_warn};

/// One toolchain to ensure on the host.
pub struct ToolchainRequest {
    /// Display/tool name ("jdk", "maven", "nodejs").
    pub tool_name: String,
    pub version: String,
    /// Download URLs, tried in order.
    pub urls: Vec<String>,
    /// Pinned SHA-256, when upstream publishes one.
    pub expected_checksum: Option<String>,
    /// Stable directory name under the tools root ("jdk-17", "maven").
    pub install_dir_name: String,
    /// Environment variable naming the tool's home ("JAVA_HOME").
    pub home_var: String,
    /// Subdirectory of the home containing executables, when there is one.
    pub bin_subdir: Option<String>,
}

/// Ensures the requested toolchain is installed and wired into the
/// environment. A present home directory means no network I/O happens.
pub fn ensure_toolchain(
    ctx: &InstallerContext,
    request: &ToolchainRequest,
    project_env: Option<&EnvironmentManager>,
    sink: &dyn PersistentEnvironmentSink,
) -> Result<ToolchainInstallation> {
    let home = ctx.tools_dir.join(&request.install_dir_name);

    if home.exists() {
        log_info!(
            "[Toolchain] {} already installed at {}, skipping download",
            request.tool_name.bold(),
            home.display().to_string().green()
        );
        return Ok(wire_environment(request, home, project_env, sink));
    }

    fs::create_dir_all(&ctx.tools_dir)?;

    let archive_name = archive_file_name(request)?;
    let archive_path = ctx.tools_dir.join(archive_name);
    let staging_dir = ctx
        .tools_dir
        .join(format!(".{}-staging", request.install_dir_name));
    if staging_dir.exists() {
        // Leftover from an interrupted earlier run.
        fileops::remove_tree_default(&staging_dir);
    }

    log_info!(
        "[Toolchain] Installing {} {}...",
        request.tool_name.bold(),
        request.version
    );
    let urls: Vec<&str> = request.urls.iter().map(String::as_str).collect();
    let extracted_root = download_and_extract(
        &ctx.proxy.agent(DOWNLOAD_TIMEOUT),
        &urls,
        &archive_path,
        &staging_dir,
        request.expected_checksum.as_deref(),
    )?;

    // Move the versioned archive root (e.g. apache-maven-3.9.9) onto the
    // stable install name, then drop whatever staging scaffolding remains.
    fs::rename(&extracted_root, &home)?;
    if staging_dir.exists() {
        fileops::remove_tree_default(&staging_dir);
    }

    log_success!(
        "{} {} installed at {}",
        request.tool_name,
        request.version,
        home.display().to_string().green()
    );
    Ok(wire_environment(request, home, project_env, sink))
}

/// Applies both kinds of environment state for an installed tool and reports
/// the resulting installation record.
fn wire_environment(
    request: &ToolchainRequest,
    home: PathBuf,
    project_env: Option<&EnvironmentManager>,
    sink: &dyn PersistentEnvironmentSink,
) -> ToolchainInstallation {
    let bin_path = match &request.bin_subdir {
        Some(subdir) => home.join(subdir),
        None => home.clone(),
    };
    let home_str = home.to_string_lossy().to_string();

    // Current process first: later stages of this run depend on it.
    set_process_var(&request.home_var, &home_str);
    prepend_process_path(&bin_path);

    // Project .env so the developer's own shells pick the tool up per-project.
    if let Some(env) = project_env {
        if let Err(err) = env.append_to_env(&request.home_var, &home_str) {
            log_warn!(
                "[Toolchain] Could not record {} in the project .env: {}",
                request.home_var,
                err
            );
        }
    }

    // Persistent sink last; its failure never aborts the install.
    if let Err(err) = sink.set_variable(&request.home_var, &home_str) {
        log_warn!(
            "[Toolchain] Could not persist {}: {} (set it manually for new shells)",
            request.home_var.yellow(),
            err
        );
    }
    if let Err(err) = sink.prepend_to_path(&bin_path) {
        log_warn!(
            "[Toolchain] Could not persist PATH entry {}: {}",
            bin_path.display(),
            err
        );
    }

    log_info!(
        "[Toolchain] {}={}",
        request.home_var.bold(),
        home_str.green()
    );

    ToolchainInstallation::new(&request.tool_name, home, bin_path, &request.version)
}

/// File name the archive is saved under, taken from the first URL's last
/// path segment.
fn archive_file_name(request: &ToolchainRequest) -> Result<String> {
    let first_url = request
        .urls
        .first()
        .ok_or_else(|| BootstrapError::Download {
            url: format!("<{}>", request.tool_name),
            reason: "no download URLs resolved".to_string(),
        })?;
    let name = first_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("artifact.archive");
    Ok(name.to_string())
}
