// Installer for Node.js projects.
//
// Node ships relocatable tarballs, so the runtime itself goes through the
// shared toolchain path. npm arrives bundled with it; configuration covers
// the user .npmrc, proxy wiring, and the project dependency prefetch.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Deserialize;

use crate::constants::{
    BUILD_TIMEOUT, COMMAND_TIMEOUT, DEFAULT_NODE_VERSION, PROBE_TIMEOUT, node_download_url,
    pinned_checksum,
};
use crate::errors::{BootstrapError, Result};
use crate::installers::toolchain::{ToolchainRequest, ensure_toolchain};
use crate::installers::{Installer, InstallerContext};
use crate::libs::env_manager::{EnvironmentManager, PersistentEnvironmentSink, ShellRcSink};
use crate::{log_info, log_success, log_warn};

const DEFAULT_NPMRC: &str = "registry=https://registry.npmjs.org/\n\
cache=${HOME}/.npm\n\
timeout=60000\n";

/// The slice of package.json this installer cares about.
#[derive(Debug, Deserialize)]
struct PackageManifest {
    engines: Option<EngineConstraints>,
}

#[derive(Debug, Deserialize)]
struct EngineConstraints {
    node: Option<String>,
}

pub struct NodeJsInstaller {
    ctx: InstallerContext,
    project: PathBuf,
    env: EnvironmentManager,
    sink: Box<dyn PersistentEnvironmentSink>,
}

impl NodeJsInstaller {
    pub fn new(ctx: &InstallerContext, project: &Path) -> Self {
        NodeJsInstaller {
            ctx: ctx.clone(),
            project: project.to_path_buf(),
            env: EnvironmentManager::new(project),
            sink: Box::new(ShellRcSink::from_environment()),
        }
    }

    fn is_npm_installed(&self) -> bool {
        self.ctx
            .runner
            .run(&["npm", "--version"], None, PROBE_TIMEOUT, &[])
            .0
    }

    /// Writes a default user `.npmrc` when none exists.
    fn ensure_npm_config(&self) -> Result<()> {
        let npmrc = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".npmrc");
        if npmrc.exists() {
            log_info!("[Node.js] .npmrc already exists: {}", npmrc.display());
            return Ok(());
        }
        fs::write(&npmrc, DEFAULT_NPMRC)?;
        log_success!("Created .npmrc: {}", npmrc.display());
        Ok(())
    }

    /// Routes npm through the proxy via `npm config set`. Failures warn;
    /// the lowercase environment variables cover npm anyway.
    fn configure_npm_proxy(&self) {
        let settings = [
            ("proxy", self.ctx.proxy.http()),
            ("https-proxy", self.ctx.proxy.https()),
        ];
        for (key, value) in settings {
            let Some(url) = value else { continue };
            let (ok, output) = self.ctx.runner.run(
                &["npm", "config", "set", key, url],
                None,
                COMMAND_TIMEOUT,
                &[],
            );
            if ok {
                log_success!("npm {} configured", key);
            } else {
                log_warn!("[Node.js] Could not set npm {}: {}", key, output.trim());
            }
        }
    }

    /// `npm install` in the project. Failure is a warning.
    fn run_npm_install(&self) -> bool {
        log_info!("[Node.js] Running: {}", "npm install".bold());
        let (ok, output) = self.ctx.runner.run(
            &["npm", "install"],
            Some(&self.project),
            BUILD_TIMEOUT,
            &self.ctx.proxy.subprocess_env(),
        );
        if ok {
            log_success!("npm dependencies installed");
        } else {
            let tail: String = output.chars().rev().take(500).collect::<String>()
                .chars().rev().collect();
            log_warn!("[Node.js] npm install failed: {}", tail.trim());
        }
        ok
    }
}

impl Installer for NodeJsInstaller {
    fn tool_label(&self) -> &'static str {
        "nodejs"
    }

    /// Node version the project pins via `engines.node` in package.json,
    /// with range operators stripped.
    fn detect_version(&self) -> Option<String> {
        let content = fs::read_to_string(self.project.join("package.json")).ok()?;
        let manifest: PackageManifest = match serde_json::from_str(&content) {
            Ok(manifest) => manifest,
            Err(err) => {
                log_warn!("[Node.js] Could not parse package.json: {}", err);
                return None;
            }
        };
        let constraint = manifest.engines?.node?;
        let version = constraint.trim().trim_start_matches(['^', '~', '>', '<', '=', ' ']);
        if version.is_empty() {
            None
        } else {
            Some(version.to_string())
        }
    }

    fn is_installed(&self) -> bool {
        self.ctx
            .runner
            .run(&["node", "--version"], None, PROBE_TIMEOUT, &[])
            .0
    }

    fn install(&self) -> Result<()> {
        if self.is_installed() {
            log_info!("[Node.js] Node.js is already installed");
            return Ok(());
        }

        let requested = self
            .detect_version()
            .unwrap_or_else(|| DEFAULT_NODE_VERSION.to_string());
        // Exact mirrored versions only; anything else falls back to the
        // default release.
        let version = if node_download_url(&requested).is_some() {
            requested
        } else {
            if requested != DEFAULT_NODE_VERSION {
                log_warn!(
                    "[Node.js] No download for Node.js {}, installing {} instead",
                    requested.yellow(),
                    DEFAULT_NODE_VERSION
                );
            }
            DEFAULT_NODE_VERSION.to_string()
        };
        let url = node_download_url(&version).ok_or_else(|| BootstrapError::Configuration {
            component: "nodejs".to_string(),
            reason: format!("no download URL for Node.js {}", version),
        })?;

        let request = ToolchainRequest {
            tool_name: "nodejs".to_string(),
            version: version.clone(),
            urls: vec![url.to_string()],
            expected_checksum: pinned_checksum("nodejs", &version).map(|c| c.to_string()),
            install_dir_name: "nodejs".to_string(),
            home_var: "NODE_HOME".to_string(),
            bin_subdir: Some("bin".to_string()),
        };
        ensure_toolchain(&self.ctx, &request, Some(&self.env), self.sink.as_ref())?;
        log_success!("Node.js installed");
        Ok(())
    }

    fn configure(&self) -> Result<()> {
        log_info!("[Node.js] Configuring project at {}", self.project.display());

        if !self.is_npm_installed() {
            return Err(BootstrapError::ToolNotFound {
                tool: "npm".to_string(),
                guidance: "npm ships with Node.js; the Node.js installation looks broken."
                    .to_string(),
            });
        }

        self.ensure_npm_config()?;
        if self.ctx.proxy.is_configured() {
            self.configure_npm_proxy();
        }

        if self.project.join("package.json").exists() {
            // Best effort: a failed prefetch leaves a usable checkout.
            self.run_npm_install();
        }

        self.env
            .create_env_file(&[("NODE_ENV", "development"), ("PORT", "3000")])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::process::SystemProcessRunner;
    use crate::libs::proxy::ProxyConfig;
    use std::sync::Arc;

    fn installer(project: &Path) -> NodeJsInstaller {
        let ctx = InstallerContext {
            proxy: ProxyConfig::direct(),
            runner: Arc::new(SystemProcessRunner),
            tools_dir: project.join("tools"),
        };
        NodeJsInstaller::new(&ctx, project)
    }

    #[test]
    fn engines_node_version_is_detected_with_operators_stripped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"name":"demo","engines":{"node":">=20.11.0"}}"#,
        )
        .unwrap();
        assert_eq!(
            installer(dir.path()).detect_version().as_deref(),
            Some("20.11.0")
        );
    }

    #[test]
    fn caret_ranges_are_stripped_too() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{"engines":{"node":"^18.19.1"}}"#,
        )
        .unwrap();
        assert_eq!(
            installer(dir.path()).detect_version().as_deref(),
            Some("18.19.1")
        );
    }

    #[test]
    fn missing_engines_block_means_no_pinned_version() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{"name":"demo"}"#).unwrap();
        assert_eq!(installer(dir.path()).detect_version(), None);
    }

    #[test]
    fn malformed_package_json_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), "{not json").unwrap();
        assert_eq!(installer(dir.path()).detect_version(), None);
    }

    #[test]
    fn missing_package_json_means_no_pinned_version() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(installer(dir.path()).detect_version(), None);
    }
}
