// Installer for Python projects.
//
// Python itself has no portable archive worth unpacking (distributions are
// built per-OS), so a missing interpreter resolves to guidance. Everything
// else (pip bootstrap, pip configuration, the project venv, and the
// dependency prefetch) is automated.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::Deserialize;

use crate::constants::{
    BUILD_TIMEOUT, COMMAND_TIMEOUT, DEFAULT_PYTHON_VERSION, PROBE_TIMEOUT, PYTHON_DOWNLOAD_PAGE,
};
use crate::errors::{BootstrapError, Result};
use crate::installers::{Installer, InstallerContext};
use crate::libs::env_manager::EnvironmentManager;
use crate::libs::utilities::path_helpers::which;
use crate::{log_info, log_success, log_warn};

const DEFAULT_PIP_CONF: &str = "[global]\ntimeout = 60\n";

/// The slice of pyproject.toml this installer cares about.
#[derive(Debug, Deserialize)]
struct PyProjectManifest {
    project: Option<PyProjectSection>,
}

#[derive(Debug, Deserialize)]
struct PyProjectSection {
    #[serde(rename = "requires-python")]
    requires_python: Option<String>,
}

pub struct PythonInstaller {
    ctx: InstallerContext,
    project: PathBuf,
    env: EnvironmentManager,
}

impl PythonInstaller {
    pub fn new(ctx: &InstallerContext, project: &Path) -> Self {
        PythonInstaller {
            ctx: ctx.clone(),
            project: project.to_path_buf(),
            env: EnvironmentManager::new(project),
        }
    }

    /// `python3` where available, `python` otherwise.
    fn python_command(&self) -> &'static str {
        if which("python3").is_some() {
            "python3"
        } else {
            "python"
        }
    }

    fn is_pip_installed(&self) -> bool {
        let python = self.python_command();
        self.ctx
            .runner
            .run(&[python, "-m", "pip", "--version"], None, PROBE_TIMEOUT, &[])
            .0
    }

    /// Bootstraps pip through the stdlib `ensurepip` module.
    fn install_pip(&self) -> Result<()> {
        log_info!("[Python] pip not found, bootstrapping via ensurepip...");
        let python = self.python_command();
        let (ok, output) = self.ctx.runner.run(
            &[python, "-m", "ensurepip", "--upgrade"],
            None,
            COMMAND_TIMEOUT,
            &[],
        );
        if ok {
            log_success!("pip installed");
            Ok(())
        } else {
            Err(BootstrapError::Configuration {
                component: "pip".to_string(),
                reason: output,
            })
        }
    }

    /// Creates the pip configuration directory and a default `pip.conf`,
    /// or one carrying the proxy when configured.
    fn ensure_pip_config(&self) -> Result<()> {
        let config_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pip");
        fs::create_dir_all(&config_dir)?;
        let config_file = config_dir.join("pip.conf");

        if let Some(proxy) = self.ctx.proxy.http() {
            fs::write(
                &config_file,
                format!("[global]\ntimeout = 60\nproxy = {}\n", proxy),
            )?;
            log_success!("pip proxy configured in {}", config_file.display());
        } else if !config_file.exists() {
            fs::write(&config_file, DEFAULT_PIP_CONF)?;
            log_success!("Created pip config: {}", config_file.display());
        }
        Ok(())
    }

    fn venv_path(&self) -> PathBuf {
        self.project.join("venv")
    }

    fn create_venv(&self) -> Result<()> {
        if self.venv_path().exists() {
            log_info!("[Python] venv already exists, keeping it");
            return Ok(());
        }
        log_info!("[Python] Creating virtual environment...");
        let python = self.python_command();
        let (ok, output) = self.ctx.runner.run(
            &[python, "-m", "venv", "venv"],
            Some(&self.project),
            COMMAND_TIMEOUT,
            &[],
        );
        if ok {
            log_success!("Virtual environment created");
            Ok(())
        } else {
            Err(BootstrapError::Configuration {
                component: "venv".to_string(),
                reason: output,
            })
        }
    }

    /// Installs project dependencies into the venv. Which command runs
    /// depends on what the project ships: requirements.txt beats setup.py
    /// beats a bare pyproject install. Failure is a warning.
    fn run_pip_install(&self) -> bool {
        let pip = self.venv_path().join("bin/pip");
        let pip = pip.to_string_lossy().to_string();
        let proxy_arg = self.ctx.proxy.http().map(|p| p.to_string());

        let mut argv: Vec<&str> = if self.project.join("requirements.txt").exists() {
            vec![&pip, "install", "-r", "requirements.txt"]
        } else if self.project.join("setup.py").exists() {
            vec![&pip, "install", "-e", "."]
        } else {
            vec![&pip, "install", "."]
        };
        if let Some(proxy) = proxy_arg.as_deref() {
            argv.push("--proxy");
            argv.push(proxy);
        }

        log_info!("[Python] Running: {}", argv.join(" ").bold());
        let (ok, output) = self.ctx.runner.run(
            &argv,
            Some(&self.project),
            BUILD_TIMEOUT,
            &self.ctx.proxy.subprocess_env(),
        );
        if ok {
            log_success!("pip dependencies installed");
        } else {
            log_warn!("[Python] pip install failed: {}", tail(&output, 500));
        }
        ok
    }

    fn has_dependency_manifest(&self) -> bool {
        ["requirements.txt", "setup.py", "pyproject.toml"]
            .iter()
            .any(|name| self.project.join(name).exists())
    }
}

impl Installer for PythonInstaller {
    fn tool_label(&self) -> &'static str {
        "python"
    }

    /// Version the project pins: `runtime.txt`, `.python-version`, or
    /// `pyproject.toml`'s `requires-python`.
    fn detect_version(&self) -> Option<String> {
        for name in ["runtime.txt", ".python-version"] {
            if let Ok(content) = fs::read_to_string(self.project.join(name)) {
                let version = content.trim();
                if !version.is_empty() {
                    return Some(
                        version
                            .strip_prefix("python-")
                            .unwrap_or(version)
                            .to_string(),
                    );
                }
            }
        }

        let pyproject = fs::read_to_string(self.project.join("pyproject.toml")).ok()?;
        let manifest: PyProjectManifest = toml::from_str(&pyproject).ok()?;
        let requires = manifest.project?.requires_python?;
        normalize_requires_python(&requires)
    }

    fn is_installed(&self) -> bool {
        let python = self.python_command();
        self.ctx
            .runner
            .run(&[python, "--version"], None, PROBE_TIMEOUT, &[])
            .0
    }

    /// Python cannot be unpacked from an archive the way the JDK can;
    /// a present interpreter is success, a missing one is guidance.
    fn install(&self) -> Result<()> {
        if self.is_installed() {
            log_info!("[Python] Python is already installed");
            return Ok(());
        }
        let version = self
            .detect_version()
            .unwrap_or_else(|| DEFAULT_PYTHON_VERSION.to_string());
        Err(BootstrapError::ToolNotFound {
            tool: "python".to_string(),
            guidance: format!(
                "Install Python {} from {} or your system package manager, then re-run.",
                version, PYTHON_DOWNLOAD_PAGE
            ),
        })
    }

    fn configure(&self) -> Result<()> {
        log_info!("[Python] Configuring project at {}", self.project.display());

        if !self.is_pip_installed() {
            self.install_pip()?;
        }
        self.ensure_pip_config()?;
        self.create_venv()?;

        if self.has_dependency_manifest() {
            // Best effort: a failed prefetch leaves a usable checkout.
            self.run_pip_install();
        }

        self.env.create_env_file(&[
            ("PYTHONPATH", &self.project.to_string_lossy()),
            ("ENV", "development"),
        ])?;
        Ok(())
    }
}

/// Reduces a `requires-python` constraint like `>=3.11,<4` to the version
/// number it names.
fn normalize_requires_python(requires: &str) -> Option<String> {
    let first = requires.split(',').next()?.trim();
    let version: String = first
        .trim_start_matches(['>', '<', '=', '~', '^', ' '])
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if version.is_empty() {
        None
    } else {
        Some(version)
    }
}

fn tail(text: &str, limit: usize) -> &str {
    match text.char_indices().rev().nth(limit.saturating_sub(1)) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::process::SystemProcessRunner;
    use crate::libs::proxy::ProxyConfig;
    use std::sync::Arc;

    fn installer(project: &Path) -> PythonInstaller {
        let ctx = InstallerContext {
            proxy: ProxyConfig::direct(),
            runner: Arc::new(SystemProcessRunner),
            tools_dir: project.join("tools"),
        };
        PythonInstaller::new(&ctx, project)
    }

    #[test]
    fn runtime_txt_version_is_used_first() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("runtime.txt"), "python-3.12\n").unwrap();
        fs::write(dir.path().join(".python-version"), "3.9\n").unwrap();
        assert_eq!(
            installer(dir.path()).detect_version().as_deref(),
            Some("3.12")
        );
    }

    #[test]
    fn python_version_file_is_read_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".python-version"), "3.10.4\n").unwrap();
        assert_eq!(
            installer(dir.path()).detect_version().as_deref(),
            Some("3.10.4")
        );
    }

    #[test]
    fn pyproject_requires_python_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\nrequires-python = \">=3.11,<4\"\n",
        )
        .unwrap();
        assert_eq!(
            installer(dir.path()).detect_version().as_deref(),
            Some("3.11")
        );
    }

    #[test]
    fn no_version_markers_means_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(installer(dir.path()).detect_version(), None);
    }

    #[test]
    fn requires_python_normalization_handles_operators() {
        assert_eq!(normalize_requires_python(">=3.11"), Some("3.11".to_string()));
        assert_eq!(normalize_requires_python("~=3.9.2"), Some("3.9.2".to_string()));
        assert_eq!(normalize_requires_python("^3.12, <4"), Some("3.12".to_string()));
        assert_eq!(normalize_requires_python(""), None);
    }
}
