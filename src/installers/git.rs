// Git pre-flight installer.
//
// Git is special-cased: it is required before any job can clone, and on
// Unix there is no portable binary archive to unpack the way the JDK or
// Node.js ship one. A missing git therefore resolves to package-manager
// guidance rather than a download.

use std::time::Duration;

use colored::Colorize;

use crate::constants::{COMMAND_TIMEOUT, PROBE_TIMEOUT};
use crate::errors::{BootstrapError, Result};
use crate::installers::{Installer, InstallerContext};
use crate::{log_info, log_success, log_warn};

pub struct GitInstaller {
    ctx: InstallerContext,
}

impl GitInstaller {
    pub fn new(ctx: &InstallerContext) -> Self {
        GitInstaller { ctx: ctx.clone() }
    }

    fn probe(&self, argv: &[&str], timeout: Duration) -> (bool, String) {
        self.ctx.runner.run(argv, None, timeout, &[])
    }

    /// True when both `user.name` and `user.email` are set globally.
    pub fn is_configured(&self) -> bool {
        let (name_ok, name) = self.probe(
            &["git", "config", "--global", "user.name"],
            COMMAND_TIMEOUT,
        );
        let (email_ok, email) = self.probe(
            &["git", "config", "--global", "user.email"],
            COMMAND_TIMEOUT,
        );
        name_ok && email_ok && !name.trim().is_empty() && !email.trim().is_empty()
    }
}

impl Installer for GitInstaller {
    fn tool_label(&self) -> &'static str {
        "git"
    }

    /// Version of the installed git, parsed from `git --version`
    /// (format: `git version 2.43.0`).
    fn detect_version(&self) -> Option<String> {
        let (ok, output) = self.probe(&["git", "--version"], PROBE_TIMEOUT);
        if !ok {
            return None;
        }
        output
            .split_whitespace()
            .last()
            .map(|version| version.to_string())
    }

    fn is_installed(&self) -> bool {
        self.probe(&["git", "--version"], PROBE_TIMEOUT).0
    }

    fn install(&self) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        Err(BootstrapError::ToolNotFound {
            tool: "git".to_string(),
            guidance: "Install it with your system package manager (apt install git, \
                       dnf install git, or xcode-select --install) and re-run."
                .to_string(),
        })
    }

    /// Reports configuration gaps without prompting; an unconfigured git can
    /// still clone, it just cannot commit.
    fn configure(&self) -> Result<()> {
        if self.is_configured() {
            log_success!("Git user configuration found");
            return Ok(());
        }
        log_warn!(
            "[Git] No global user.name/user.email configured. Commits will fail until you run:"
        );
        log_info!(
            "      git config --global user.name {}",
            "\"Your Name\"".cyan()
        );
        log_info!(
            "      git config --global user.email {}",
            "\"you@example.com\"".cyan()
        );
        Ok(())
    }
}

/// Applies an explicit git configuration (name, email, SSL verification).
/// Kept separate from `configure` so callers decide when prompting for the
/// values is appropriate.
pub fn apply_git_identity(
    ctx: &InstallerContext,
    user_name: &str,
    user_email: &str,
    ssl_verify: bool,
) -> Result<()> {
    let settings: [(&str, String); 3] = [
        ("user.name", user_name.to_string()),
        ("user.email", user_email.to_string()),
        ("http.sslVerify", ssl_verify.to_string()),
    ];
    for (key, value) in &settings {
        let (ok, output) = ctx.runner.run(
            &["git", "config", "--global", key, value],
            None,
            COMMAND_TIMEOUT,
            &[],
        );
        if !ok {
            return Err(BootstrapError::Process {
                command: format!("git config --global {}", key),
                reason: output,
            });
        }
    }
    log_success!("Git configured for {}", user_name.bold());
    Ok(())
}
