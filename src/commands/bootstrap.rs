// The bootstrap run: everything between argument parsing and the exit code.
//
// Repositories are processed strictly sequentially; each job runs to READY or
// FAILED before the next starts, and jobs share nothing but the proxy
// configuration and whatever toolchains earlier jobs already installed.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use colored::Colorize;
use prettytable::{Table, row};

use crate::constants;
use crate::installers::git::{GitInstaller, apply_git_identity};
use crate::installers::{Installer, InstallerContext};
use crate::libs::orchestrator::{GitCliClient, InteractivePrompt, Orchestrator};
use crate::libs::process::SystemProcessRunner;
use crate::libs::proxy::ProxyConfig;
use crate::libs::utilities::path_helpers::expand_tilde;
use crate::logger::log_details;
use crate::schemas::job::RepositoryJob;
use crate::{log_error, log_info, log_success, log_warn};

/// Options for one bootstrap run, mapped from the CLI surface.
pub struct BootstrapOptions {
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
    /// Overwrite existing clone directories without prompting.
    pub force: bool,
    /// Optional git identity to apply when git is unconfigured.
    pub git_user: Option<String>,
    pub git_email: Option<String>,
    /// Override for the projects root; `~` is expanded.
    pub projects_dir: Option<String>,
    /// Override for the toolchain root; `~` is expanded.
    pub tools_dir: Option<String>,
    pub repositories: Vec<String>,
}

/// Runs the whole bootstrap. Returns the process exit code: 0 when every
/// repository reached READY, 1 otherwise.
pub fn run(options: BootstrapOptions) -> anyhow::Result<i32> {
    let proxy = match ProxyConfig::configure(options.http_proxy, options.https_proxy) {
        Ok(proxy) => proxy,
        Err(err) => {
            log_error!("{}", err);
            return Ok(1);
        }
    };

    let tools_dir = options
        .tools_dir
        .as_deref()
        .map(expand_tilde)
        .unwrap_or_else(constants::tools_root);
    let ctx = InstallerContext {
        proxy,
        runner: Arc::new(SystemProcessRunner),
        tools_dir,
    };

    if !ensure_git_ready(&ctx, options.git_user.as_deref(), options.git_email.as_deref()) {
        log_error!("Cannot proceed without git");
        return Ok(1);
    }

    let base_dir = options
        .projects_dir
        .as_deref()
        .map(expand_tilde)
        .unwrap_or_else(constants::projects_root);
    fs::create_dir_all(&base_dir)
        .with_context(|| format!("creating projects directory {}", base_dir.display()))?;

    let cancel = Arc::new(AtomicBool::new(false));
    let repo_client = Box::new(GitCliClient::new(&ctx));
    let orchestrator = Orchestrator::new(
        ctx,
        repo_client,
        Box::new(InteractivePrompt {
            assume_yes: options.force,
        }),
        cancel,
    );

    let mut jobs: Vec<RepositoryJob> = options
        .repositories
        .iter()
        .map(|url| RepositoryJob::new(url, &base_dir))
        .collect();

    let mut successful = 0usize;
    let mut failed = 0usize;
    for job in &mut jobs {
        eprintln!();
        orchestrator.process_job(job);
        debug_assert!(job.state.is_terminal());
        if job.is_ready() {
            successful += 1;
        } else {
            failed += 1;
            if let Some(error) = &job.error {
                log_details(error);
            }
        }
    }

    print_summary(&jobs, successful, failed);
    Ok(if failed > 0 { 1 } else { 0 })
}

/// Git pre-flight: the clone stage needs a working git before any job runs.
/// An explicit identity from the CLI is applied; otherwise configuration
/// gaps are reported without prompting.
fn ensure_git_ready(
    ctx: &InstallerContext,
    git_user: Option<&str>,
    git_email: Option<&str>,
) -> bool {
    let git = GitInstaller::new(ctx);

    if !git.is_installed() {
        if let Err(err) = git.install() {
            log_error!("{}", err);
            return false;
        }
    }
    match git.detect_version() {
        Some(version) => log_success!("Git is installed (version {})", version.green()),
        None => log_warn!("[Git] Version probe failed; continuing anyway"),
    }

    if let (Some(user), Some(email)) = (git_user, git_email) {
        if !git.is_configured() {
            if let Err(err) = apply_git_identity(ctx, user, email, true) {
                log_warn!("[Git] Could not apply git identity: {}", err);
            }
        }
    } else if git.configure().is_err() {
        // configure() only reports; an error here is unexpected but not fatal.
        log_warn!("[Git] Configuration check failed");
    }

    true
}

/// Prints the per-repository table and the final counts.
fn print_summary(jobs: &[RepositoryJob], successful: usize, failed: usize) {
    eprintln!();
    log_info!("{}", "Summary".bold());

    let mut table = Table::new();
    table.set_titles(row!["Repository", "Technology", "State", "Notes"]);
    for job in jobs {
        let technology = job
            .profile
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        let notes = job.error.as_deref().unwrap_or("");
        table.add_row(row![job.url, technology, job.state.to_string(), notes]);
    }
    table.printstd();

    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    log_info!(
        "Run finished at {}: {} successful, {} failed",
        timestamp,
        successful.to_string().green().bold(),
        if failed > 0 {
            failed.to_string().red().bold()
        } else {
            failed.to_string().green()
        }
    );
}
