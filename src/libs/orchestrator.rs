// The orchestrator drives one repository job through the pipeline:
//
//   validate -> clone -> detect -> install -> configure
//
// Host state is never mutated before the preceding stage has unambiguously
// succeeded, and everything created while processing a job that later fails
// is reversed by rollback. Validation fails closed (nothing was created, so
// nothing is rolled back); once a clone exists, every later failure routes
// through ROLLING_BACK and deletes it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;

use crate::constants::{BUILD_TIMEOUT, MAX_RMTREE_RETRIES};
use crate::errors::{BootstrapError, Result};
use crate::installers::{Installer, InstallerContext};
use crate::libs::detector;
use crate::libs::fileops;
use crate::libs::validation::validate_repo_url;
use crate::schemas::job::{JobState, RepositoryJob};
use crate::schemas::technology::Technology;
use crate::{log_error, log_info, log_success, log_warn};

/// Clones repositories. The real implementation shells out to `git`; tests
/// substitute their own.
pub trait RepositoryClient {
    fn clone_repo(&self, url: &str, destination: &Path) -> Result<()>;
}

/// The production client: `git clone` through the process runner, with the
/// proxy environment applied.
pub struct GitCliClient {
    ctx: InstallerContext,
}

impl GitCliClient {
    pub fn new(ctx: &InstallerContext) -> Self {
        GitCliClient { ctx: ctx.clone() }
    }
}

impl RepositoryClient for GitCliClient {
    fn clone_repo(&self, url: &str, destination: &Path) -> Result<()> {
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let dest = destination.to_string_lossy().to_string();
        let (ok, output) = self.ctx.runner.run(
            &["git", "clone", url, &dest],
            None,
            BUILD_TIMEOUT,
            &self.ctx.proxy.subprocess_env(),
        );
        if ok {
            Ok(())
        } else {
            Err(BootstrapError::Clone {
                url: url.to_string(),
                reason: output.trim().to_string(),
            })
        }
    }
}

/// Decides whether an existing clone directory may be destroyed.
pub trait OverwritePrompt {
    fn confirm_overwrite(&self, path: &Path) -> bool;
}

/// Interactive confirmation via the terminal. `assume_yes` (the `--force`
/// flag) and a non-interactive session both resolve without a prompt: forced
/// runs overwrite, non-interactive runs decline.
pub struct InteractivePrompt {
    pub assume_yes: bool,
}

impl OverwritePrompt for InteractivePrompt {
    fn confirm_overwrite(&self, path: &Path) -> bool {
        if self.assume_yes {
            return true;
        }
        dialoguer::Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite it?", path.display()))
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Factory producing an installer for a project path. Registered per
/// technology kind so adding a stack means one variant and one entry here.
pub type InstallerFactory = fn(&InstallerContext, &Path) -> Box<dyn Installer>;

fn java_factory(ctx: &InstallerContext, project: &Path) -> Box<dyn Installer> {
    Box::new(crate::installers::java::JavaInstaller::new(ctx, project))
}

fn python_factory(ctx: &InstallerContext, project: &Path) -> Box<dyn Installer> {
    Box::new(crate::installers::python::PythonInstaller::new(ctx, project))
}

fn nodejs_factory(ctx: &InstallerContext, project: &Path) -> Box<dyn Installer> {
    Box::new(crate::installers::nodejs::NodeJsInstaller::new(ctx, project))
}

/// The default kind-to-installer table. All three Java kinds share the Java
/// installer: the toolchain they need is identical even though the detected
/// label differs.
pub fn default_factories() -> HashMap<Technology, InstallerFactory> {
    HashMap::from([
        (Technology::JavaSpringBoot, java_factory as InstallerFactory),
        (Technology::JavaMaven, java_factory as InstallerFactory),
        (Technology::JavaGradle, java_factory as InstallerFactory),
        (Technology::Python, python_factory as InstallerFactory),
        (Technology::NodeJs, nodejs_factory as InstallerFactory),
    ])
}

pub struct Orchestrator {
    ctx: InstallerContext,
    repo_client: Box<dyn RepositoryClient>,
    prompt: Box<dyn OverwritePrompt>,
    factories: HashMap<Technology, InstallerFactory>,
    cancel: Arc<AtomicBool>,
}

impl Orchestrator {
    pub fn new(
        ctx: InstallerContext,
        repo_client: Box<dyn RepositoryClient>,
        prompt: Box<dyn OverwritePrompt>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Orchestrator {
            ctx,
            repo_client,
            prompt,
            factories: default_factories(),
            cancel,
        }
    }

    /// Replaces the installer table. Used by tests and by front ends that
    /// register additional technologies.
    pub fn with_factories(mut self, factories: HashMap<Technology, InstallerFactory>) -> Self {
        self.factories = factories;
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Drives one job to READY or FAILED. Returns true iff the job is READY.
    pub fn process_job(&self, job: &mut RepositoryJob) -> bool {
        log_info!(
            "Processing {}",
            job.url.bright_blue().bold()
        );

        // -- VALIDATING ----------------------------------------------------
        job.state = JobState::Validating;
        if let Err(err) = validate_repo_url(&job.url) {
            log_error!("{}", err);
            job.fail(err.to_string());
            return false;
        }

        // A pre-existing target only falls when the user explicitly says so.
        if job.local_path.exists() {
            log_warn!(
                "Repository already exists at: {}",
                job.local_path.display()
            );
            if !self.prompt.confirm_overwrite(&job.local_path) {
                job.fail("target directory exists and overwrite was declined");
                return false;
            }
            if !fileops::remove_tree(&job.local_path, MAX_RMTREE_RETRIES) {
                // The old directory is presumed locked; nothing new was
                // created, so this is terminal without rollback.
                job.fail("existing directory could not be removed (locked?)");
                return false;
            }
        }

        if self.cancelled() {
            job.fail("cancelled before cloning");
            return false;
        }

        // -- CLONING -------------------------------------------------------
        job.state = JobState::Cloning;
        if let Err(err) = self.repo_client.clone_repo(&job.url, &job.local_path) {
            log_error!("{}", err);
            // git normally cleans up after itself, but a partial clone must
            // not survive either way.
            self.rollback(job, err.to_string());
            return false;
        }
        log_success!("Repository cloned to: {}", job.local_path.display().to_string().green());

        if self.cancelled() {
            self.rollback(job, "cancelled by user".to_string());
            return false;
        }

        // -- DETECTING -----------------------------------------------------
        job.state = JobState::Detecting;
        let profile = detector::detect(&job.local_path);
        if profile.kind() == Technology::Unknown {
            let err = BootstrapError::UnknownTechnology {
                repo: job.local_path.clone(),
            };
            log_error!("{}", err);
            self.rollback(job, err.to_string());
            return false;
        }
        job.profile = Some(profile);

        let Some(factory) = self.factories.get(&profile.kind()) else {
            self.rollback(
                job,
                format!("no installer available for {}", profile.kind()),
            );
            return false;
        };
        let installer = factory(&self.ctx, &job.local_path);

        if self.cancelled() {
            self.rollback(job, "cancelled by user".to_string());
            return false;
        }

        // -- INSTALLING ----------------------------------------------------
        job.state = JobState::Installing;
        if installer.is_installed() {
            log_success!("{} toolchain is already installed", installer.tool_label());
        } else {
            log_info!("Installing {} toolchain...", installer.tool_label().bold());
            if let Err(err) = self.install_and_report(installer.as_ref()) {
                self.rollback(job, err.to_string());
                return false;
            }
        }

        if self.cancelled() {
            self.rollback(job, "cancelled by user".to_string());
            return false;
        }

        // -- CONFIGURING ---------------------------------------------------
        job.state = JobState::Configuring;
        if let Err(err) = installer.configure() {
            log_error!("{}", err);
            self.rollback(job, err.to_string());
            return false;
        }

        job.state = JobState::Ready;
        log_success!(
            "Project ready at: {}",
            job.local_path.display().to_string().green().bold()
        );
        true
    }

    fn install_and_report(&self, installer: &dyn Installer) -> Result<()> {
        installer.install().inspect_err(|err| {
            log_error!("Installation failed: {}", err);
        })
    }

    /// Deletes the job's clone directory. A rollback that itself fails is
    /// reported but leaves the job FAILED all the same.
    fn rollback(&self, job: &mut RepositoryJob, cause: String) {
        job.state = JobState::RollingBack;
        if job.local_path.exists() {
            log_warn!("Rolling back partial bootstrap of {}...", job.url);
            if fileops::remove_tree(&job.local_path, MAX_RMTREE_RETRIES) {
                log_info!("Rollback complete, repository removed");
            } else {
                let err = BootstrapError::Rollback {
                    path: job.local_path.clone(),
                    reason: "directory could not be removed".to_string(),
                };
                log_error!("{}", err);
            }
        }
        job.fail(cause);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::libs::process::SystemProcessRunner;
    use crate::libs::proxy::ProxyConfig;
    use std::sync::atomic::AtomicUsize;

    /// Repository client that fabricates a checkout from a file list.
    struct FakeRepoClient {
        files: Vec<(&'static str, &'static str)>,
        clones: Arc<AtomicUsize>,
    }

    impl RepositoryClient for FakeRepoClient {
        fn clone_repo(&self, _url: &str, destination: &Path) -> Result<()> {
            self.clones.fetch_add(1, Ordering::SeqCst);
            fs::create_dir_all(destination)?;
            for (name, content) in &self.files {
                fs::write(destination.join(name), content)?;
            }
            Ok(())
        }
    }

    struct FailingRepoClient;

    impl RepositoryClient for FailingRepoClient {
        fn clone_repo(&self, url: &str, _destination: &Path) -> Result<()> {
            Err(BootstrapError::Clone {
                url: url.to_string(),
                reason: "remote hung up".to_string(),
            })
        }
    }

    struct FixedPrompt(bool);

    impl OverwritePrompt for FixedPrompt {
        fn confirm_overwrite(&self, _path: &Path) -> bool {
            self.0
        }
    }

    /// Installer stub: already installed, configures successfully.
    struct ReadyInstaller;

    impl Installer for ReadyInstaller {
        fn tool_label(&self) -> &'static str {
            "stub"
        }
        fn detect_version(&self) -> Option<String> {
            None
        }
        fn is_installed(&self) -> bool {
            true
        }
        fn install(&self) -> Result<()> {
            Ok(())
        }
        fn configure(&self) -> Result<()> {
            Ok(())
        }
    }

    fn ready_factory(_ctx: &InstallerContext, _project: &Path) -> Box<dyn Installer> {
        Box::new(ReadyInstaller)
    }

    /// Installer stub whose configure step fails.
    struct BrokenConfigureInstaller;

    impl Installer for BrokenConfigureInstaller {
        fn tool_label(&self) -> &'static str {
            "stub"
        }
        fn detect_version(&self) -> Option<String> {
            None
        }
        fn is_installed(&self) -> bool {
            true
        }
        fn install(&self) -> Result<()> {
            Ok(())
        }
        fn configure(&self) -> Result<()> {
            Err(BootstrapError::Configuration {
                component: "stub".to_string(),
                reason: "configuration exploded".to_string(),
            })
        }
    }

    fn broken_configure_factory(_ctx: &InstallerContext, _project: &Path) -> Box<dyn Installer> {
        Box::new(BrokenConfigureInstaller)
    }

    fn test_ctx(tools_dir: &Path) -> InstallerContext {
        InstallerContext {
            proxy: ProxyConfig::direct(),
            runner: Arc::new(SystemProcessRunner),
            tools_dir: tools_dir.to_path_buf(),
        }
    }

    fn orchestrator_with(
        base: &Path,
        client: Box<dyn RepositoryClient>,
        prompt: bool,
        factories: HashMap<Technology, InstallerFactory>,
    ) -> Orchestrator {
        Orchestrator::new(
            test_ctx(&base.join("tools")),
            client,
            Box::new(FixedPrompt(prompt)),
            Arc::new(AtomicBool::new(false)),
        )
        .with_factories(factories)
    }

    #[test]
    fn invalid_url_fails_closed_without_cloning() {
        let base = tempfile::tempdir().unwrap();
        let clones = Arc::new(AtomicUsize::new(0));
        let client = FakeRepoClient {
            files: vec![],
            clones: clones.clone(),
        };
        let orchestrator =
            orchestrator_with(base.path(), Box::new(client), true, default_factories());

        let mut job = RepositoryJob::new("https://github.com/u/repo;rm -rf /", base.path());
        assert!(!orchestrator.process_job(&mut job));
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(clones.load(Ordering::SeqCst), 0);
        assert!(!job.local_path.exists());
    }

    #[test]
    fn unknown_technology_rolls_back_the_clone() {
        let base = tempfile::tempdir().unwrap();
        let client = FakeRepoClient {
            files: vec![("README.md", "docs only")],
            clones: Arc::new(AtomicUsize::new(0)),
        };
        let orchestrator =
            orchestrator_with(base.path(), Box::new(client), true, default_factories());

        let mut job = RepositoryJob::new("https://github.com/u/mystery.git", base.path());
        assert!(!orchestrator.process_job(&mut job));
        assert_eq!(job.state, JobState::Failed);
        // The rollback invariant: the clone directory is gone.
        assert!(!job.local_path.exists());
        assert!(job.error.is_some());
    }

    #[test]
    fn detected_project_with_ready_toolchain_reaches_ready() {
        let base = tempfile::tempdir().unwrap();
        let client = FakeRepoClient {
            files: vec![("package.json", r#"{"name":"demo"}"#)],
            clones: Arc::new(AtomicUsize::new(0)),
        };
        let factories =
            HashMap::from([(Technology::NodeJs, ready_factory as InstallerFactory)]);
        let orchestrator = orchestrator_with(base.path(), Box::new(client), true, factories);

        let mut job = RepositoryJob::new("https://github.com/u/demo.git", base.path());
        assert!(orchestrator.process_job(&mut job));
        assert_eq!(job.state, JobState::Ready);
        assert!(job.local_path.exists());
        assert_eq!(
            job.profile.map(|p| p.kind()),
            Some(Technology::NodeJs)
        );
    }

    #[test]
    fn declined_overwrite_is_terminal_without_mutation() {
        let base = tempfile::tempdir().unwrap();
        let clones = Arc::new(AtomicUsize::new(0));
        let client = FakeRepoClient {
            files: vec![],
            clones: clones.clone(),
        };
        let orchestrator =
            orchestrator_with(base.path(), Box::new(client), false, default_factories());

        let mut job = RepositoryJob::new("https://github.com/u/demo.git", base.path());
        fs::create_dir_all(&job.local_path).unwrap();
        fs::write(job.local_path.join("precious.txt"), "keep me").unwrap();

        assert!(!orchestrator.process_job(&mut job));
        assert_eq!(job.state, JobState::Failed);
        // Declining leaves the existing directory untouched.
        assert!(job.local_path.join("precious.txt").exists());
        assert_eq!(clones.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn accepted_overwrite_replaces_the_old_checkout() {
        let base = tempfile::tempdir().unwrap();
        let client = FakeRepoClient {
            files: vec![("package.json", "{}")],
            clones: Arc::new(AtomicUsize::new(0)),
        };
        let factories =
            HashMap::from([(Technology::NodeJs, ready_factory as InstallerFactory)]);
        let orchestrator = orchestrator_with(base.path(), Box::new(client), true, factories);

        let mut job = RepositoryJob::new("https://github.com/u/demo.git", base.path());
        fs::create_dir_all(&job.local_path).unwrap();
        fs::write(job.local_path.join("stale.txt"), "old clone").unwrap();

        assert!(orchestrator.process_job(&mut job));
        assert!(!job.local_path.join("stale.txt").exists());
        assert!(job.local_path.join("package.json").exists());
    }

    #[test]
    fn clone_failure_fails_the_job() {
        let base = tempfile::tempdir().unwrap();
        let orchestrator = orchestrator_with(
            base.path(),
            Box::new(FailingRepoClient),
            true,
            default_factories(),
        );

        let mut job = RepositoryJob::new("https://github.com/u/gone.git", base.path());
        assert!(!orchestrator.process_job(&mut job));
        assert_eq!(job.state, JobState::Failed);
        assert!(!job.local_path.exists());
    }

    #[test]
    fn configure_failure_rolls_back() {
        let base = tempfile::tempdir().unwrap();
        let client = FakeRepoClient {
            files: vec![("package.json", "{}")],
            clones: Arc::new(AtomicUsize::new(0)),
        };
        let factories = HashMap::from([(
            Technology::NodeJs,
            broken_configure_factory as InstallerFactory,
        )]);
        let orchestrator = orchestrator_with(base.path(), Box::new(client), true, factories);

        let mut job = RepositoryJob::new("https://github.com/u/demo.git", base.path());
        assert!(!orchestrator.process_job(&mut job));
        assert_eq!(job.state, JobState::Failed);
        assert!(!job.local_path.exists());
        assert!(job.error.as_deref().unwrap_or("").contains("configuration"));
    }

    #[test]
    fn missing_factory_entry_rolls_back() {
        let base = tempfile::tempdir().unwrap();
        let client = FakeRepoClient {
            files: vec![("requirements.txt", "flask\n")],
            clones: Arc::new(AtomicUsize::new(0)),
        };
        // No Python entry registered.
        let factories =
            HashMap::from([(Technology::NodeJs, ready_factory as InstallerFactory)]);
        let orchestrator = orchestrator_with(base.path(), Box::new(client), true, factories);

        let mut job = RepositoryJob::new("https://github.com/u/pyapp.git", base.path());
        assert!(!orchestrator.process_job(&mut job));
        assert!(!job.local_path.exists());
        assert!(job.error.as_deref().unwrap_or("").contains("no installer"));
    }

    #[test]
    fn pre_set_cancellation_stops_before_cloning() {
        let base = tempfile::tempdir().unwrap();
        let clones = Arc::new(AtomicUsize::new(0));
        let client = FakeRepoClient {
            files: vec![],
            clones: clones.clone(),
        };
        let orchestrator = Orchestrator::new(
            test_ctx(&base.path().join("tools")),
            Box::new(client),
            Box::new(FixedPrompt(true)),
            Arc::new(AtomicBool::new(true)),
        );

        let mut job = RepositoryJob::new("https://github.com/u/demo.git", base.path());
        assert!(!orchestrator.process_job(&mut job));
        assert_eq!(job.state, JobState::Failed);
        assert_eq!(clones.load(Ordering::SeqCst), 0);
    }
}
