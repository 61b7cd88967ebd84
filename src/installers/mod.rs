// Toolchain installers, one module per technology family.
//
// Every installer implements the same capability set (`detect_version`,
// `is_installed`, `install`, `configure`) and none may assume another has
// run: `is_installed` short-circuits `install` on repeat invocations, which
// is what makes re-running the bootstrap a no-op on a prepared machine.

use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::Result;
use crate::libs::process::ProcessRunner;
use crate::libs::proxy::ProxyConfig;

// Git: probe, version, global configuration.
pub mod git;
// JDK + Maven/Gradle projects.
pub mod java;
// Node.js runtime and npm projects.
pub mod nodejs;
// Python runtime, pip and venv projects.
pub mod python;
// The shared download-install-wire algorithm all archive installers reuse.
pub mod toolchain;

/// Everything an installer needs from its surroundings, constructed once per
/// run and threaded through explicitly; no installer reads ambient global
/// state beyond the process environment it deliberately writes.
#[derive(Clone)]
pub struct InstallerContext {
    pub proxy: ProxyConfig,
    pub runner: Arc<dyn ProcessRunner>,
    pub tools_dir: PathBuf,
}

/// The capability set shared by all toolchain installers.
pub trait Installer {
    /// Short name for logs ("java", "python", ...).
    fn tool_label(&self) -> &'static str;

    /// Version the project asks for, read from its build files. `None` when
    /// nothing in the project pins one.
    fn detect_version(&self) -> Option<String>;

    /// True when the toolchain already answers a version probe.
    fn is_installed(&self) -> bool;

    /// Installs the toolchain. Must be idempotent: a present installation
    /// directory means no download happens and success is returned.
    fn install(&self) -> Result<()>;

    /// Configures the project to build: config files, proxy wiring, and a
    /// best-effort dependency prefetch whose failure is a warning, not an
    /// error.
    fn configure(&self) -> Result<()>;
}
