// Environment wiring: the per-project `.env` file, the current process's
// variables, and the persistent sink that makes a toolchain visible to future
// shells. The three are deliberately separate writes; a failed persistent
// write must never take down an install that already works for this run.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::errors::Result;
use crate::libs::validation::validate_env_var_name;
use crate::{log_debug, log_success, log_warn};

/// Durable (cross-session) environment changes. The pipeline only ever talks
/// to this interface; how a variable survives the process (shell RC file,
/// registry, systemd user environment) is the sink's business.
pub trait PersistentEnvironmentSink {
    fn set_variable(&self, name: &str, value: &str) -> io::Result<()>;
    fn prepend_to_path(&self, path: &Path) -> io::Result<()>;
}

/// Sink that appends `export` lines to the user's shell RC file
/// (`~/.zshrc` or `~/.bashrc`, chosen from `$SHELL`).
pub struct ShellRcSink {
    rc_path: Option<PathBuf>,
}

impl ShellRcSink {
    pub fn from_environment() -> Self {
        let shell = std::env::var("SHELL").unwrap_or_default();
        let shell_name = shell.rsplit('/').next().unwrap_or("");
        let rc_file = match shell_name {
            "zsh" => Some(".zshrc"),
            "bash" | "" | "sh" => Some(".bashrc"),
            other => {
                log_warn!(
                    "[Env] Unsupported shell '{}'; persistent environment changes are skipped",
                    other.yellow()
                );
                None
            }
        };
        let rc_path = rc_file.and_then(|name| dirs::home_dir().map(|home| home.join(name)));
        ShellRcSink { rc_path }
    }

    fn append_line(&self, line: &str) -> io::Result<()> {
        let Some(rc_path) = &self.rc_path else {
            return Err(io::Error::other("no writable shell RC file"));
        };
        let mut file = OpenOptions::new().create(true).append(true).open(rc_path)?;
        writeln!(file, "{}", line)?;
        log_debug!("[Env] Appended to {}: {}", rc_path.display(), line);
        Ok(())
    }
}

impl PersistentEnvironmentSink for ShellRcSink {
    fn set_variable(&self, name: &str, value: &str) -> io::Result<()> {
        self.append_line(&format!("export {}=\"{}\"", name, value))
    }

    fn prepend_to_path(&self, path: &Path) -> io::Result<()> {
        self.append_line(&format!("export PATH=\"{}:$PATH\"", path.display()))
    }
}

/// Sink that drops everything. Used where persistence is explicitly unwanted
/// (tests, dry runs).
pub struct DiscardingSink;

impl PersistentEnvironmentSink for DiscardingSink {
    fn set_variable(&self, _name: &str, _value: &str) -> io::Result<()> {
        Ok(())
    }

    fn prepend_to_path(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Manages one project's environment file and the current process state.
pub struct EnvironmentManager {
    project_path: PathBuf,
    env_file: PathBuf,
}

impl EnvironmentManager {
    pub fn new(project_path: &Path) -> Self {
        EnvironmentManager {
            project_path: project_path.to_path_buf(),
            env_file: project_path.join(".env"),
        }
    }

    pub fn env_file(&self) -> &Path {
        &self.env_file
    }

    /// Creates the project `.env` file with the given variables, validating
    /// every name first. An existing file is left untouched.
    pub fn create_env_file(&self, variables: &[(&str, &str)]) -> Result<()> {
        for (name, _) in variables {
            validate_env_var_name(name)?;
        }
        if self.env_file.exists() {
            log_debug!("[Env] {} already exists, keeping it", self.env_file.display());
            return Ok(());
        }

        let mut file = fs::File::create(&self.env_file)?;
        for (name, value) in variables {
            writeln!(file, "{}={}", name, value)?;
        }
        log_success!("Created .env file: {}", self.env_file.display().to_string().green());
        Ok(())
    }

    /// Appends one `KEY=value` line to the project `.env` file. Lines are
    /// appended as-is, without deduplication; the last occurrence wins for
    /// every consumer that reads the file top to bottom.
    pub fn append_to_env(&self, name: &str, value: &str) -> Result<()> {
        validate_env_var_name(name)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.env_file)?;
        writeln!(file, "{}={}", name, value)?;
        Ok(())
    }

    /// Writes a configuration file under the project, creating intermediate
    /// directories. Returns the path written.
    pub fn write_config_file(
        &self,
        file_name: &str,
        content: &str,
        subdir: Option<&str>,
    ) -> Result<PathBuf> {
        let path = match subdir {
            Some(dir) => self.project_path.join(dir).join(file_name),
            None => self.project_path.join(file_name),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        log_debug!("[Env] Wrote config file: {}", path.display());
        Ok(path)
    }
}

/// Sets a variable in the current process environment so subsequent stages of
/// this run see it immediately.
pub fn set_process_var(name: &str, value: &str) {
    // SAFETY: callers mutate the environment from the single orchestration
    // thread only; no other thread reads the environment concurrently.
    unsafe { std::env::set_var(name, value) };
}

/// Prepends a directory to the current process PATH unless already present.
pub fn prepend_process_path(dir: &Path) {
    let dir_str = dir.to_string_lossy();
    let current = std::env::var("PATH").unwrap_or_default();
    if current.split(':').any(|entry| entry == dir_str) {
        return;
    }
    let updated = if current.is_empty() {
        dir_str.to_string()
    } else {
        format!("{}:{}", dir_str, current)
    };
    set_process_var("PATH", &updated);
    log_debug!("[Env] Prepended to process PATH: {}", dir.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_file_lines_are_appended_without_dedup() {
        let dir = tempfile::tempdir().unwrap();
        let manager = EnvironmentManager::new(dir.path());

        manager.append_to_env("JAVA_HOME", "/opt/jdk-17").unwrap();
        manager.append_to_env("JAVA_HOME", "/opt/jdk-21").unwrap();

        let content = fs::read_to_string(manager.env_file()).unwrap();
        assert_eq!(content, "JAVA_HOME=/opt/jdk-17\nJAVA_HOME=/opt/jdk-21\n");
    }

    #[test]
    fn invalid_names_are_rejected_before_touching_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = EnvironmentManager::new(dir.path());

        assert!(manager.append_to_env("BAD-NAME", "x").is_err());
        assert!(!manager.env_file().exists());
    }

    #[test]
    fn create_env_file_keeps_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = EnvironmentManager::new(dir.path());
        fs::write(manager.env_file(), "PRESET=1\n").unwrap();

        manager.create_env_file(&[("NODE_ENV", "development")]).unwrap();
        let content = fs::read_to_string(manager.env_file()).unwrap();
        assert_eq!(content, "PRESET=1\n");
    }

    #[test]
    fn config_files_land_in_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let manager = EnvironmentManager::new(dir.path());

        let written = manager
            .write_config_file(
                "application.properties",
                "server.port=8080\n",
                Some("src/main/resources"),
            )
            .unwrap();
        assert!(written.exists());
        assert!(written.ends_with("src/main/resources/application.properties"));
    }
}
