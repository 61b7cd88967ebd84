// External process execution with captured output and a hard timeout.
//
// Every toolchain probe, build command, and `git clone` goes through this
// seam. The trait exists so the orchestrator and installers can be exercised
// in tests without spawning real processes.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::log_debug;

/// Interval between liveness polls of a running child.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs external commands to completion (or timeout) and reports success
/// together with the combined stdout+stderr text.
pub trait ProcessRunner: Send + Sync {
    /// Executes `argv` in `cwd` (or the current directory) with the extra
    /// environment applied. Returns `(success, combined_output)`; a missing
    /// executable, a non-zero exit, and a timeout are all `success == false`.
    fn run(
        &self,
        argv: &[&str],
        cwd: Option<&Path>,
        timeout: Duration,
        extra_env: &[(String, String)],
    ) -> (bool, String);
}

/// The production runner: spawns real processes via `std::process::Command`.
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(
        &self,
        argv: &[&str],
        cwd: Option<&Path>,
        timeout: Duration,
        extra_env: &[(String, String)],
    ) -> (bool, String) {
        let Some((program, args)) = argv.split_first() else {
            return (false, "empty command".to_string());
        };
        log_debug!("[Process] Running: {}", argv.join(" "));

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        for (name, value) in extra_env {
            command.env(name, value);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                return (false, format!("failed to start '{}': {}", program, err));
            }
        };

        // Drain both pipes on background threads; a child that fills one pipe
        // while we wait on the other would otherwise deadlock.
        let stdout_handle = child.stdout.take().map(spawn_reader);
        let stderr_handle = child.stderr.take().map(spawn_reader);

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        break None;
                    }
                    std::thread::sleep(POLL_INTERVAL);
                }
                Err(err) => {
                    return (false, format!("failed waiting for '{}': {}", program, err));
                }
            }
        };

        let mut output = String::new();
        if let Some(handle) = stdout_handle {
            output.push_str(&handle.join().unwrap_or_default());
        }
        if let Some(handle) = stderr_handle {
            output.push_str(&handle.join().unwrap_or_default());
        }

        match status {
            Some(status) => (status.success(), output),
            None => {
                output.push_str(&format!(
                    "\ncommand timed out after {} seconds",
                    timeout.as_secs()
                ));
                (false, output)
            }
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut source: R) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buffer = String::new();
        let _ = source.read_to_string(&mut buffer);
        buffer
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_output_of_a_successful_command() {
        let runner = SystemProcessRunner;
        let (ok, output) = runner.run(&["echo", "hello"], None, Duration::from_secs(5), &[]);
        assert!(ok);
        assert!(output.contains("hello"));
    }

    #[test]
    fn missing_executable_reports_failure_not_panic() {
        let runner = SystemProcessRunner;
        let (ok, output) = runner.run(
            &["definitely-not-a-real-binary-xyz"],
            None,
            Duration::from_secs(5),
            &[],
        );
        assert!(!ok);
        assert!(output.contains("failed to start"));
    }

    #[test]
    fn nonzero_exit_is_a_failure() {
        let runner = SystemProcessRunner;
        let (ok, _) = runner.run(&["false"], None, Duration::from_secs(5), &[]);
        assert!(!ok);
    }

    #[test]
    fn long_running_commands_are_killed_at_the_deadline() {
        let runner = SystemProcessRunner;
        let started = Instant::now();
        let (ok, output) = runner.run(&["sleep", "30"], None, Duration::from_millis(300), &[]);
        assert!(!ok);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(output.contains("timed out"));
    }

    #[test]
    fn extra_environment_reaches_the_child() {
        let runner = SystemProcessRunner;
        let env = vec![("BOOTSTRAP_TEST_VAR".to_string(), "present".to_string())];
        let (ok, output) = runner.run(
            &["sh", "-c", "echo $BOOTSTRAP_TEST_VAR"],
            None,
            Duration::from_secs(5),
            &env,
        );
        assert!(ok);
        assert!(output.contains("present"));
    }
}
