// This file implements the application's logging system.
// It provides macros for the different log levels (INFO, SUCCESS, WARN, ERROR, DEBUG)
// with colored terminal output, and a process-wide flag that gates debug messages.

use colored::*; // Used for adding color to log messages.
use std::sync::OnceLock; // Ensures the DEBUG_ENABLED flag is initialized exactly once.
use std::sync::atomic::{AtomicBool, Ordering}; // Thread-safe, atomic control of the debug flag.

/// Convenient logging macros.
/// `#[macro_export]` makes these macros available throughout the crate.

// `log_info!` for general application progress and informational messages.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => (eprintln!("{} {}", "[INFO]".bright_green(), format!($($arg)*)));
}

// `log_success!` for completed steps the user cares about (clone finished,
// tool installed, configuration written).
#[macro_export]
macro_rules! log_success {
    ($($arg:tt)*) => (eprintln!("{} {}", "[ OK ]".bright_green().bold(), format!($($arg)*)));
}

// `log_warn!` for non-critical issues or noteworthy conditions.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => (eprintln!("{} {}", "[WARN]".bright_yellow(), format!($($arg)*)));
}

// `log_error!` for failures that end a stage or a whole job.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => (eprintln!("{} {}", "[ERROR]".bright_red(), format!($($arg)*)));
}

// `log_debug!` for detailed internal tracing.
// Messages are only printed if debug mode is enabled via `is_debug_enabled()`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::logger::is_debug_enabled() {
           eprintln!("{} {}", "[DEBUG]".dimmed(), format!($($arg)*));
        }
    };
}

// Global flag controlling debug logging, initialized once at startup.
static DEBUG_ENABLED: OnceLock<AtomicBool> = OnceLock::new();

/// Initializes the logger, setting the global debug mode.
/// Call once at application startup, before any `log_debug!` is reachable.
///
/// # Arguments
/// * `debug`: If `true`, enables debug logging; otherwise debug messages are suppressed.
pub fn init(debug: bool) {
    DEBUG_ENABLED
        .get_or_init(|| AtomicBool::new(debug))
        .store(debug, Ordering::Relaxed);

    if debug {
        log_debug!("Logger initialized in DEBUG mode");
    }
}

/// Checks if debug logging is currently enabled.
/// Used primarily by the `log_debug!` macro.
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED
        .get()
        .map(|f| f.load(Ordering::Relaxed))
        .unwrap_or(false)
}

/// Renders an optional root-cause string as an indented `details:` line under
/// the message that preceded it. Failure reports throughout the pipeline carry
/// a short message plus this optional detail.
pub fn log_details(details: &str) {
    if !details.is_empty() {
        eprintln!("        {} {}", "details:".dimmed(), details.dimmed());
    }
}
