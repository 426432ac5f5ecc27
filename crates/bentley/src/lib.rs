// violet ignore chunk
//! ## Features
//!
//! - Standard logging levels (info, warn, error, debug, success)
//! - Multi-line message support with consistent formatting
//! - All console output to stderr
//! - Pluggable diagnostic sinks for library code that must not print
//!
//! ## Usage
//!
//! Console logging functions: `info()`, `warn()`, `error()`, `debug()`, `success()`
//!
//! Library code reports through a [`DiagnosticSink`] instead, so the caller
//! decides whether a failure lands in `tracing`, on the console, in a
//! closure, or in an in-memory buffer.

use colored::*;

pub mod diagnostics;

pub use diagnostics::{
  CallbackSink, CollectingSink, ConsoleSink, Diagnostic, DiagnosticSink, Level, TracingSink,
};

/// Core logging function that handles the actual output
pub fn log(message: &str) {
  for line in message.lines() {
    eprintln!("{line}");
  }
}

/// Format a colored, fixed-width prefix for log messages
pub(crate) fn format_prefix(color: Color, prefix: &str) -> String {
  format!("[{}]{:<width$}", prefix.color(color).bold(), "", width = 7 - prefix.len() - 2)
}

fn log_prefixed(color: Color, prefix: &str, message: &str) {
  let prefix = format_prefix(color, prefix);
  for line in message.lines() {
    log(&format!("{prefix} {line}"));
  }
}

/// Info level logging - general information
pub fn info(message: &str) {
  log_prefixed(Color::Blue, "info", message);
}

/// Warning level logging - something needs attention
pub fn warn(message: &str) {
  log_prefixed(Color::Yellow, "warn", message);
}

/// Error level logging - something went wrong
pub fn error(message: &str) {
  log_prefixed(Color::Red, "error", message);
}

/// Debug level logging - detailed diagnostic information
pub fn debug(message: &str) {
  log_prefixed(Color::Magenta, "debug", message);
}

/// Success level logging - something completed successfully
pub fn success(message: &str) {
  log_prefixed(Color::Green, "sccs", message);
}

/// Coverage-excluded success logging; expands with LCOV_EXCL_LINE at call sites
#[macro_export]
macro_rules! success {
  ($msg:expr) => {
    $crate::success($msg); // LCOV_EXCL_LINE
  };
}
