//! Diagnostic channel for library code
//!
//! Components that must never fail loudly (stores that degrade to empty,
//! clients that fold errors into result values) still need somewhere to say
//! what went wrong. They take an `Arc<dyn DiagnosticSink>` and report to it;
//! the caller chooses the sink.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use colored::*;
use serde::{Deserialize, Serialize};

// Types and Data Structures
// =========================

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
  Debug,
  Info,
  Warn,
  Error,
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      Level::Debug => "debug",
      Level::Info => "info",
      Level::Warn => "warn",
      Level::Error => "error",
    };
    f.write_str(label)
  }
}

/// A single reported event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
  pub timestamp: DateTime<Utc>,
  pub level: Level,
  pub component: String,
  pub message: String,
}

impl Diagnostic {
  pub fn new(level: Level, component: &str, message: impl Into<String>) -> Self {
    Self { timestamp: Utc::now(), level, component: component.to_string(), message: message.into() }
  }

  pub fn error(component: &str, message: impl Into<String>) -> Self {
    Self::new(Level::Error, component, message)
  }

  pub fn warn(component: &str, message: impl Into<String>) -> Self {
    Self::new(Level::Warn, component, message)
  }
}

/// Receiver for diagnostics
pub trait DiagnosticSink: Send + Sync {
  fn report(&self, diagnostic: &Diagnostic);
}

// Sinks
// =====

/// Forwards diagnostics to `tracing` at the matching level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
  fn report(&self, diagnostic: &Diagnostic) {
    let component = diagnostic.component.as_str();
    let message = diagnostic.message.as_str();
    match diagnostic.level {
      Level::Debug => tracing::debug!(component = %component, "{message}"),
      Level::Info => tracing::info!(component = %component, "{message}"),
      Level::Warn => tracing::warn!(component = %component, "{message}"),
      Level::Error => tracing::error!(component = %component, "{message}"),
    }
  }
}

/// Writes diagnostics to stderr with the usual bentley prefixes
#[derive(Debug, Clone, Copy)]
pub struct ConsoleSink {
  min_level: Level,
}

impl Default for ConsoleSink {
  fn default() -> Self {
    Self { min_level: Level::Info }
  }
}

impl ConsoleSink {
  pub fn new(min_level: Level) -> Self {
    Self { min_level }
  }
}

impl DiagnosticSink for ConsoleSink {
  fn report(&self, diagnostic: &Diagnostic) {
    if diagnostic.level < self.min_level {
      return;
    }

    let text = format!("{}: {}", diagnostic.component.dimmed(), diagnostic.message);
    match diagnostic.level {
      Level::Debug => crate::debug(&text),
      Level::Info => crate::info(&text),
      Level::Warn => crate::warn(&text),
      Level::Error => crate::error(&text),
    }
  }
}

/// Hands every diagnostic to a closure
pub struct CallbackSink<F>
where
  F: Fn(&Diagnostic) + Send + Sync,
{
  callback: F,
}

impl<F> CallbackSink<F>
where
  F: Fn(&Diagnostic) + Send + Sync,
{
  pub fn new(callback: F) -> Self {
    Self { callback }
  }
}

impl<F> DiagnosticSink for CallbackSink<F>
where
  F: Fn(&Diagnostic) + Send + Sync,
{
  fn report(&self, diagnostic: &Diagnostic) {
    (self.callback)(diagnostic)
  }
}

/// Bounded in-memory buffer of diagnostics, oldest dropped first
pub struct CollectingSink {
  entries: Mutex<VecDeque<Diagnostic>>,
  max_entries: usize,
}

impl Default for CollectingSink {
  fn default() -> Self {
    Self::new(256)
  }
}

impl CollectingSink {
  pub fn new(max_entries: usize) -> Self {
    Self { entries: Mutex::new(VecDeque::with_capacity(max_entries)), max_entries }
  }

  /// Retrieve diagnostics newest first, optionally filtered by minimum level and limited
  pub fn entries(&self, limit: Option<usize>, min_level: Option<Level>) -> Vec<Diagnostic> {
    let entries = match self.entries.lock() {
      Ok(entries) => entries,
      Err(poisoned) => poisoned.into_inner(),
    };

    let mut found: Vec<Diagnostic> = entries
      .iter()
      .rev()
      .filter(|entry| min_level.map_or(true, |level| entry.level >= level))
      .cloned()
      .collect();

    if let Some(limit) = limit {
      found.truncate(limit);
    }

    found
  }

  /// All messages in the order they were reported
  pub fn messages(&self) -> Vec<String> {
    let mut messages: Vec<String> =
      self.entries(None, None).into_iter().map(|entry| entry.message).collect();
    messages.reverse();
    messages
  }

  pub fn len(&self) -> usize {
    self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  pub fn max_capacity(&self) -> usize {
    self.max_entries
  }
}

impl DiagnosticSink for CollectingSink {
  fn report(&self, diagnostic: &Diagnostic) {
    let mut entries = match self.entries.lock() {
      Ok(entries) => entries,
      Err(poisoned) => poisoned.into_inner(),
    };

    if self.max_entries == 0 {
      return;
    }
    if entries.len() >= self.max_entries {
      entries.pop_front();
    }
    entries.push_back(diagnostic.clone());
  }
}
