//! Append-only store of extracted documents.
//!
//! The whole sequence lives as one JSON array under [`RECORDS_KEY`]. Reads
//! degrade to an empty sequence when the value is missing or not a JSON
//! array; the next save then overwrites it. Array elements that are not
//! records are skipped on read and kept verbatim on write. There is no
//! locking around the read-modify-write in [`LocalRecordStore::save`]:
//! concurrent saves against the same backing store can lose an update.

use std::sync::Arc;

use bentley::{Diagnostic, DiagnosticSink, TracingSink};
use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::document::{ExtractedDocument, StoredDocumentRecord};
use crate::error::StoreError;
use crate::storage::KeyValueStore;

/// Key the record sequence is stored under
pub const RECORDS_KEY: &str = "extractedDocuments";

const COMPONENT: &str = "records";

/// How record ids are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdStrategy {
  /// Milliseconds since the Unix epoch; saves within the same millisecond collide
  #[default]
  WallClock,
  /// Wall-clock milliseconds, bumped past the largest id already stored
  Monotonic,
}

impl std::str::FromStr for IdStrategy {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "wallclock" | "wall-clock" | "clock" => Ok(Self::WallClock),
      "monotonic" => Ok(Self::Monotonic),
      other => Err(format!("unknown id strategy '{other}' (expected wallclock or monotonic)")),
    }
  }
}

pub struct LocalRecordStore {
  store: Arc<dyn KeyValueStore>,
  clock: Arc<dyn Clock>,
  diagnostics: Arc<dyn DiagnosticSink>,
  id_strategy: IdStrategy,
}

impl LocalRecordStore {
  pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
    Self {
      store,
      clock: Arc::new(SystemClock),
      diagnostics: Arc::new(TracingSink),
      id_strategy: IdStrategy::default(),
    }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
    self.diagnostics = diagnostics;
    self
  }

  pub fn with_id_strategy(mut self, id_strategy: IdStrategy) -> Self {
    self.id_strategy = id_strategy;
    self
  }

  /// Stored records in insertion order; missing or unreadable data yields an empty list
  pub fn load(&self) -> Vec<StoredDocumentRecord> {
    match self.try_load() {
      Ok(records) => records,
      Err(e) => {
        self.report(format!("Failed to load extracted documents: {e}"));
        Vec::new()
      }
    }
  }

  /// Like [`Self::load`], but a missing array or a read failure is returned.
  /// Elements that are not records are skipped and reported.
  pub fn try_load(&self) -> Result<Vec<StoredDocumentRecord>, StoreError> {
    let elements = self.read_elements()?;
    Ok(self.parse_records(&elements))
  }

  /// Append `document` with a fresh id and write the whole sequence back.
  /// Stored elements that are not records are written back untouched.
  pub fn save(&self, document: ExtractedDocument) -> Result<StoredDocumentRecord, StoreError> {
    let mut elements = match self.read_elements() {
      Ok(elements) => elements,
      Err(e) => {
        self.report(format!("Failed to load extracted documents: {e}"));
        Vec::new()
      }
    };

    let existing = self.parse_records(&elements);
    let record = StoredDocumentRecord::new(self.next_id(&existing), document);

    let result = serde_json::to_value(&record)
      .map_err(|e| StoreError::encode_failed(e.to_string()))
      .and_then(|value| {
        elements.push(value);
        self.write(&elements)
      });

    match result {
      Ok(()) => {
        tracing::debug!(id = record.id, total = elements.len(), "saved extracted document");
        Ok(record)
      }
      Err(e) => {
        self.report(format!("Failed to save extracted document: {e}"));
        Err(e)
      }
    }
  }

  /// Replace the sequence with an empty one
  pub fn clear(&self) -> Result<(), StoreError> {
    self.write(&[]).map_err(|e| {
      self.report(format!("Failed to clear extracted documents: {e}"));
      e
    })
  }

  /// Raw array elements; absent means empty, anything but a JSON array is corrupt
  fn read_elements(&self) -> Result<Vec<Value>, StoreError> {
    let raw = self.store.get(RECORDS_KEY)?;
    let raw = raw.as_deref().unwrap_or("[]");

    match serde_json::from_str::<Value>(raw) {
      Ok(Value::Array(elements)) => Ok(elements),
      Ok(_) => Err(StoreError::corrupt(RECORDS_KEY, "expected a JSON array")),
      Err(e) => Err(StoreError::corrupt(RECORDS_KEY, e.to_string())),
    }
  }

  fn parse_records(&self, elements: &[Value]) -> Vec<StoredDocumentRecord> {
    elements
      .iter()
      .enumerate()
      .filter_map(|(index, element)| {
        match serde_json::from_value::<StoredDocumentRecord>(element.clone()) {
          Ok(record) => Some(record),
          Err(e) => {
            self.diagnostics.report(&Diagnostic::warn(
              COMPONENT,
              format!("Skipping stored element {index}: {e}"),
            ));
            None
          }
        }
      })
      .collect()
  }

  fn write(&self, elements: &[Value]) -> Result<(), StoreError> {
    let serialized =
      serde_json::to_string(elements).map_err(|e| StoreError::encode_failed(e.to_string()))?;
    self.store.set(RECORDS_KEY, &serialized)
  }

  fn next_id(&self, existing: &[StoredDocumentRecord]) -> i64 {
    let now = self.clock.now().timestamp_millis();
    match self.id_strategy {
      IdStrategy::WallClock => now,
      IdStrategy::Monotonic => match existing.iter().map(|record| record.id).max() {
        Some(largest) if largest >= now => largest + 1,
        _ => now,
      },
    }
  }

  fn report(&self, message: String) {
    self.diagnostics.report(&Diagnostic::error(COMPONENT, message));
  }
}
