//! Clerk - claim document extraction
//!
//! Uploads claim documents (invoices, estimates, photos of damage) to a
//! document extraction service, normalizes the answer into a success or
//! failure envelope, and keeps successful extractions in a local
//! append-only record store.

pub mod cli;
pub mod clock;
pub mod config;
pub mod document;
pub mod error;
pub mod extraction;
pub mod records;
pub mod storage;

pub use config::ClerkConfig;
pub use document::{ExtractedDocument, ExtractionResult, StoredDocumentRecord, Upload};
pub use error::{ExtractionError, StoreError};
pub use extraction::{ExtractionClient, ExtractionTransport, HttpTransport};
pub use records::{IdStrategy, LocalRecordStore, RECORDS_KEY};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
