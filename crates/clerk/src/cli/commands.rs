use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bentley::{ConsoleSink, Level};

use crate::cli::display::{display_record, display_result};
use crate::config::ClerkConfig;
use crate::document::{ExtractionResult, Upload};
use crate::extraction::ExtractionClient;
use crate::records::LocalRecordStore;
use crate::storage::FileStore;

/// Record store over the configured storage directory
pub fn open_record_store(config: &ClerkConfig) -> LocalRecordStore {
  LocalRecordStore::new(Arc::new(FileStore::new(&config.storage_dir)))
    .with_diagnostics(Arc::new(ConsoleSink::new(Level::Warn)))
    .with_id_strategy(config.id_strategy)
}

/// Extract a document and, unless told otherwise, keep the result
pub async fn extract_document(
  config: &ClerkConfig,
  path: &Path,
  save: bool,
  json: bool,
) -> Result<()> {
  let upload = Upload::from_path(path)
    .await
    .with_context(|| format!("Failed to read {}", path.display()))?;

  let client = ExtractionClient::new(config).context("Failed to create HTTP client")?;
  let result = client.extract(&upload).await;

  if json {
    println!("{}", serde_json::to_string_pretty(&result)?);
  } else {
    display_result(&result, &upload.file_name);
  }

  match result {
    ExtractionResult::Success { data } => {
      if save {
        let record = open_record_store(config).save(data).context("Failed to save document")?;
        bentley::success!(&format!("Saved as record {}", record.id));
      }
      Ok(())
    }
    ExtractionResult::Failure { error } => Err(anyhow!("Extraction failed: {error}")),
  }
}

/// Print every stored record in insertion order
pub fn list_documents(config: &ClerkConfig, json: bool) -> Result<()> {
  let records = open_record_store(config).load();

  if json {
    println!("{}", serde_json::to_string_pretty(&records)?);
    return Ok(());
  }

  if records.is_empty() {
    println!("No extracted documents found.");
    return Ok(());
  }

  for record in &records {
    display_record(record);
  }
  println!("\n{} document(s)", records.len());

  Ok(())
}

/// Drop every stored record
pub fn clear_documents(config: &ClerkConfig) -> Result<()> {
  open_record_store(config).clear().context("Failed to clear documents")?;
  bentley::success!("Cleared extracted documents");
  Ok(())
}
