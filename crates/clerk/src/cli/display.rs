//! Display formatting utilities for CLI output

use colored::*;
use serde_json::Value;

use crate::document::{ExtractedDocument, ExtractionResult, StoredDocumentRecord};

/// Longest rendered field value before it is cut short
const MAX_VALUE_WIDTH: usize = 60;

/// Render a JSON value on one line, strings without quotes
pub fn inline_value(value: &Value) -> String {
  let text = match value {
    Value::String(s) => s.clone(),
    other => other.to_string(),
  };
  truncate(&text, MAX_VALUE_WIDTH)
}

fn truncate(text: &str, width: usize) -> String {
  if text.chars().count() <= width {
    return text.to_string();
  }
  let cut: String = text.chars().take(width.saturating_sub(1)).collect();
  format!("{cut}…")
}

/// One indented `key: value` line per extracted field
pub fn field_lines(document: &ExtractedDocument) -> Vec<String> {
  document
    .fields()
    .iter()
    .map(|(key, value)| format!("  {}: {}", key.cyan(), inline_value(value)))
    .collect()
}

pub fn display_result(result: &ExtractionResult, file_name: &str) {
  match result {
    ExtractionResult::Success { data } => {
      println!("{} Extracted {}", "✓".green(), file_name.yellow());
      if let Some(date) = data.extraction_date() {
        println!("  {}: {}", "extractionDate".dimmed(), date);
      }
      for line in field_lines(data) {
        println!("{line}");
      }
    }
    ExtractionResult::Failure { error } => {
      println!("{} Extraction failed for {}: {}", "✗".red(), file_name.yellow(), error);
    }
  }
}

pub fn display_record(record: &StoredDocumentRecord) {
  let date = record.document.extraction_date().unwrap_or("unknown date");
  println!("{} {} {}", "📄".yellow(), record.id.to_string().bold(), date.dimmed());
  for line in field_lines(&record.document) {
    println!("{line}");
  }
}
