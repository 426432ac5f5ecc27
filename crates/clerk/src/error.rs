use thiserror::Error;

/// Fallback message for failures that carry no message of their own
pub const UNKNOWN_EXTRACTION_ERROR: &str = "Unknown extraction error";

#[derive(Error, Debug)]
pub enum ExtractionError {
  #[error("{message}")]
  Transport { message: String },

  #[error("Request failed with status code {status}")]
  Status { status: u16 },

  #[error("Malformed extraction response: {message}")]
  MalformedBody { message: String },

  #[error("Unexpected extraction response: expected a JSON object, got {found}")]
  UnexpectedShape { found: String },
}

impl ExtractionError {
  pub fn transport(message: impl Into<String>) -> Self {
    Self::Transport { message: message.into() }
  }

  pub fn status(status: u16) -> Self {
    Self::Status { status }
  }

  pub fn malformed_body(message: impl Into<String>) -> Self {
    Self::MalformedBody { message: message.into() }
  }

  pub fn unexpected_shape(found: impl Into<String>) -> Self {
    Self::UnexpectedShape { found: found.into() }
  }

  /// Message used in a failure envelope, never empty
  pub fn envelope_message(&self) -> String {
    let message = self.to_string();
    if message.trim().is_empty() {
      UNKNOWN_EXTRACTION_ERROR.to_string()
    } else {
      message
    }
  }
}

impl From<reqwest::Error> for ExtractionError {
  fn from(error: reqwest::Error) -> Self {
    if error.is_decode() {
      return Self::malformed_body(error.to_string());
    }
    match error.status() {
      Some(status) if !status.is_success() => Self::status(status.as_u16()),
      _ => Self::transport(error.to_string()),
    }
  }
}

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("Failed to read '{key}': {message}")]
  ReadFailed { key: String, message: String },

  #[error("Failed to write '{key}': {message}")]
  WriteFailed { key: String, message: String },

  #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, {limit} allowed")]
  QuotaExceeded { key: String, needed: usize, limit: usize },

  #[error("Storage unavailable: {message}")]
  Unavailable { message: String },

  #[error("Corrupt value under '{key}': {message}")]
  Corrupt { key: String, message: String },

  #[error("Failed to encode records: {message}")]
  EncodeFailed { message: String },
}

impl StoreError {
  pub fn read_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
    Self::ReadFailed { key: key.into(), message: message.into() }
  }

  pub fn write_failed(key: impl Into<String>, message: impl Into<String>) -> Self {
    Self::WriteFailed { key: key.into(), message: message.into() }
  }

  pub fn quota_exceeded(key: impl Into<String>, needed: usize, limit: usize) -> Self {
    Self::QuotaExceeded { key: key.into(), needed, limit }
  }

  pub fn unavailable(message: impl Into<String>) -> Self {
    Self::Unavailable { message: message.into() }
  }

  pub fn corrupt(key: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Corrupt { key: key.into(), message: message.into() }
  }

  pub fn encode_failed(message: impl Into<String>) -> Self {
    Self::EncodeFailed { message: message.into() }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_message_matches_http_client_wording() {
    assert_eq!(ExtractionError::status(500).to_string(), "Request failed with status code 500");
  }

  #[test]
  fn test_transport_message_passes_through() {
    assert_eq!(ExtractionError::transport("timeout").envelope_message(), "timeout");
  }

  #[test]
  fn test_empty_message_falls_back() {
    assert_eq!(ExtractionError::transport("").envelope_message(), UNKNOWN_EXTRACTION_ERROR);
    assert_eq!(ExtractionError::transport("   ").envelope_message(), UNKNOWN_EXTRACTION_ERROR);
  }

  #[test]
  fn test_store_error_names_the_key() {
    let error = StoreError::quota_exceeded("extractedDocuments", 120, 100);
    let message = error.to_string();
    assert!(message.contains("extractedDocuments"));
    assert!(message.contains("120"));
  }
}
