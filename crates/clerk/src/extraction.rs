//! Client for the document extraction service.
//!
//! `extract` never returns `Err`: every failure is folded into
//! [`ExtractionResult::Failure`] and reported to the diagnostic sink.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bentley::{Diagnostic, DiagnosticSink, TracingSink};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::{Map, Value};

use crate::clock::{iso_timestamp, Clock, SystemClock};
use crate::config::ClerkConfig;
use crate::document::{ExtractedDocument, ExtractionResult, Upload};
use crate::error::ExtractionError;

/// Multipart field the file is sent under
pub const UPLOAD_FIELD: &str = "file";

const COMPONENT: &str = "extraction";

/// One round trip to the extraction service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExtractionTransport: Send + Sync {
  /// The service's JSON object payload for `upload`
  async fn submit(&self, upload: &Upload) -> Result<Map<String, Value>, ExtractionError>;
}

/// Multipart POST over HTTP
pub struct HttpTransport {
  client: Client,
  url: String,
}

impl HttpTransport {
  /// `timeout` of `None` leaves the HTTP client's defaults in place
  pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ExtractionError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder.build()?;

    Ok(Self { client, url: url.into() })
  }

  pub fn from_config(config: &ClerkConfig) -> Result<Self, ExtractionError> {
    Self::new(config.extraction_url(), config.timeout())
  }

  pub fn url(&self) -> &str {
    &self.url
  }
}

#[async_trait]
impl ExtractionTransport for HttpTransport {
  async fn submit(&self, upload: &Upload) -> Result<Map<String, Value>, ExtractionError> {
    let part = Part::bytes(upload.bytes.clone())
      .file_name(upload.file_name.clone())
      .mime_str(&upload.content_type)?;
    let form = Form::new().part(UPLOAD_FIELD, part);

    tracing::debug!(url = %self.url, file = %upload.file_name, bytes = upload.len(), "submitting document");
    let response = self.client.post(&self.url).multipart(form).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(ExtractionError::status(status.as_u16()));
    }

    let body = response.text().await?;
    parse_payload(&body)
  }
}

/// Only a JSON object counts as a payload
pub fn parse_payload(body: &str) -> Result<Map<String, Value>, ExtractionError> {
  let value: Value =
    serde_json::from_str(body).map_err(|e| ExtractionError::malformed_body(e.to_string()))?;

  match value {
    Value::Object(map) => Ok(map),
    Value::Array(_) => Err(ExtractionError::unexpected_shape("an array")),
    Value::String(_) => Err(ExtractionError::unexpected_shape("a string")),
    Value::Number(_) => Err(ExtractionError::unexpected_shape("a number")),
    Value::Bool(_) => Err(ExtractionError::unexpected_shape("a boolean")),
    Value::Null => Err(ExtractionError::unexpected_shape("null")),
  }
}

pub struct ExtractionClient {
  transport: Box<dyn ExtractionTransport>,
  clock: Arc<dyn Clock>,
  diagnostics: Arc<dyn DiagnosticSink>,
}

impl ExtractionClient {
  /// HTTP client against the configured service
  pub fn new(config: &ClerkConfig) -> Result<Self, ExtractionError> {
    Ok(Self::with_transport(Box::new(HttpTransport::from_config(config)?)))
  }

  /// Client over any transport (used for dependency injection in tests)
  pub fn with_transport(transport: Box<dyn ExtractionTransport>) -> Self {
    Self { transport, clock: Arc::new(SystemClock), diagnostics: Arc::new(TracingSink) }
  }

  pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
    self.clock = clock;
    self
  }

  pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
    self.diagnostics = diagnostics;
    self
  }

  /// Submit `upload` once and normalize the outcome
  pub async fn extract(&self, upload: &Upload) -> ExtractionResult {
    match self.transport.submit(upload).await {
      Ok(payload) => {
        let extracted_at = iso_timestamp(self.clock.now());
        ExtractionResult::success(ExtractedDocument::from_payload(payload, extracted_at))
      }
      Err(e) => {
        let message = e.envelope_message();
        self.diagnostics.report(&Diagnostic::error(
          COMPONENT,
          format!("Document extraction failed for '{}': {message}", upload.file_name),
        ));
        ExtractionResult::failure(message)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::clock::FixedClock;
  use crate::error::UNKNOWN_EXTRACTION_ERROR;
  use bentley::CollectingSink;
  use chrono::{TimeZone, Utc};
  use mockall::predicate::*;
  use mockito::{Matcher, Server};
  use serde_json::json;

  fn upload() -> Upload {
    Upload::new("invoice.pdf", b"%PDF-1.4 test".to_vec())
  }

  fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()))
  }

  fn client_with(mock: MockExtractionTransport) -> (ExtractionClient, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::default());
    let client = ExtractionClient::with_transport(Box::new(mock))
      .with_clock(fixed_clock())
      .with_diagnostics(sink.clone());
    (client, sink)
  }

  #[tokio::test]
  async fn test_success_spreads_payload_and_stamps_date() {
    let mut mock = MockExtractionTransport::new();
    mock.expect_submit().with(eq(upload())).times(1).returning(|_| {
      match json!({"type": "invoice"}) {
        Value::Object(map) => Ok(map),
        _ => unreachable!(),
      }
    });
    let (client, sink) = client_with(mock);

    let result = client.extract(&upload()).await;

    assert_eq!(
      serde_json::to_value(&result).unwrap(),
      json!({
        "success": true,
        "data": {"type": "invoice", "extractionDate": "2026-10-19T08:30:00.000Z"}
      })
    );
    assert!(sink.is_empty());
  }

  #[tokio::test]
  async fn test_network_failure_becomes_failure_variant() {
    let mut mock = MockExtractionTransport::new();
    mock.expect_submit().times(1).returning(|_| Err(ExtractionError::transport("timeout")));
    let (client, sink) = client_with(mock);

    let result = client.extract(&upload()).await;

    assert_eq!(result, ExtractionResult::failure("timeout"));
    assert_eq!(sink.len(), 1);
    assert!(sink.messages()[0].contains("invoice.pdf"));
  }

  #[tokio::test]
  async fn test_error_without_message_uses_fallback() {
    let mut mock = MockExtractionTransport::new();
    mock.expect_submit().times(1).returning(|_| Err(ExtractionError::transport("")));
    let (client, _sink) = client_with(mock);

    let result = client.extract(&upload()).await;

    assert_eq!(
      serde_json::to_value(&result).unwrap(),
      json!({"success": false, "error": UNKNOWN_EXTRACTION_ERROR})
    );
  }

  #[tokio::test]
  async fn test_each_call_is_a_single_attempt() {
    let mut mock = MockExtractionTransport::new();
    mock.expect_submit().times(2).returning(|_| Err(ExtractionError::status(503)));
    let (client, sink) = client_with(mock);

    client.extract(&upload()).await;
    let result = client.extract(&upload()).await;

    assert_eq!(result.error(), Some("Request failed with status code 503"));
    assert_eq!(sink.len(), 2);
  }

  #[test]
  fn test_parse_payload_rejects_non_objects() {
    assert!(parse_payload(r#"{"type":"invoice"}"#).is_ok());
    assert!(matches!(parse_payload("[1,2]"), Err(ExtractionError::UnexpectedShape { .. })));
    assert!(matches!(parse_payload("null"), Err(ExtractionError::UnexpectedShape { .. })));
    assert!(matches!(parse_payload("<html>"), Err(ExtractionError::MalformedBody { .. })));
  }

  #[tokio::test]
  async fn test_http_transport_posts_multipart_file_field() {
    let mut server = Server::new_async().await;
    let mock = server
      .mock("POST", "/api/extract-document")
      .match_header("content-type", Matcher::Regex("^multipart/form-data; boundary=".to_string()))
      .match_body(Matcher::AllOf(vec![
        Matcher::Regex(r#"name="file"; filename="invoice.pdf""#.to_string()),
        Matcher::Regex("Content-Type: application/pdf".to_string()),
        Matcher::Regex("%PDF-1.4 test".to_string()),
      ]))
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(r#"{"type":"invoice","claimNumber":"CLM-1042"}"#)
      .create_async()
      .await;

    let transport =
      HttpTransport::new(format!("{}/api/extract-document", server.url()), None).unwrap();
    let payload = transport.submit(&upload()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(payload.get("claimNumber"), Some(&json!("CLM-1042")));
  }

  #[tokio::test]
  async fn test_http_transport_non_2xx_is_status_error() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", "/api/extract-document")
      .with_status(500)
      .with_body(r#"{"error":"model unavailable"}"#)
      .create_async()
      .await;

    let transport =
      HttpTransport::new(format!("{}/api/extract-document", server.url()), None).unwrap();
    let result = transport.submit(&upload()).await;

    match result {
      Err(ExtractionError::Status { status }) => assert_eq!(status, 500),
      other => panic!("Expected Status error, got: {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_http_transport_invalid_json_is_malformed() {
    let mut server = Server::new_async().await;
    let _mock = server
      .mock("POST", "/api/extract-document")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body("invalid json")
      .create_async()
      .await;

    let transport =
      HttpTransport::new(format!("{}/api/extract-document", server.url()), None).unwrap();
    let result = transport.submit(&upload()).await;

    assert!(matches!(result, Err(ExtractionError::MalformedBody { .. })));
  }

  #[tokio::test]
  async fn test_unreachable_server_yields_failure_not_error() {
    // Port 9 (discard) is not expected to be listening on the loopback interface
    let transport = HttpTransport::new("http://127.0.0.1:9/api/extract-document", None).unwrap();
    let sink = Arc::new(CollectingSink::default());
    let client = ExtractionClient::with_transport(Box::new(transport)).with_diagnostics(sink.clone());

    let result = client.extract(&upload()).await;

    assert!(!result.is_success());
    assert!(!result.error().unwrap_or_default().is_empty());
    assert_eq!(sink.len(), 1);
  }
}
