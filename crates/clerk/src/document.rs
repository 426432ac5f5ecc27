//! Extraction payloads, stored records, and the result envelope.
//!
//! The extraction service returns an opaque JSON object. We keep it as a
//! `serde_json::Map` and only add the two fields we own: `extractionDate`
//! when extraction completes and `id` when the document is saved.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the local extraction timestamp
pub const EXTRACTION_DATE_FIELD: &str = "extractionDate";

/// Field holding the locally generated record id
pub const ID_FIELD: &str = "id";

/// The service payload plus the local extraction timestamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedDocument {
  #[serde(flatten)]
  pub(crate) fields: Map<String, Value>,
  #[serde(rename = "extractionDate", default, skip_serializing_if = "Option::is_none")]
  pub(crate) extraction_date: Option<String>,
}

impl ExtractedDocument {
  /// Spread a service payload and stamp it; a payload `extractionDate` is overwritten
  pub fn from_payload(mut payload: Map<String, Value>, extraction_date: impl Into<String>) -> Self {
    payload.remove(EXTRACTION_DATE_FIELD);
    Self { fields: payload, extraction_date: Some(extraction_date.into()) }
  }

  /// Service fields, without `extractionDate`
  pub fn fields(&self) -> &Map<String, Value> {
    &self.fields
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    if key == EXTRACTION_DATE_FIELD {
      return None;
    }
    self.fields.get(key)
  }

  pub fn extraction_date(&self) -> Option<&str> {
    self.extraction_date.as_deref()
  }

  /// The document as one flat JSON object
  pub fn to_value(&self) -> Value {
    let mut object = self.fields.clone();
    if let Some(date) = &self.extraction_date {
      object.insert(EXTRACTION_DATE_FIELD.to_string(), Value::String(date.clone()));
    }
    Value::Object(object)
  }
}

/// An extracted document as persisted in the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocumentRecord {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: i64,
  #[serde(flatten)]
  pub document: ExtractedDocument,
}

impl StoredDocumentRecord {
  /// A payload `id` is overwritten by the record id
  pub fn new(id: i64, mut document: ExtractedDocument) -> Self {
    document.fields.remove(ID_FIELD);
    Self { id, document }
  }
}

/// Ids are integers, but an integral float such as `1.7e12` is accepted
fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
  D: serde::Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum RawId {
    Integer(i64),
    Float(f64),
  }

  match RawId::deserialize(deserializer)? {
    RawId::Integer(id) => Ok(id),
    RawId::Float(id) if id.fract() == 0.0 && id.abs() < i64::MAX as f64 => Ok(id as i64),
    RawId::Float(id) => Err(serde::de::Error::custom(format!("record id {id} is not an integer"))),
  }
}

/// Uniform outcome of an extraction attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Envelope", try_from = "Envelope")]
pub enum ExtractionResult {
  Success { data: ExtractedDocument },
  Failure { error: String },
}

impl ExtractionResult {
  pub fn success(data: ExtractedDocument) -> Self {
    Self::Success { data }
  }

  pub fn failure(error: impl Into<String>) -> Self {
    Self::Failure { error: error.into() }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, Self::Success { .. })
  }

  pub fn data(&self) -> Option<&ExtractedDocument> {
    match self {
      Self::Success { data } => Some(data),
      Self::Failure { .. } => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      Self::Success { .. } => None,
      Self::Failure { error } => Some(error),
    }
  }

  pub fn into_data(self) -> Option<ExtractedDocument> {
    match self {
      Self::Success { data } => Some(data),
      Self::Failure { .. } => None,
    }
  }
}

/// Wire form: `{"success": true, "data": ...}` or `{"success": false, "error": ...}`
#[derive(Serialize, Deserialize)]
struct Envelope {
  success: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  data: Option<ExtractedDocument>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  error: Option<String>,
}

impl From<ExtractionResult> for Envelope {
  fn from(result: ExtractionResult) -> Self {
    match result {
      ExtractionResult::Success { data } => Self { success: true, data: Some(data), error: None },
      ExtractionResult::Failure { error } => Self { success: false, data: None, error: Some(error) },
    }
  }
}

impl TryFrom<Envelope> for ExtractionResult {
  type Error = String;

  fn try_from(envelope: Envelope) -> Result<Self, Self::Error> {
    match (envelope.success, envelope.data, envelope.error) {
      (true, Some(data), _) => Ok(Self::Success { data }),
      (true, None, _) => Err("successful result is missing `data`".to_string()),
      (false, _, error) => Ok(Self::Failure { error: error.unwrap_or_default() }),
    }
  }
}

/// A file handed to the extraction service
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
  pub file_name: String,
  pub content_type: String,
  pub bytes: Vec<u8>,
}

impl Upload {
  /// Content type is inferred from the file name's extension
  pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
    let file_name = file_name.into();
    let content_type = content_type_for(&file_name).to_string();
    Self { file_name, content_type, bytes }
  }

  pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
    self.content_type = content_type.into();
    self
  }

  pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;
    let file_name = path
      .file_name()
      .map(|name| name.to_string_lossy().to_string())
      .unwrap_or_else(|| "upload".to_string());
    Ok(Self::new(file_name, bytes))
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }
}

fn content_type_for(file_name: &str) -> &'static str {
  let extension = Path::new(file_name)
    .extension()
    .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    .unwrap_or_default();

  match extension.as_str() {
    "pdf" => "application/pdf",
    "png" => "image/png",
    "jpg" | "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "tif" | "tiff" => "image/tiff",
    "heic" => "image/heic",
    "txt" => "text/plain",
    "json" => "application/json",
    _ => "application/octet-stream",
  }
}
