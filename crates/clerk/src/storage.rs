//! Key-value storage backing the record store.
//!
//! String keys, string values, whole-value replacement. This is the surface
//! browser local storage offers, so anything that can provide it can sit
//! under [`crate::records::LocalRecordStore`].

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StoreError;

pub trait KeyValueStore: Send + Sync {
  /// `Ok(None)` when nothing is stored under `key`
  fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

  /// Replace whatever is stored under `key`
  fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

  fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// In-process store, optionally capped at a total byte quota
#[derive(Debug, Default)]
pub struct MemoryStore {
  values: Mutex<HashMap<String, String>>,
  quota: Option<usize>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Writes that would push the total of key and value bytes past `quota` fail
  pub fn with_quota(quota: usize) -> Self {
    Self { values: Mutex::new(HashMap::new()), quota: Some(quota) }
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StoreError> {
    self.values.lock().map_err(|_| StoreError::unavailable("memory store lock poisoned"))
  }
}

impl KeyValueStore for MemoryStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    Ok(self.lock()?.get(key).cloned())
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    let mut values = self.lock()?;

    if let Some(limit) = self.quota {
      let others: usize =
        values.iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| k.len() + v.len()).sum();
      let needed = others + key.len() + value.len();
      if needed > limit {
        return Err(StoreError::quota_exceeded(key, needed, limit));
      }
    }

    values.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    self.lock()?.remove(key);
    Ok(())
  }
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
  dir: PathBuf,
}

impl FileStore {
  /// The directory is created lazily on first write
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn path_for(&self, key: &str) -> PathBuf {
    let safe: String = key
      .chars()
      .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
      .collect();
    self.dir.join(format!("{safe}.json"))
  }
}

impl KeyValueStore for FileStore {
  fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(self.path_for(key)) {
      Ok(value) => Ok(Some(value)),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
      Err(e) => Err(StoreError::read_failed(key, e.to_string())),
    }
  }

  fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
    fs::create_dir_all(&self.dir).map_err(|e| StoreError::write_failed(key, e.to_string()))?;

    // Write beside the target then rename, so readers never see a half-written file
    let path = self.path_for(key);
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, value).map_err(|e| StoreError::write_failed(key, e.to_string()))?;
    if let Err(e) = fs::rename(&staging, &path) {
      let _ = fs::remove_file(&staging);
      return Err(StoreError::write_failed(key, e.to_string()));
    }

    tracing::debug!(path = %path.display(), bytes = value.len(), "wrote store value");
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), StoreError> {
    match fs::remove_file(self.path_for(key)) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(StoreError::write_failed(key, e.to_string())),
    }
  }
}
