use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn clerk(server_url: &str, storage: &TempDir) -> Command {
  let mut cmd = Command::cargo_bin("clerk").unwrap();
  cmd.env("CLERK_SERVER_URL", server_url).env("CLERK_STORAGE_DIR", storage.path());
  cmd
}

#[test]
fn test_help_lists_subcommands() {
  let mut cmd = Command::cargo_bin("clerk").unwrap();
  cmd
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("extract"))
    .stdout(predicate::str::contains("list"))
    .stdout(predicate::str::contains("clear"));
}

#[test]
fn test_list_on_fresh_storage() {
  let storage = TempDir::new().unwrap();
  clerk("http://127.0.0.1:9", &storage)
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("No extracted documents found."));
}

#[test]
fn test_list_json_on_corrupt_storage_is_empty_array() {
  let storage = TempDir::new().unwrap();
  fs::write(storage.path().join("extractedDocuments.json"), "{corrupt").unwrap();

  clerk("http://127.0.0.1:9", &storage)
    .args(["list", "--json"])
    .assert()
    .success()
    .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn test_extract_then_list_then_clear() {
  let mut server = Server::new();
  let mock = server
    .mock("POST", "/api/extract-document")
    .match_body(Matcher::Regex(r#"name="file"; filename="invoice.pdf""#.to_string()))
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(r#"{"type":"invoice","claimNumber":"CLM-1042"}"#)
    .expect(2)
    .create();

  let storage = TempDir::new().unwrap();
  let work = TempDir::new().unwrap();
  let file = work.path().join("invoice.pdf");
  fs::write(&file, b"%PDF-1.4").unwrap();

  clerk(&server.url(), &storage)
    .arg("extract")
    .arg(&file)
    .assert()
    .success()
    .stdout(predicate::str::contains("Extracted"))
    .stdout(predicate::str::contains("CLM-1042"))
    .stderr(predicate::str::contains("Saved as record"));

  clerk(&server.url(), &storage)
    .args(["extract", "--json"])
    .arg(&file)
    .assert()
    .success()
    .stdout(predicate::str::contains(r#""success": true"#))
    .stdout(predicate::str::contains("extractionDate"));

  mock.assert();

  let output = clerk(&server.url(), &storage).args(["list", "--json"]).output().unwrap();
  assert!(output.status.success());
  let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let records = records.as_array().unwrap();
  assert_eq!(records.len(), 2);
  for record in records {
    assert_eq!(record["type"], "invoice");
    assert!(record["id"].is_i64());
    assert!(record["extractionDate"].is_string());
  }

  clerk(&server.url(), &storage)
    .arg("clear")
    .assert()
    .success()
    .stderr(predicate::str::contains("Cleared extracted documents"));
  clerk(&server.url(), &storage)
    .arg("list")
    .assert()
    .success()
    .stdout(predicate::str::contains("No extracted documents found."));
}

#[test]
fn test_failed_extraction_exits_non_zero() {
  let mut server = Server::new();
  let _mock = server.mock("POST", "/api/extract-document").with_status(500).create();

  let storage = TempDir::new().unwrap();
  let work = TempDir::new().unwrap();
  let file = work.path().join("photo.jpg");
  fs::write(&file, [0u8; 8]).unwrap();

  clerk(&server.url(), &storage)
    .args(["extract", "--json"])
    .arg(&file)
    .assert()
    .failure()
    .stdout(predicate::str::contains(r#""success": false"#))
    .stdout(predicate::str::contains("Request failed with status code 500"));

  assert!(!storage.path().join("extractedDocuments.json").exists());
}
