//! End-to-end tests for the esferry binary
//!
//! These tests drive the compiled CLI against a mock cluster and validate:
//! - Dry-run transfers (verification without a broker)
//! - Checkpoint-based resume behavior
//! - Date argument handling
//! - The dump and indices commands
//! - Error reporting and exit codes

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Base command with credential variables cleared so ambient shell state
/// cannot leak into auth handling
fn esferry() -> Command {
    let mut cmd = Command::cargo_bin("esferry").unwrap();
    cmd.env_remove("ESFERRY_ES_USERNAME")
        .env_remove("ESFERRY_ES_PASSWORD");
    cmd
}

fn shards_ok() -> serde_json::Value {
    json!({"total": 5, "successful": 5, "skipped": 0, "failed": 0})
}

fn count_response(count: u64) -> serde_json::Value {
    json!({"count": count, "_shards": shards_ok()})
}

fn job_doc(i: u64) -> serde_json::Value {
    json!({
        "GlobalJobId": format!("crab3@vocms05#{i}#1"),
        "QDate": 1_614_556_800u64 + i,
        "Site": "T2_CH_CERN"
    })
}

fn scroll_page(scroll_id: &str, docs: Vec<serde_json::Value>) -> serde_json::Value {
    let hits: Vec<serde_json::Value> = docs.into_iter().map(|d| json!({"_source": d})).collect();
    json!({
        "_scroll_id": scroll_id,
        "_shards": shards_ok(),
        "hits": {"hits": hits}
    })
}

/// Mount the full count/scroll/clear conversation for one five-document day
async fn mount_five_doc_day(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/jobs-*/_count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(count_response(5)))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/jobs-*/_search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(scroll_page(
            "cursor-1",
            vec![job_doc(0), job_doc(1), job_doc(2)],
        )))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .and(body_json(json!({"scroll": "5m", "scroll_id": "cursor-1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(scroll_page("cursor-2", vec![job_doc(3), job_doc(4)])),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/_search/scroll"))
        .and(body_json(json!({"scroll": "5m", "scroll_id": "cursor-2"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(scroll_page("cursor-3", vec![])),
        )
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/_search/scroll"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"succeeded": true})))
        .mount(server)
        .await;
}

// ============================================================================
// Transfer Tests
// ============================================================================

#[tokio::test]
async fn test_dry_run_transfer_verifies_without_checkpointing() {
    let mock_server = MockServer::start().await;
    mount_five_doc_day(&mock_server).await;

    let workdir = tempdir().unwrap();
    let checkpoint = workdir.path().join("checkpoint.dat");

    let mut cmd = esferry();
    cmd.arg("transfer")
        .arg("2021-03-01")
        .arg("--dry-run")
        .arg("--es-url")
        .arg(mock_server.uri())
        .arg("--checkpoint-file")
        .arg(&checkpoint);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Dry run"))
        .stdout(predicate::str::contains("2021-03-01"))
        .stdout(predicate::str::contains("5 docs"))
        .stdout(predicate::str::contains("Dry run verified 5 document(s)"));

    assert!(!checkpoint.exists());
}

#[tokio::test]
async fn test_checkpointed_day_is_skipped_without_cluster_requests() {
    let mock_server = MockServer::start().await;

    // Any hit on the count endpoint means the checkpoint was ignored
    Mock::given(method("POST"))
        .and(path("/jobs-*/_count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(count_response(5)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let workdir = tempdir().unwrap();
    let checkpoint = workdir.path().join("checkpoint.dat");
    std::fs::write(&checkpoint, "2021-03-01\n").unwrap();

    let mut cmd = esferry();
    cmd.arg("transfer")
        .arg("2021-03-01")
        .arg("--dry-run")
        .arg("--es-url")
        .arg(mock_server.uri())
        .arg("--checkpoint-file")
        .arg(&checkpoint);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("already transferred"));
}

#[tokio::test]
async fn test_invalid_dates_are_skipped_with_a_warning() {
    let mock_server = MockServer::start().await;

    let workdir = tempdir().unwrap();
    let checkpoint = workdir.path().join("checkpoint.dat");
    std::fs::write(&checkpoint, "2021-03-01\n").unwrap();

    let mut cmd = esferry();
    cmd.arg("transfer")
        .arg("03/01/2021")
        .arg("2021-03-01")
        .arg("--dry-run")
        .arg("--es-url")
        .arg(mock_server.uri())
        .arg("--checkpoint-file")
        .arg(&checkpoint);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Skipping '03/01/2021'"))
        .stdout(predicate::str::contains("already transferred"));
}

#[tokio::test]
async fn test_all_dates_invalid_is_a_usage_error() {
    let mut cmd = esferry();
    cmd.arg("transfer").arg("yesterday").arg("--dry-run");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no valid dates given"));
}

#[test]
fn test_transfer_requires_dates() {
    let mut cmd = esferry();
    cmd.arg("transfer");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

// ============================================================================
// Dump Tests
// ============================================================================

#[tokio::test]
async fn test_dump_stages_a_day_to_disk() {
    let mock_server = MockServer::start().await;
    mount_five_doc_day(&mock_server).await;

    let workdir = tempdir().unwrap();
    let stage_dir = workdir.path().join("stage");

    let mut cmd = esferry();
    cmd.arg("dump")
        .arg("2021-03-01")
        .arg("--target")
        .arg(&stage_dir)
        .arg("--es-url")
        .arg(mock_server.uri());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Staged 5 document(s)"));

    let staged = std::fs::read_to_string(stage_dir.join("2021-03-01.json")).unwrap();
    let lines: Vec<&str> = staged.lines().filter(|l| !l.trim().is_empty()).collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].contains("\"_source\""));
    assert!(lines[0].contains("crab3@vocms05#0#1"));
}

// ============================================================================
// Indices Tests
// ============================================================================

#[tokio::test]
async fn test_indices_writes_the_catalog_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/_cat/indices/jobs-*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"index": "jobs-2021-01", "docs.count": "120", "store.size": "4096"},
            {"index": "jobs-2021-02", "docs.count": "80", "store.size": "2048"}
        ])))
        .mount(&mock_server)
        .await;

    let workdir = tempdir().unwrap();
    let catalog_file = workdir.path().join("indices.json");

    let mut cmd = esferry();
    cmd.arg("indices")
        .arg("--output")
        .arg(&catalog_file)
        .arg("--es-url")
        .arg(mock_server.uri());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("jobs-2021-01"))
        .stdout(predicate::str::contains("Cataloged 2 index(es)"))
        .stdout(predicate::str::contains("200 document(s)"));

    let raw = std::fs::read_to_string(&catalog_file).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["jobs-2021-01"]["docs_count"], 120);
    assert_eq!(parsed["jobs-2021-02"]["store_bytes"], 2048);
}

// ============================================================================
// Error Reporting Tests
// ============================================================================

#[tokio::test]
async fn test_missing_catalog_is_reported() {
    let workdir = tempdir().unwrap();
    let absent = workdir.path().join("absent.json");

    let mut cmd = esferry();
    cmd.arg("transfer-index")
        .arg("--dry-run")
        .arg("--catalog")
        .arg(&absent);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no index catalog"));
}
