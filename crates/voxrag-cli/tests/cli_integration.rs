//! CLI integration tests driving the `voxrag` binary end to end.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::TempDir;

#[allow(deprecated)]
fn voxrag_cmd() -> Command {
    Command::cargo_bin("voxrag").unwrap()
}

fn data_dir() -> (TempDir, String) {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("store").to_string_lossy().into_owned();
    (dir, data)
}

#[test]
fn missing_cmd_fails_with_a_non_zero_exit() {
    let (_dir, data) = data_dir();
    voxrag_cmd()
        .args(["--data", &data, "--dim", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--cmd is required"));
}

#[test]
fn ingest_document_then_retrieve_round_trips_through_stdin_and_stdout() {
    let (_dir, data) = data_dir();

    let ingest_payload = serde_json::json!({
        "document": {
            "id": "doc-a",
            "source": "file:///a.rs",
            "timestamp": 0,
            "metadata": {}
        },
        "chunks": [
            {"doc_id": "doc-a", "content": "fn main() {}", "vector": [1.0, 0.0, 0.0, 0.0], "token_count": 4}
        ]
    });

    voxrag_cmd()
        .args(["--cmd", "ingest-document", "--data", &data, "--dim", "4"])
        .write_stdin(ingest_payload.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"doc-a\""));

    let retrieve_payload = serde_json::json!({
        "query": [1.0, 0.0, 0.0, 0.0],
        "max_tokens": 100
    });

    voxrag_cmd()
        .args(["--cmd", "retrieve", "--data", &data, "--dim", "4"])
        .write_stdin(retrieve_payload.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("fn main"));
}

#[test]
fn ingest_message_accepts_payload_from_an_input_file() {
    let (dir, data) = data_dir();
    let payload_path = dir.path().join("message.json");
    let mut file = std::fs::File::create(&payload_path).unwrap();
    write!(
        file,
        r#"{{"namespace": "proj1", "conversation_id": "c1", "role": "user", "message_id": "msg-1", "content": "hi there", "vector": [0.1, 0.2, 0.3, 0.4], "token_count": 2}}"#
    )
    .unwrap();

    voxrag_cmd()
        .args([
            "--cmd",
            "ingest-message",
            "--data",
            &data,
            "--dim",
            "4",
            "--input",
        ])
        .arg(&payload_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"msg-1\""));
}

#[test]
fn malformed_json_payload_fails_with_stderr_and_non_zero_exit() {
    let (_dir, data) = data_dir();
    voxrag_cmd()
        .args(["--cmd", "retrieve", "--data", &data, "--dim", "4"])
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::is_empty().not());
}

#[test]
fn retrieve_against_an_empty_store_returns_no_chunks() {
    let (_dir, data) = data_dir();
    voxrag_cmd()
        .args(["--cmd", "retrieve", "--data", &data, "--dim", "4"])
        .write_stdin(serde_json::json!({"query": [0.0, 0.0, 0.0, 0.0]}).to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"chunks\":[]"));
}
