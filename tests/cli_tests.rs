/// End-to-end tests for the refdb binary.
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn refdb(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("refdb").unwrap();
    cmd.env_remove("REFDB_ENV")
        .arg("--db-path")
        .arg(dir.path().join("db.json"));
    cmd
}

#[test]
fn test_insert_get_and_dump() {
    let dir = TempDir::new().unwrap();

    refdb(&dir)
        .args([
            "insert",
            "events",
            r#"{"title": "launch", "at": {"value": 1700000000000, "type": "date"}}"#,
            "--id",
            "e1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));

    refdb(&dir)
        .args(["get", "events", "e1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2023-11-14T22:13:20.000Z"))
        .stdout(predicate::str::contains("launch"));

    refdb(&dir)
        .arg("dump")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\": \"date\""));
}

#[test]
fn test_unknown_id_fails() {
    let dir = TempDir::new().unwrap();

    refdb(&dir)
        .args(["get", "events", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown id(missing)"));
}

#[test]
fn test_exists_and_delete() {
    let dir = TempDir::new().unwrap();

    refdb(&dir)
        .args(["insert", "users", r#"{"name": "Alice"}"#, "--id", "alice"])
        .assert()
        .success();

    refdb(&dir)
        .args(["exists", "users", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("true"));

    refdb(&dir)
        .args(["delete", "users", "alice"])
        .assert()
        .success();

    refdb(&dir)
        .args(["exists", "users", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));
}

#[test]
fn test_invalid_json_is_reported() {
    let dir = TempDir::new().unwrap();

    refdb(&dir)
        .args(["insert", "users", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON value"));
}
