use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn longctx(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("longctx").unwrap();
    cmd.current_dir(workdir)
        .env_remove("LONGCTX_STATE_DIR")
        .env_remove("RUST_LOG")
        .arg("--no-color")
        .arg("--db")
        .arg(workdir.join("data").join("results.db"));
    cmd
}

fn write_tasks(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("tasks.jsonl");
    let rows = [
        r#"{"id": "a", "dataset": "trec_coarse", "context_window_text": "aaaa", "question": "q?", "answer": "[abbreviation]", "answer_type": "ANSWER_TYPE.LABEL", "task": "TASK_TYPE.MOST_FREQ"}"#,
        r#"{"id": "b", "dataset": "trec_coarse", "context_window_text": "bbbbbbbb", "question": "q?", "answer": "3", "answer_type": "ANSWER_TYPE.NUMERIC", "task": "TASK_TYPE.COUNT"}"#,
        r#"{"id": "c", "dataset": "spam", "context_window_text": "cc", "question": "q?", "answer": "spam", "answer_type": "ANSWER_TYPE.LABEL"}"#,
    ];
    fs::write(&path, rows.join("\n")).unwrap();
    path
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    longctx(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("compare"))
        .stdout(predicate::str::contains("list-runs"))
        .stdout(predicate::str::contains("hook"));
}

#[test]
fn test_unknown_strategy_is_rejected() {
    let dir = TempDir::new().unwrap();
    let tasks = write_tasks(dir.path());
    longctx(dir.path())
        .args(["run", "--strategy", "magic", "--tasks"])
        .arg(&tasks)
        .assert()
        .failure();
}

#[test]
fn test_stats_as_json() {
    let dir = TempDir::new().unwrap();
    let tasks = write_tasks(dir.path());

    let output = longctx(dir.path())
        .args(["--output", "json", "stats", "--dataset", "trec_coarse", "--tasks"])
        .arg(&tasks)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["total_rows"], 3);
    assert_eq!(stats["filtered_count"], 2);
    assert_eq!(stats["context_length"]["min"], 4);
    assert_eq!(stats["context_length"]["max"], 8);
}

#[test]
fn test_stats_on_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    longctx(dir.path())
        .args(["stats", "--tasks"])
        .arg(dir.path().join("absent.jsonl"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load tasks"));
}

#[test]
fn test_run_without_matching_tasks_does_nothing() {
    let dir = TempDir::new().unwrap();
    let tasks = write_tasks(dir.path());

    longctx(dir.path())
        .args(["run", "--strategy", "truncation", "--dataset", "nope"])
        .args(["--min-context", "0", "--tasks"])
        .arg(&tasks)
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks match"));

    assert!(!dir.path().join("data").join("results.db").exists());
}

#[test]
fn test_list_runs_on_fresh_database() {
    let dir = TempDir::new().unwrap();
    longctx(dir.path())
        .args(["--output", "json", "list-runs"])
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn test_show_missing_run_fails() {
    let dir = TempDir::new().unwrap();
    longctx(dir.path())
        .args(["show", "20240101_000000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_export_missing_run_fails() {
    let dir = TempDir::new().unwrap();
    longctx(dir.path())
        .args(["export", "20240101_000000"])
        .arg(dir.path().join("out.json"))
        .assert()
        .failure();
    assert!(!dir.path().join("out.json").exists());
}

#[test]
fn test_session_start_without_pending_task_prints_nothing() {
    let dir = TempDir::new().unwrap();
    longctx(dir.path())
        .env("LONGCTX_STATE_DIR", dir.path().join("state"))
        .args(["hook", "session-start"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_stop_without_task_in_progress_succeeds() {
    let dir = TempDir::new().unwrap();
    longctx(dir.path())
        .env("LONGCTX_STATE_DIR", dir.path().join("state"))
        .args(["hook", "stop"])
        .write_stdin(r#"{"result": "Answer: spam"}"#)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_hooks_survive_invalid_configuration() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.yaml");
    fs::write(&config, "truncation:\n  max_context_chars: 0\n").unwrap();

    longctx(dir.path())
        .env("LONGCTX_STATE_DIR", dir.path().join("state"))
        .arg("--config")
        .arg(&config)
        .args(["hook", "session-start"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    longctx(dir.path())
        .arg("--config")
        .arg(&config)
        .arg("list-runs")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}
