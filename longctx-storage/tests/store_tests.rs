use chrono::{Duration, Utc};
use longctx_core::{
    BenchmarkRun, CoreError, ExecutionMode, ResultStore, RunId, RunStats, StrategyKind, TaskResult,
};
use longctx_storage::sqlite;
use longctx_storage::*;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

async fn open_store(dir: &TempDir) -> SqliteResultStore {
    SqliteResultStore::open(dir.path().join("nested").join("bench.db"))
        .await
        .unwrap()
}

fn run(id: &str) -> BenchmarkRun {
    BenchmarkRun::new(StrategyKind::MapReduce, ExecutionMode::InProcess).with_id(RunId::from(id))
}

fn scored(run_id: &str, task_id: &str, score: f64, latency: f64) -> TaskResult {
    TaskResult::scored(task_id, RunId::from(run_id), StrategyKind::MapReduce, "A", "A", score)
        .with_latency_ms(latency)
        .with_tokens_used(10)
}

fn failed(run_id: &str, task_id: &str, latency: f64) -> TaskResult {
    TaskResult::failed(task_id, RunId::from(run_id), StrategyKind::MapReduce, "A", "boom")
        .with_latency_ms(latency)
}

#[tokio::test]
async fn test_open_creates_parent_dir_and_schema() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("a").join("b").join("bench.db");

    let pool = sqlite::create_pool(&path).await.unwrap();
    sqlite::migrate(&pool).await.unwrap();
    // Migrating twice is harmless.
    sqlite::migrate(&pool).await.unwrap();
    sqlite::health_check(&pool).await.unwrap();

    assert!(path.exists());
}

#[tokio::test]
async fn test_run_roundtrip_and_replace() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    let mut original = run("run00001").with_metadata("dataset", serde_json::json!("trec_coarse"));
    store.save_run(&original).await.unwrap();

    let loaded = store.get_run(&original.id).await.unwrap().unwrap();
    assert_eq!(loaded.id, original.id);
    assert_eq!(loaded.strategy, StrategyKind::MapReduce);
    assert_eq!(loaded.mode, ExecutionMode::InProcess);
    assert_eq!(loaded.metadata["dataset"], "trec_coarse");

    original.tasks_total = 7;
    original.set_metadata("abandoned", serde_json::json!(2));
    store.save_run(&original).await.unwrap();

    let replaced = store.get_run(&original.id).await.unwrap().unwrap();
    assert_eq!(replaced.tasks_total, 7);
    assert_eq!(replaced.metadata["abandoned"], 2);
    assert_eq!(store.list_runs(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_missing_run_is_none() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;

    assert!(store.get_run(&RunId::from("nope")).await.unwrap().is_none());
    assert!(store.get_run_summary(&RunId::from("nope")).await.unwrap().is_none());
    assert!(store.get_results(&RunId::from("nope")).await.unwrap().is_empty());
    assert!(matches!(
        store.update_run_stats(&RunId::from("nope")).await,
        Err(CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_results_keep_insertion_order() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    store.save_run(&run("r1")).await.unwrap();
    store.save_run(&run("r2")).await.unwrap();

    for task_id in ["t3", "t1", "t2"] {
        store.save_result(&scored("r1", task_id, 1.0, 5.0)).await.unwrap();
    }
    store.save_result(&scored("r2", "other", 1.0, 5.0)).await.unwrap();

    let results = store.get_results(&RunId::from("r1")).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.task_id()).collect();
    assert_eq!(ids, vec!["t3", "t1", "t2"]);
    assert_eq!(results[0], scored("r1", "t3", 1.0, 5.0));
}

#[tokio::test]
async fn test_failed_result_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    store.save_run(&run("r1")).await.unwrap();
    store.save_result(&failed("r1", "t1", 12.5)).await.unwrap();

    let results = store.get_results(&RunId::from("r1")).await.unwrap();
    assert_eq!(results, vec![failed("r1", "t1", 12.5)]);
    assert_eq!(results[0].error(), Some("boom"));
    assert_eq!(results[0].score(), 0.0);
}

#[tokio::test]
async fn test_update_stats_and_summary() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let r = run("r1");
    store.save_run(&r).await.unwrap();
    store.save_result(&scored("r1", "t1", 1.0, 100.0)).await.unwrap();
    store.save_result(&scored("r1", "t2", 0.5, 300.0)).await.unwrap();
    store.save_result(&failed("r1", "t3", 200.0)).await.unwrap();

    let stats = store.update_run_stats(&r.id).await.unwrap();
    assert_eq!(
        stats,
        RunStats {
            tasks_total: 3,
            tasks_completed: 2,
            tasks_failed: 1,
            avg_score: 0.75,
            total_latency_ms: 600.0,
        }
    );

    let saved = store.get_run(&r.id).await.unwrap().unwrap();
    assert_eq!(saved.tasks_completed, 2);
    assert_eq!(saved.avg_score, 0.75);

    let summary = store.get_run_summary(&r.id).await.unwrap().unwrap();
    assert_eq!(summary.tasks_completed, 2);
    assert_eq!(summary.tasks_failed, 1);
    assert_eq!(summary.min_score, 0.5);
    assert_eq!(summary.max_score, 1.0);
    assert_eq!(summary.avg_latency_ms, 200.0);
}

#[tokio::test]
async fn test_empty_run_summary_is_zero() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let r = run("r1");
    store.save_run(&r).await.unwrap();

    let stats = store.update_run_stats(&r.id).await.unwrap();
    assert_eq!(stats, RunStats::default());

    let summary = store.get_run_summary(&r.id).await.unwrap().unwrap();
    assert_eq!(summary.avg_score, 0.0);
    assert_eq!(summary.avg_latency_ms, 0.0);
}

#[tokio::test]
async fn test_list_runs_newest_first_with_limit() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir).await;
    let now = Utc::now();

    for (id, minutes_ago) in [("old", 30), ("new", 1), ("mid", 10)] {
        let mut r = run(id);
        r.timestamp = now - Duration::minutes(minutes_ago);
        store.save_run(&r).await.unwrap();
    }

    let runs = store.list_runs(2).await.unwrap();
    let ids: Vec<&str> = runs.iter().map(|r| r.id.as_ref()).collect();
    assert_eq!(ids, vec!["new", "mid"]);
}

// ===== Export =====

#[rstest]
#[case("json", ExportFormat::Json)]
#[case("JSONL", ExportFormat::Jsonl)]
#[case("yml", ExportFormat::Yaml)]
#[case("CSV", ExportFormat::Csv)]
fn test_export_format_parse(#[case] raw: &str, #[case] expected: ExportFormat) {
    assert_eq!(raw.parse::<ExportFormat>().unwrap(), expected);
}

#[test]
fn test_unknown_export_format() {
    assert!(matches!("xml".parse::<ExportFormat>(), Err(CoreError::Validation(_))));
}

#[tokio::test]
async fn test_export_csv_roundtrip() {
    let dir = TempDir::new().unwrap();
    let results = vec![scored("r1", "t1", 0.75, 1.0), failed("r1", "t2", 2.0)];

    let path = dir.path().join("results.csv");
    let written = export_results(&results, &path, ExportFormat::Csv).await.unwrap();
    assert_eq!(written, 2);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("task_id,run_id,strategy,"));
    assert_eq!(content.lines().count(), 3);

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let parsed: Vec<TaskResult> = reader.deserialize().map(|row| row.unwrap()).collect();
    assert_eq!(parsed, results);
}

#[tokio::test]
async fn test_export_jsonl_and_json() {
    let dir = TempDir::new().unwrap();
    let results = vec![scored("r1", "t1", 1.0, 1.0), failed("r1", "t2", 2.0)];

    let jsonl_path = dir.path().join("out").join("results.jsonl");
    let written = export_results(&results, &jsonl_path, ExportFormat::Jsonl).await.unwrap();
    assert_eq!(written, 2);

    let content = std::fs::read_to_string(&jsonl_path).unwrap();
    let parsed: Vec<TaskResult> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed, results);

    let json_path = dir.path().join("results.json");
    export_results(&results, &json_path, ExportFormat::Json).await.unwrap();
    let parsed: Vec<TaskResult> =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(parsed, results);
}

#[test]
fn test_render_yaml_lists_every_result() {
    let results = vec![scored("r1", "t1", 1.0, 1.0), scored("r1", "t2", 0.0, 1.0)];
    let yaml = render_results(&results, ExportFormat::Yaml).unwrap();
    assert!(yaml.contains("task_id: t1"));
    assert!(yaml.contains("task_id: t2"));
}
