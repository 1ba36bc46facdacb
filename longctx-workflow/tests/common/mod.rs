#![allow(dead_code)]

use async_trait::async_trait;
use longctx_core::{
    AnswerRequest, AnsweringEngine, AnswerType, BenchmarkRun, ChunkSpec, Chunker, CoreError, Result,
    ResultStore, RunId, RunStats, RunSummary, Task, TaskResult,
};
use longctx_metrics::{run_stats, summarize_run};
use std::sync::Mutex;
use std::time::Duration;

pub fn task(id: &str, context: &str, expected: &str, answer_type: AnswerType) -> Task {
    Task::new(id, "trec_coarse", context, "How many?", expected, answer_type)
}

type Responder = Box<dyn Fn(&AnswerRequest) -> Result<String> + Send + Sync>;

/// Engine that answers through a closure and records every request.
pub struct ScriptedEngine {
    responder: Responder,
    delay: Option<Box<dyn Fn(&AnswerRequest) -> Duration + Send + Sync>>,
    requests: Mutex<Vec<AnswerRequest>>,
}

impl ScriptedEngine {
    pub fn new(
        responder: impl Fn(&AnswerRequest) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(answer: &str) -> Self {
        let answer = answer.to_string();
        Self::new(move |_| Ok(answer.clone()))
    }

    pub fn with_delay(
        mut self,
        delay: impl Fn(&AnswerRequest) -> Duration + Send + Sync + 'static,
    ) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn requests(&self) -> Vec<AnswerRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnsweringEngine for ScriptedEngine {
    async fn answer(&self, request: &AnswerRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(request)).await;
        }
        (self.responder)(request)
    }
}

/// Returns a fixed list of chunks.
pub struct FixedChunker {
    chunks: Vec<String>,
    fail: bool,
}

impl FixedChunker {
    pub fn new(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            chunks: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl Chunker for FixedChunker {
    async fn split(&self, _context: &str, _spec: &ChunkSpec) -> Result<Vec<String>> {
        if self.fail {
            return Err(CoreError::ExternalCall("chunker exploded".to_string()));
        }
        Ok(self.chunks.clone())
    }
}

/// In-memory result store.
#[derive(Default)]
pub struct MemoryStore {
    pub runs: Mutex<Vec<BenchmarkRun>>,
    pub results: Mutex<Vec<TaskResult>>,
    pub fail_results: bool,
}

impl MemoryStore {
    pub fn failing_results() -> Self {
        Self {
            fail_results: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ResultStore for MemoryStore {
    async fn save_run(&self, run: &BenchmarkRun) -> Result<()> {
        let mut runs = self.runs.lock().unwrap();
        runs.retain(|r| r.id != run.id);
        runs.push(run.clone());
        Ok(())
    }

    async fn save_result(&self, result: &TaskResult) -> Result<()> {
        if self.fail_results {
            return Err(CoreError::Database("disk full".to_string()));
        }
        self.results.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn get_run(&self, run_id: &RunId) -> Result<Option<BenchmarkRun>> {
        Ok(self.runs.lock().unwrap().iter().find(|r| &r.id == run_id).cloned())
    }

    async fn get_results(&self, run_id: &RunId) -> Result<Vec<TaskResult>> {
        Ok(self
            .results
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.run_id() == run_id)
            .cloned()
            .collect())
    }

    async fn list_runs(&self, limit: usize) -> Result<Vec<BenchmarkRun>> {
        Ok(self.runs.lock().unwrap().iter().take(limit).cloned().collect())
    }

    async fn update_run_stats(&self, run_id: &RunId) -> Result<RunStats> {
        let results = self.get_results(run_id).await?;
        let stats = run_stats(&results);
        if let Some(run) = self.runs.lock().unwrap().iter_mut().find(|r| &r.id == run_id) {
            run.apply_stats(&stats);
        }
        Ok(stats)
    }

    async fn get_run_summary(&self, run_id: &RunId) -> Result<Option<RunSummary>> {
        let Some(run) = self.get_run(run_id).await? else {
            return Ok(None);
        };
        let results = self.get_results(run_id).await?;
        Ok(Some(summarize_run(&run, &results)))
    }
}
