use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use longctx_core::{
    AnswerRequest, AnsweringEngine, ChunkFinding, ChunkSpec, Chunker, ResponseFormat, Result, RunId,
    StrategyConfig, StrategyKind, Task, TaskResult,
};
use std::sync::Arc;
use std::time::Duration;

use super::{scored_execution, AnsweringStrategy};
use crate::extract::{parse_answer_output, parse_chunk_finding, ParsedAnswer};

/// Answer returned when no chunk produced a relevant finding.
pub const UNABLE_TO_DETERMINE: &str = "Unable to determine from context";

pub fn build_chunk_prompt(chunk: &str, question: &str) -> String {
    format!(
        "Analyze this chunk and extract any information relevant to the question.\n\n\
         <chunk>\n{chunk}\n</chunk>\n\n\
         Question: {question}\n\n\
         Respond with JSON: {{\"relevant\": true/false, \"findings\": \"brief summary of relevant info or null\"}}"
    )
}

pub fn build_synthesis_prompt(findings: &[&str], question: &str) -> String {
    let bullets = findings
        .iter()
        .map(|f| format!("- {}", f))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Based on these findings from analyzing a large document, answer the question.\n\n\
         Findings:\n{bullets}\n\n\
         Question: {question}\n\n\
         Provide only the answer, nothing else. Be concise."
    )
}

/// Chunk the context, ask a small model about each chunk, then synthesize.
pub struct MapReduceStrategy {
    engine: Arc<dyn AnsweringEngine>,
    chunker: Arc<dyn Chunker>,
    model: String,
    subcall_model: String,
    spec: ChunkSpec,
    max_concurrent_chunks: usize,
    chunk_timeout: Duration,
    synthesis_timeout: Duration,
}

impl MapReduceStrategy {
    pub fn from_config(
        engine: Arc<dyn AnsweringEngine>,
        chunker: Arc<dyn Chunker>,
        config: &StrategyConfig,
    ) -> Self {
        Self {
            engine,
            chunker,
            model: config.engine.model.clone(),
            subcall_model: config.engine.subcall_model.clone(),
            spec: ChunkSpec {
                mode: config.map_reduce.chunker_mode.clone(),
                target_size: config.map_reduce.chunk_size,
            },
            max_concurrent_chunks: config.map_reduce.max_concurrent_chunks.max(1),
            chunk_timeout: config.map_reduce.chunk_timeout(),
            synthesis_timeout: config.map_reduce.synthesis_timeout(),
        }
    }

    pub fn with_max_concurrent_chunks(mut self, max_concurrent_chunks: usize) -> Self {
        self.max_concurrent_chunks = max_concurrent_chunks.max(1);
        self
    }

    async fn analyze_chunk(
        &self,
        index: usize,
        chunk: &str,
        question: &str,
    ) -> Result<ChunkFinding> {
        let request = AnswerRequest::new(&self.subcall_model, build_chunk_prompt(chunk, question))
            .with_format(ResponseFormat::Text)
            .with_timeout(self.chunk_timeout);

        let raw = self.engine.answer(&request).await?;
        let finding = parse_chunk_finding(&raw);
        tracing::debug!("Chunk {} relevant={}", index, finding.relevant);
        Ok(finding)
    }

    /// Map phase. Findings come back in chunk order whatever the pool width.
    async fn map_chunks(&self, chunks: &[String], question: &str) -> Result<Vec<ChunkFinding>> {
        // Built up front: a borrowing closure in the stream would not be `Send`.
        let analyses: Vec<_> = chunks
            .iter()
            .enumerate()
            .map(|(index, chunk)| self.analyze_chunk(index, chunk, question))
            .collect();

        stream::iter(analyses)
            .buffered(self.max_concurrent_chunks)
            .try_collect()
            .await
    }

    async fn synthesize(&self, findings: &[ChunkFinding], question: &str) -> Result<ParsedAnswer> {
        let relevant: Vec<&str> =
            findings.iter().filter_map(ChunkFinding::usable_findings).collect();

        if relevant.is_empty() {
            tracing::info!("No relevant findings across {} chunks", findings.len());
            return Ok(ParsedAnswer::new(UNABLE_TO_DETERMINE, 0));
        }

        let request = AnswerRequest::new(&self.model, build_synthesis_prompt(&relevant, question))
            .with_format(ResponseFormat::Json)
            .with_timeout(self.synthesis_timeout);

        let raw = self.engine.answer(&request).await?;
        Ok(parse_answer_output(&raw))
    }

    async fn answer(&self, task: &Task) -> Result<ParsedAnswer> {
        let chunks = self.chunker.split(task.context(), &self.spec).await?;
        tracing::debug!("Task {} split into {} chunks", task.id(), chunks.len());

        let findings = self.map_chunks(&chunks, task.question()).await?;
        self.synthesize(&findings, task.question()).await
    }
}

#[async_trait]
impl AnsweringStrategy for MapReduceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MapReduce
    }

    async fn execute(&self, task: &Task, run_id: &RunId) -> TaskResult {
        scored_execution(self.kind(), task, run_id, self.answer(task)).await
    }
}
