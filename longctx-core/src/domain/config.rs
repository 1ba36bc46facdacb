use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_SUBCALL_MODEL: &str = "claude-haiku-3-5-20241022";
pub const DEFAULT_ENGINE_BINARY: &str = "claude";
pub const DEFAULT_CHUNKER_BINARY: &str = "rlm-rs";
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 180_000;
pub const DEFAULT_CHUNKER_MODE: &str = "semantic";
pub const DEFAULT_CHUNK_SIZE: usize = 150_000;
pub const DEFAULT_TRIGGER_PROMPT: &str = "Begin benchmark task.";

// ===== Engine Configuration =====

/// External answering engine and chunker binaries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct EngineConfig {
    #[validate(length(min = 1))]
    pub binary: String,
    #[validate(length(min = 1))]
    pub model: String,
    #[validate(length(min = 1))]
    pub subcall_model: String,
    #[validate(length(min = 1))]
    pub chunker_binary: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_ENGINE_BINARY.to_string(),
            model: DEFAULT_MODEL.to_string(),
            subcall_model: DEFAULT_SUBCALL_MODEL.to_string(),
            chunker_binary: DEFAULT_CHUNKER_BINARY.to_string(),
        }
    }
}

// ===== Strategy Configuration =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct TruncationConfig {
    #[validate(range(min = 1))]
    pub max_context_chars: usize,
    #[validate(range(min = 1))]
    pub timeout_secs: u64,
}

impl Default for TruncationConfig {
    fn default() -> Self {
        Self {
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
            timeout_secs: 300,
        }
    }
}

impl TruncationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct MapReduceConfig {
    #[validate(length(min = 1))]
    pub chunker_mode: String,
    #[validate(range(min = 1))]
    pub chunk_size: usize,
    /// Chunks analyzed at once. 1 keeps the map phase strictly sequential.
    #[validate(range(min = 1, max = 64))]
    pub max_concurrent_chunks: usize,
    #[validate(range(min = 1))]
    pub chunk_timeout_secs: u64,
    #[validate(range(min = 1))]
    pub synthesis_timeout_secs: u64,
}

impl Default for MapReduceConfig {
    fn default() -> Self {
        Self {
            chunker_mode: DEFAULT_CHUNKER_MODE.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_concurrent_chunks: 1,
            chunk_timeout_secs: 60,
            synthesis_timeout_secs: 120,
        }
    }
}

impl MapReduceConfig {
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }
}

/// Everything the strategy factory needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, Validate)]
#[serde(default)]
pub struct StrategyConfig {
    #[validate(nested)]
    pub engine: EngineConfig,
    #[validate(nested)]
    pub truncation: TruncationConfig,
    #[validate(nested)]
    pub map_reduce: MapReduceConfig,
}

// ===== Lifecycle Configuration =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct LifecycleConfig {
    pub state_dir: PathBuf,
    #[validate(range(min = 10))]
    pub poll_interval_ms: u64,
    #[validate(range(min = 1))]
    pub completion_timeout_secs: u64,
    #[validate(range(min = 1))]
    pub session_timeout_secs: u64,
    #[validate(length(min = 1))]
    pub trigger_prompt: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("/tmp/longctx"),
            poll_interval_ms: 500,
            completion_timeout_secs: 60,
            session_timeout_secs: 600,
            trigger_prompt: DEFAULT_TRIGGER_PROMPT.to_string(),
        }
    }
}

impl LifecycleConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session_timeout_secs)
    }
}

// ===== Top-level Configuration =====

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
#[serde(default)]
pub struct BenchConfig {
    pub db_path: PathBuf,
    #[validate(nested)]
    pub engine: EngineConfig,
    #[validate(nested)]
    pub truncation: TruncationConfig,
    #[validate(nested)]
    pub map_reduce: MapReduceConfig,
    #[validate(nested)]
    pub lifecycle: LifecycleConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/benchmark.db"),
            engine: EngineConfig::default(),
            truncation: TruncationConfig::default(),
            map_reduce: MapReduceConfig::default(),
            lifecycle: LifecycleConfig::default(),
        }
    }
}

impl BenchConfig {
    pub fn strategy_config(&self) -> StrategyConfig {
        StrategyConfig {
            engine: self.engine.clone(),
            truncation: self.truncation.clone(),
            map_reduce: self.map_reduce.clone(),
        }
    }
}
