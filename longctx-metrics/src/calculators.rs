pub mod normalize;
pub mod numeric;
pub mod label;
pub mod comparison;
pub mod answer;

pub use normalize::*;
pub use numeric::*;
pub use label::*;
pub use comparison::*;
pub use answer::*;

use longctx_core::AnswerType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreInput {
    pub expected: String,
    pub actual: String,
    /// Comparator family; detected from `expected` when absent.
    pub answer_type: Option<AnswerType>,
}

impl ScoreInput {
    pub fn new(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            actual: actual.into(),
            answer_type: None,
        }
    }

    pub fn with_answer_type(mut self, answer_type: AnswerType) -> Self {
        self.answer_type = Some(answer_type);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreOutput {
    pub score: f64,
    /// Comparator family actually applied.
    pub answer_type: AnswerType,
    pub metadata: serde_json::Value,
}
