use async_trait::async_trait;
use longctx_core::{AnswerType, MetricCalculator, Result};
use serde_json::json;

use super::comparison::{comparison_score, COMPARISON_MARKERS};
use super::label::label_score;
use super::normalize::normalize_answer;
use super::numeric::{numeric_score, parse_numeric};
use super::{ScoreInput, ScoreOutput};

/// Guess the comparator family from a gold answer.
pub fn detect_answer_type(expected: &str) -> AnswerType {
    let normalized = normalize_answer(expected);
    if COMPARISON_MARKERS.iter().any(|m| normalized.contains(m)) {
        AnswerType::Comparison
    } else if parse_numeric(expected).is_some() {
        AnswerType::Numeric
    } else {
        AnswerType::Label
    }
}

fn numeric_or_label_score(expected: &str, actual: &str) -> f64 {
    match (parse_numeric(expected), parse_numeric(actual)) {
        (Some(e), Some(a)) => numeric_score(e, a),
        _ => label_score(expected, actual),
    }
}

/// Comparator family applied for a given expected answer and optional type.
pub fn resolve_answer_type(expected: &str, answer_type: Option<AnswerType>) -> AnswerType {
    answer_type.unwrap_or_else(|| detect_answer_type(expected))
}

/// Score `actual` against `expected` in [0, 1].
///
/// A blank answer scores 0 without consulting any comparator. A supplied
/// `answer_type` always takes precedence over detection.
pub fn score_answer(expected: &str, actual: &str, answer_type: Option<AnswerType>) -> f64 {
    if actual.trim().is_empty() {
        return 0.0;
    }

    match resolve_answer_type(expected, answer_type) {
        AnswerType::Numeric => numeric_or_label_score(expected, actual),
        AnswerType::Comparison => comparison_score(expected, actual),
        AnswerType::Label | AnswerType::Date => label_score(expected, actual),
    }
}

/// Typed answer scorer exposed through the metric calculator seam.
#[derive(Debug, Clone, Default)]
pub struct AnswerScorer;

impl AnswerScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, input: &ScoreInput) -> ScoreOutput {
        let answer_type = resolve_answer_type(&input.expected, input.answer_type);
        let score = score_answer(&input.expected, &input.actual, Some(answer_type));

        ScoreOutput {
            score,
            answer_type,
            metadata: json!({
                "metric": "answer_score",
                "answer_type": answer_type,
                "detected": input.answer_type.is_none(),
                "blank_answer": input.actual.trim().is_empty(),
            }),
        }
    }
}

#[async_trait]
impl MetricCalculator for AnswerScorer {
    type Input = ScoreInput;
    type Output = ScoreOutput;

    async fn calculate(&self, input: Self::Input) -> Result<Self::Output> {
        Ok(self.score(&input))
    }
}
