use serde::{Deserialize, Serialize};

use super::label::label_score;
use super::normalize::normalize_answer;

/// Substrings that mark an expected answer as a comparison.
pub const COMPARISON_MARKERS: [&str; 6] = ["more", "less", "same", "common", "greater", "fewer"];

const MORE_VARIANTS: [&str; 5] = ["more", "more common", "greater", "higher", "larger"];
const LESS_VARIANTS: [&str; 5] = ["less", "less common", "smaller", "lower", "fewer"];
const SAME_VARIANTS: [&str; 4] = ["same", "equal", "same frequency", "tied"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonCategory {
    More,
    Less,
    Same,
}

impl ComparisonCategory {
    /// Classify normalized text. Categories are tried in order, so text
    /// mentioning both "more" and "less" counts as `More`.
    pub fn classify(normalized: &str) -> Option<Self> {
        let mentions = |variants: &[&str]| variants.iter().any(|v| normalized.contains(v));

        if mentions(&MORE_VARIANTS) {
            Some(ComparisonCategory::More)
        } else if mentions(&LESS_VARIANTS) {
            Some(ComparisonCategory::Less)
        } else if mentions(&SAME_VARIANTS) {
            Some(ComparisonCategory::Same)
        } else {
            None
        }
    }
}

/// 1.0 when both answers land in the same More/Less/Same category.
///
/// Falls back to exact match when either side has no category.
pub fn comparison_score(expected: &str, actual: &str) -> f64 {
    let expected_cat = ComparisonCategory::classify(&normalize_answer(expected));
    let actual_cat = ComparisonCategory::classify(&normalize_answer(actual));

    match (expected_cat, actual_cat) {
        (Some(e), Some(a)) if e == a => 1.0,
        (Some(_), Some(_)) => 0.0,
        _ => label_score(expected, actual),
    }
}
