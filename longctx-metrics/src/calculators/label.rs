use super::normalize::normalize_answer;

/// Exact match after normalization. Dates use the same comparator.
pub fn label_score(expected: &str, actual: &str) -> f64 {
    if normalize_answer(expected) == normalize_answer(actual) {
        1.0
    } else {
        0.0
    }
}
