/// Per-unit decay of numeric partial credit.
pub const NUMERIC_DECAY_BASE: f64 = 0.75;

/// Parse a numeric answer, ignoring thousands separators.
///
/// Non-finite values (`nan`, `inf`) are not accepted as numbers.
pub fn parse_numeric(answer: &str) -> Option<f64> {
    let cleaned = answer.replace(',', "");
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Partial credit `0.75^|expected - actual|`.
pub fn numeric_score(expected: f64, actual: f64) -> f64 {
    NUMERIC_DECAY_BASE.powf((expected - actual).abs())
}
