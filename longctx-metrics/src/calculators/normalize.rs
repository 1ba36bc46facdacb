/// Characters dropped anywhere in an answer (markdown emphasis and code ticks).
const FORMATTING_CHARS: [char; 3] = ['*', '_', '`'];

/// Characters trimmed from both ends of an answer.
const EDGE_CHARS: [char; 2] = ['"', '\''];

/// Canonical form used by every text comparator.
///
/// Trims, lowercases, removes formatting characters and strips surrounding
/// quotes. Whitespace enclosed by the quotes is stripped with them, so the
/// result never starts or ends with whitespace or a quote and normalizing
/// twice is a no-op.
pub fn normalize_answer(answer: &str) -> String {
    let lowered: String = answer
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !FORMATTING_CHARS.contains(c))
        .collect();

    lowered
        .trim_matches(|c: char| c.is_whitespace() || EDGE_CHARS.contains(&c))
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_formatting() {
        assert_eq!(normalize_answer("  **Abbreviation**  "), "abbreviation");
        assert_eq!(normalize_answer("`human_being`"), "humanbeing");
        assert_eq!(normalize_answer("\"Location\""), "location");
        assert_eq!(normalize_answer("'\"nested\"'"), "nested");
    }

    #[test]
    fn test_normalize_quotes_around_whitespace() {
        assert_eq!(normalize_answer("\" a \""), "a");
        assert_eq!(normalize_answer("\"\""), "");
    }
}
