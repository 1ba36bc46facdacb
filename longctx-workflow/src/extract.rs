//! Heuristics for pulling structured answers out of free-form engine output.
//!
//! Every fallback used when the external capability ignores the requested
//! format lives here, so strategies never parse raw output themselves.

use longctx_core::ChunkFinding;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;

/// Marker the agent is asked to put in front of its final answer.
pub const ANSWER_MARKER: &str = "ANSWER:";

/// Answer text plus the token count reported alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedAnswer {
    pub answer: String,
    pub tokens_used: u64,
}

impl ParsedAnswer {
    pub fn new(answer: impl Into<String>, tokens_used: u64) -> Self {
        Self {
            answer: answer.into(),
            tokens_used,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AnswerEnvelope {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    usage: Usage,
}

/// Token accounting attached to engine and session output.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Usage {
    #[serde(default)]
    pub output_tokens: u64,
}

/// Read the JSON envelope (`result`, `usage.output_tokens`).
///
/// Output that is not a JSON object is taken verbatim (trimmed) with zero tokens.
pub fn parse_answer_output(raw: &str) -> ParsedAnswer {
    match serde_json::from_str::<AnswerEnvelope>(raw) {
        Ok(envelope) => ParsedAnswer::new(
            envelope.result.unwrap_or_default().trim(),
            envelope.usage.output_tokens,
        ),
        Err(err) => {
            tracing::debug!("Engine output is not a JSON envelope ({}), using raw text", err);
            ParsedAnswer::new(raw.trim(), 0)
        }
    }
}

fn json_object_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\{[^}]+\}").ok())
        .as_ref()
}

/// Find the first flat `{...}` object in a chunk reply.
///
/// Anything unparseable is treated as an irrelevant chunk.
pub fn parse_chunk_finding(raw: &str) -> ChunkFinding {
    let Some(pattern) = json_object_pattern() else {
        return ChunkFinding::irrelevant();
    };

    pattern
        .find(raw)
        .and_then(|m| serde_json::from_str::<ChunkFinding>(m.as_str()).ok())
        .unwrap_or_else(|| {
            tracing::debug!("Chunk reply carried no usable JSON object");
            ChunkFinding::irrelevant()
        })
}

/// Text after the first line that starts with `ANSWER:` (any case).
pub fn extract_marked_answer(text: &str) -> Option<String> {
    text.lines().map(str::trim).find_map(|line| {
        let head = line.get(..ANSWER_MARKER.len())?;
        if head.eq_ignore_ascii_case(ANSWER_MARKER) {
            Some(line[ANSWER_MARKER.len()..].trim().to_string())
        } else {
            None
        }
    })
}

// ===== Session Payload =====

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ContentBlock {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
    Other(serde_json::Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Plain text, or the first text block.
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(text.as_str()),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .find(|b| b.kind == "text")
                .and_then(|b| b.text.as_deref()),
            MessageContent::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TranscriptMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: MessageContent,
}

/// What the agent host reports when a session stops.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SessionReport {
    #[serde(default)]
    pub final_summary: Option<String>,
    #[serde(default)]
    pub transcript: Vec<TranscriptMessage>,
    #[serde(default)]
    pub usage: Usage,
}

impl SessionReport {
    /// Lenient parse: blank or malformed input yields an empty report.
    pub fn from_json(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        serde_json::from_str(raw).unwrap_or_else(|err| {
            tracing::warn!("Ignoring malformed session payload: {}", err);
            Self::default()
        })
    }

    pub fn output_tokens(&self) -> u64 {
        self.usage.output_tokens
    }
}

/// An empty `ANSWER:` line counts as no marker.
fn marked_or_whole(text: &str) -> String {
    extract_marked_answer(text)
        .filter(|answer| !answer.is_empty())
        .unwrap_or_else(|| text.trim().to_string())
}

/// The agent's final answer.
///
/// A non-empty `final_summary` wins; otherwise the last assistant message
/// with text is used. Either way an `ANSWER:` line is preferred over the
/// whole text. Returns an empty string when nothing qualifies.
pub fn extract_session_answer(report: &SessionReport) -> String {
    if let Some(summary) = report.final_summary.as_deref().filter(|s| !s.is_empty()) {
        return marked_or_whole(summary);
    }

    report
        .transcript
        .iter()
        .rev()
        .filter(|msg| msg.role == "assistant")
        .find_map(|msg| msg.content.text().filter(|t| !t.is_empty()))
        .map(marked_or_whole)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_needs_line_start() {
        assert_eq!(extract_marked_answer("The ANSWER: no"), None);
        assert_eq!(extract_marked_answer("  answer: 12 "), Some("12".to_string()));
    }

    #[test]
    fn test_marker_with_multibyte_prefix() {
        assert_eq!(extract_marked_answer("ééé"), None);
    }
}
