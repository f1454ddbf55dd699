//! Conversation summarization.
//!
//! [`GeminiSummarizer`] implements the [`Summarizer`] trait by asking the
//! Gemini API for a summary, degrading to the local heuristic in
//! `fallback::summarize` on any failure.
//!
//! Summarization is best-effort: every implementation resolves to a
//! [`SummaryOutcome`] that always carries displayable text.

mod fallback;
mod gemini;

pub use gemini::{GeminiSummarizer, NOT_CONFIGURED_MESSAGE};

use async_trait::async_trait;
use serde::Serialize;
use strum::{AsRefStr, Display};
use thiserror::Error;
use utoipa::ToSchema;

use crate::entities::ChatMessage;

/// Word budget used when the caller does not supply one.
pub const DEFAULT_TARGET_WORDS: u32 = 100;

/// Failures inside the Gemini adapter. These never leave the adapter; they
/// are logged and turned into a fallback summary.
#[derive(Debug, Error)]
pub enum SummarizerError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse API response: {0}")]
    Parse(String),

    #[error("timed out waiting for the API")]
    Timeout,

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for SummarizerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SummarizerError::Timeout
        } else if e.is_decode() {
            SummarizerError::Parse(e.to_string())
        } else {
            SummarizerError::Api(e.to_string())
        }
    }
}

/// Where a summary's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SummarySource {
    /// Produced by the external model.
    Generated,
    /// Produced by the local heuristic after the external call failed.
    Fallback,
    /// No credential configured; the text is a configuration notice.
    NotConfigured,
}

/// Result of a summarization attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated(String),
    Fallback { text: String, reason: String },
    NotConfigured(String),
}

impl SummaryOutcome {
    pub fn source(&self) -> SummarySource {
        match self {
            SummaryOutcome::Generated(_) => SummarySource::Generated,
            SummaryOutcome::Fallback { .. } => SummarySource::Fallback,
            SummaryOutcome::NotConfigured(_) => SummarySource::NotConfigured,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            SummaryOutcome::Generated(text)
            | SummaryOutcome::Fallback { text, .. }
            | SummaryOutcome::NotConfigured(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            SummaryOutcome::Generated(text)
            | SummaryOutcome::Fallback { text, .. }
            | SummaryOutcome::NotConfigured(text) => text,
        }
    }
}

/// Pluggable conversation summarizer.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a newline-delimited transcript in roughly `target_words` words.
    async fn summarize(&self, transcript: &str, target_words: u32) -> SummaryOutcome;
}

/// Flatten messages into the `User {id}: {message}` transcript, one line per
/// message, each line newline-terminated.
pub fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("User {}: {}\n", m.sender_id, m.text))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Utc;

    fn message(sender: &str, text: &str) -> ChatMessage {
        ChatMessage {
            id: "m".into(),
            sender_id: sender.into(),
            text: text.into(),
            timestamp: Utc::now().to_rfc3339(),
            conversation_id: "c".into(),
            metadata: None,
        }
    }

    #[test]
    fn transcript_has_one_line_per_message() {
        let text = transcript(&[message("a", "hi there"), message("b", "hello")]);
        assert_eq!(text, "User a: hi there\nUser b: hello\n");
    }

    #[test]
    fn outcome_text_and_source() {
        let outcome = SummaryOutcome::Fallback {
            text: "summary".into(),
            reason: "timeout".into(),
        };
        assert_eq!(outcome.text(), "summary");
        assert_eq!(outcome.source(), SummarySource::Fallback);
        assert_eq!(outcome.source().as_ref(), "fallback");
        assert_eq!(SummarySource::NotConfigured.to_string(), "not_configured");
        assert_eq!(outcome.into_text(), "summary");
    }

    #[test]
    fn source_serializes_snake_case() {
        let json = serde_json::to_string(&SummarySource::NotConfigured).unwrap();
        assert_eq!(json, "\"not_configured\"");
    }
}
