//! Local heuristic summarizer used when the external model is unavailable.
//!
//! Strategy: count messages and distinct `User {id}` speakers, pick the five
//! most frequent words longer than four characters, and quote the start of the
//! first and last message. The word budget is accepted but not enforced.
//!
//! Ties in word frequency keep first-seen order.

use std::collections::{HashMap, HashSet};

/// Words of this many characters or fewer are never topics.
const MIN_TOPIC_CHARS: usize = 4;

/// Number of topics reported.
const MAX_TOPICS: usize = 5;

/// Characters quoted from the first and last message.
const SNIPPET_CHARS: usize = 30;

/// Structural facts extracted from a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub line_count: usize,
    pub participant_count: usize,
    pub key_topics: Vec<String>,
    /// Opening snippets of the first and last line, when there is a line.
    pub bookends: Option<(String, String)>,
}

impl Digest {
    /// Analyze a newline-delimited transcript.
    pub fn of(conversation_text: &str) -> Self {
        let lines: Vec<&str> = conversation_text
            .trim()
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .collect();

        let participants: HashSet<&str> = lines
            .iter()
            .filter_map(|line| {
                let head = line.split(':').next()?;
                head.strip_prefix("User ").map(str::trim)
            })
            .collect();

        let bookends = match (lines.first(), lines.last()) {
            (Some(first), Some(last)) => Some((snippet(first), snippet(last))),
            _ => None,
        };

        Self {
            line_count: lines.len(),
            participant_count: participants.len(),
            key_topics: key_topics(conversation_text),
            bookends,
        }
    }

    /// Render the digest as prose.
    pub fn render(&self) -> String {
        let mut summary = format!(
            "This conversation consists of {} messages between {} participants. ",
            self.line_count, self.participant_count
        );

        if !self.key_topics.is_empty() {
            summary.push_str(&format!(
                "Key topics appear to include: {}. ",
                self.key_topics.join(", ")
            ));
        }

        if let Some((first, last)) = &self.bookends {
            summary.push_str(&format!("The conversation starts with '{first}...' "));
            summary.push_str(&format!("and ends with '{last}...'"));
        }

        summary
    }
}

/// Summarize a transcript without any external calls. Never fails.
pub fn summarize(conversation_text: &str, _target_words: u32) -> String {
    Digest::of(conversation_text).render()
}

/// Most frequent long words, highest count first, first-seen order on ties.
fn key_topics(conversation_text: &str) -> Vec<String> {
    let lowered = conversation_text.to_lowercase();
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for word in lowered.split_whitespace() {
        if word.chars().count() <= MIN_TOPIC_CHARS {
            continue;
        }
        match slots.get(word) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                slots.insert(word, counts.len());
                counts.push((word, 1));
            }
        }
    }

    // `sort_by` is stable, so equal counts stay in first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(MAX_TOPICS)
        .map(|(word, _)| word.to_owned())
        .collect()
}

/// Text after the first colon (trimmed), or the whole line, cut to
/// [`SNIPPET_CHARS`] characters.
fn snippet(line: &str) -> String {
    let body = match line.split_once(':') {
        Some((_, rest)) => rest.trim(),
        None => line,
    };
    body.chars().take(SNIPPET_CHARS).collect()
}
