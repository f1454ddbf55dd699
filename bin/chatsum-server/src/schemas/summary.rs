//! Summarization request / response types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::SummaryRecord;
use crate::summarizer::{DEFAULT_TARGET_WORDS, SummarySource};

/// Request body for `POST /chats/summarize`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct SummarizeRequest {
    /// Conversation to summarize.
    #[validate(length(min = 1, message = "conversation_id must not be empty"))]
    pub conversation_id: String,
    /// Target summary length in words.
    #[serde(default = "default_max_length")]
    #[validate(range(min = 1, message = "max_length must be at least 1"))]
    pub max_length: u32,
}

fn default_max_length() -> u32 {
    DEFAULT_TARGET_WORDS
}

/// Response body for `POST /chats/summarize`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SummarizeResponse {
    pub conversation_id: String,
    pub summary: String,
    /// Whether the text came from the model, the local fallback, or is a
    /// configuration notice.
    pub source: SummarySource,
}

/// A previously generated summary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SummaryResponse {
    pub id: String,
    pub conversation_id: String,
    pub summary: String,
    pub source: String,
    pub created_at: String,
}

impl SummaryRecord {
    pub fn to_response(&self) -> SummaryResponse {
        SummaryResponse {
            id: self.id.clone(),
            conversation_id: self.conversation_id.clone(),
            summary: self.summary.clone(),
            source: self.source.clone(),
            created_at: self.created_at.to_rfc3339(),
        }
    }
}
