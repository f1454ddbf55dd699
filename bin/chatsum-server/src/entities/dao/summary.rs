use chrono::{DateTime, Utc};

/// A row in the `conversation_summaries` table.
#[derive(Debug, Clone)]
pub struct SummaryRecord {
    pub id: String,
    pub conversation_id: String,
    pub summary: String,
    /// `"generated"`, `"fallback"`, or `"not_configured"`.
    pub source: String,
    pub created_at: DateTime<Utc>,
}
