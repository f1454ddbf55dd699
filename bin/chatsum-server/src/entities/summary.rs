use std::future::Future;

use chrono::Utc;

use crate::entities::{SqliteStore, StoreError, SummaryRecord};

pub trait SummaryStore: Send + Sync + 'static {
    /// Append a summary; earlier summaries of the same conversation are kept.
    fn append_summary(
        &self,
        record: SummaryRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Summaries of a conversation, oldest first.
    fn list_summaries(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Vec<SummaryRecord>, StoreError>> + Send;
}

impl SummaryStore for SqliteStore {
    async fn append_summary(&self, record: SummaryRecord) -> Result<(), StoreError> {
        let created_at = record.created_at.to_rfc3339();
        sqlx::query(
            "INSERT INTO conversation_summaries (id, conversation_id, summary, source, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&record.id)
        .bind(&record.conversation_id)
        .bind(&record.summary)
        .bind(&record.source)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_summaries(&self, conversation_id: &str) -> Result<Vec<SummaryRecord>, StoreError> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            "SELECT id, conversation_id, summary, source, created_at \
             FROM conversation_summaries WHERE conversation_id = ?1 \
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, conversation_id, summary, source, created_at)| SummaryRecord {
                id,
                conversation_id,
                summary,
                source,
                created_at: created_at.parse().unwrap_or_else(|e: chrono::ParseError| {
                    tracing::warn!(raw = %created_at, error = %e, "failed to parse summary created_at; using now");
                    Utc::now()
                }),
            })
            .collect())
    }
}
