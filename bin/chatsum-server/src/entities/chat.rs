use std::future::Future;

use serde_json::{Map, Value};
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::entities::{
    ChatMessage, HistoryFilter, HistoryPage, NewChatMessage, PageRequest, SqliteStore, StoreError,
    canonical_timestamp,
};

/// Upper bound on messages returned for one conversation.
pub const CONVERSATION_LIMIT: i64 = 100;

type MessageRow = (String, String, String, String, String, Option<String>);

const MESSAGE_COLUMNS: &str = "id, user_id, message, timestamp, conversation_id, metadata";

pub trait ChatStore: Send + Sync + 'static {
    /// Fresh opaque conversation id for messages that arrive without one.
    fn next_conversation_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }

    fn insert_message(
        &self,
        msg: NewChatMessage,
    ) -> impl Future<Output = Result<ChatMessage, StoreError>> + Send;

    /// Insert all messages atomically, preserving order.
    fn insert_messages(
        &self,
        msgs: Vec<NewChatMessage>,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, StoreError>> + Send;

    /// Messages of a conversation, oldest first, at most [`CONVERSATION_LIMIT`].
    fn conversation(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, StoreError>> + Send;

    /// A sender's messages, newest first.
    fn user_history(
        &self,
        user_id: &str,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<HistoryPage, StoreError>> + Send;

    /// Delete a conversation's messages and summaries; returns messages removed.
    fn delete_conversation(
        &self,
        conversation_id: &str,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

impl ChatStore for SqliteStore {
    async fn insert_message(&self, msg: NewChatMessage) -> Result<ChatMessage, StoreError> {
        let msg = msg.into_message(Uuid::new_v4().to_string(), || self.next_conversation_id())?;
        let metadata = encode_metadata(msg.metadata.as_ref())?;
        sqlx::query(
            "INSERT INTO chat_messages (id, user_id, message, timestamp, conversation_id, metadata) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&msg.id)
        .bind(&msg.sender_id)
        .bind(&msg.text)
        .bind(&msg.timestamp)
        .bind(&msg.conversation_id)
        .bind(&metadata)
        .execute(&self.pool)
        .await?;
        Ok(msg)
    }

    async fn insert_messages(&self, msgs: Vec<NewChatMessage>) -> Result<Vec<ChatMessage>, StoreError> {
        let msgs: Vec<ChatMessage> = msgs
            .into_iter()
            .map(|m| m.into_message(Uuid::new_v4().to_string(), || self.next_conversation_id()))
            .collect::<Result<_, StoreError>>()?;
        if msgs.is_empty() {
            return Ok(msgs);
        }

        let mut tx = self.pool.begin().await?;
        for msg in &msgs {
            let metadata = encode_metadata(msg.metadata.as_ref())?;
            sqlx::query(
                "INSERT INTO chat_messages (id, user_id, message, timestamp, conversation_id, metadata) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .bind(&msg.id)
            .bind(&msg.sender_id)
            .bind(&msg.text)
            .bind(&msg.timestamp)
            .bind(&msg.conversation_id)
            .bind(&metadata)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(msgs)
    }

    async fn conversation(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let rows: Vec<MessageRow> = sqlx::query_as(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE conversation_id = ?1 \
             ORDER BY timestamp ASC, rowid ASC LIMIT ?2"
        ))
        .bind(conversation_id)
        .bind(CONVERSATION_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(StoreError::ConversationNotFound(conversation_id.to_owned()));
        }
        Ok(rows.into_iter().map(from_row).collect())
    }

    async fn user_history(
        &self,
        user_id: &str,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> Result<HistoryPage, StoreError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM chat_messages");
        push_history_filter(&mut count, user_id, filter);
        let (total,): (i64,) = count.build_query_as().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {MESSAGE_COLUMNS} FROM chat_messages"));
        push_history_filter(&mut select, user_id, filter);
        select
            .push(" ORDER BY timestamp DESC, rowid DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows: Vec<MessageRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(HistoryPage {
            messages: rows.into_iter().map(from_row).collect(),
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<u64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM chat_messages WHERE conversation_id = ?1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(StoreError::ConversationNotFound(conversation_id.to_owned()));
        }

        sqlx::query("DELETE FROM conversation_summaries WHERE conversation_id = ?1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn push_history_filter(qb: &mut QueryBuilder<'_, Sqlite>, user_id: &str, filter: &HistoryFilter) {
    qb.push(" WHERE user_id = ").push_bind(user_id.to_owned());

    if let Some(start) = filter.start {
        qb.push(" AND timestamp >= ").push_bind(canonical_timestamp(start));
    }
    if let Some(end) = filter.end {
        qb.push(" AND timestamp <= ").push_bind(canonical_timestamp(end));
    }

    let terms = filter.keyword_terms();
    if !terms.is_empty() {
        qb.push(" AND (");
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push("lower(message) LIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }
}

/// `%term%` with LIKE wildcards in `term` escaped.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn encode_metadata(metadata: Option<&Map<String, Value>>) -> Result<Option<String>, StoreError> {
    Ok(metadata.map(serde_json::to_string).transpose()?)
}

fn from_row(
    (id, sender_id, text, timestamp, conversation_id, metadata): MessageRow,
) -> ChatMessage {
    let metadata = metadata.and_then(|raw| {
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(message_id = %id, error = %e, "failed to parse message metadata; dropping it"))
            .ok()
    });
    ChatMessage {
        id,
        sender_id,
        text,
        timestamp,
        conversation_id,
        metadata,
    }
}
