//! Conversation store gateway.
//!
//! [`ChatStore`] and [`SummaryStore`] define the persistence interface used by
//! the handlers. The default implementation is [`SqliteStore`]. To swap to
//! another database, implement both traits for the new type and change the
//! concrete type in [`crate::state::AppState`].
//!
//! All trait methods use `impl Future` in their signatures so no extra
//! `async-trait` crate is required.

pub mod chat;
pub mod dao;
pub mod summary;

pub use dao::{
    ChatMessage, HistoryFilter, HistoryPage, NewChatMessage, PageRequest, SummaryRecord,
    canonical_timestamp, parse_end_bound, parse_timestamp,
};

pub use chat::ChatStore;
pub use summary::SummaryStore;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;

/// Errors surfaced by the store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// A message timestamp that is not ISO-8601.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// No message carries the given conversation id.
    #[error("conversation {0} not found")]
    ConversationNotFound(String),
}

/// SQLite-backed conversation store.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` should be a sqlx-compatible SQLite URL, e.g. `"sqlite://chatsum.db"`
    /// or `"sqlite::memory:"` for tests. In-memory databases are private to a
    /// connection, so tests pass `max_connections = 1`.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::connect("sqlite::memory:", 1)
            .await
            .expect("in-memory store")
    }
}
