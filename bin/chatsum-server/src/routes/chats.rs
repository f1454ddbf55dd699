//! Chat message endpoints: store, retrieve, summarize and delete.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{ChatStore, NewChatMessage, SummaryRecord, SummaryStore};
use crate::error::ServerError;
use crate::extract::ValidJson;
use crate::schemas::chat::{BulkStoreResponse, ChatResponse, DeleteResponse, StoreChatRequest, StoreChatResponse};
use crate::schemas::summary::{SummarizeRequest, SummarizeResponse, SummaryResponse};
use crate::state::AppState;
use crate::summarizer;

#[derive(OpenApi)]
#[openapi(
    paths(store_chat, store_chats_bulk, get_conversation, delete_conversation, summarize_chat, list_summaries),
    components(schemas(
        StoreChatRequest,
        StoreChatResponse,
        BulkStoreResponse,
        ChatResponse,
        DeleteResponse,
        SummarizeRequest,
        SummarizeResponse,
        SummaryResponse,
    ))
)]
pub struct ChatsApi;

/// Register chat routes.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chats", post(store_chat))
        .route("/chats/bulk", post(store_chats_bulk).get(reserved_path).delete(reserved_path))
        .route("/chats/summarize", post(summarize_chat).get(reserved_path).delete(reserved_path))
        .route("/chats/{conversation_id}", get(get_conversation).delete(delete_conversation))
        .route("/chats/{conversation_id}/summaries", get(list_summaries))
}

/// `bulk` and `summarize` are action paths, never conversation ids.
async fn reserved_path() -> ServerError {
    ServerError::NotFound("Conversation not found".to_owned())
}

#[utoipa::path(
    post,
    path = "/chats",
    tag = "chats",
    request_body = StoreChatRequest,
    responses(
        (status = 201, description = "Message stored", body = StoreChatResponse),
        (status = 400, description = "Invalid request body"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn store_chat(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<StoreChatRequest>,
) -> Result<(StatusCode, Json<StoreChatResponse>), ServerError> {
    let stored = state
        .store
        .insert_message(req.into())
        .await
        .map_err(ServerError::store("failed to store chat"))?;
    Ok((
        StatusCode::CREATED,
        Json(StoreChatResponse {
            id: stored.id,
            conversation_id: stored.conversation_id,
            message: "Chat stored successfully".to_owned(),
        }),
    ))
}

/// Store several messages in one transaction. Each element is validated
/// before anything is written.
#[utoipa::path(
    post,
    path = "/chats/bulk",
    tag = "chats",
    request_body = Vec<StoreChatRequest>,
    responses(
        (status = 201, description = "Messages stored", body = BulkStoreResponse),
        (status = 400, description = "Invalid request body"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn store_chats_bulk(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<StoreChatRequest>>, JsonRejection>,
) -> Result<(StatusCode, Json<BulkStoreResponse>), ServerError> {
    let Json(reqs) = payload?;
    if reqs.is_empty() {
        return Ok((
            StatusCode::CREATED,
            Json(BulkStoreResponse {
                message: "No chats to insert".to_owned(),
                count: 0,
                ids: Vec::new(),
            }),
        ));
    }
    for req in &reqs {
        req.validate()?;
    }

    let stored = state
        .store
        .insert_messages(reqs.into_iter().map(NewChatMessage::from).collect())
        .await
        .map_err(ServerError::store("failed to store chats"))?;
    let ids: Vec<String> = stored.into_iter().map(|m| m.id).collect();
    info!(count = ids.len(), "bulk chats stored");
    Ok((
        StatusCode::CREATED,
        Json(BulkStoreResponse {
            message: "Chats stored successfully".to_owned(),
            count: ids.len(),
            ids,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/chats/{conversation_id}",
    tag = "chats",
    params(("conversation_id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation messages, oldest first", body = Vec<ChatResponse>),
        (status = 404, description = "Conversation not found"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<ChatResponse>>, ServerError> {
    let messages = state
        .store
        .conversation(&conversation_id)
        .await
        .map_err(ServerError::store("failed to retrieve chat"))?;
    Ok(Json(messages.iter().map(|m| m.to_response()).collect()))
}

#[utoipa::path(
    delete,
    path = "/chats/{conversation_id}",
    tag = "chats",
    params(("conversation_id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Conversation deleted", body = DeleteResponse),
        (status = 404, description = "Conversation not found"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<DeleteResponse>, ServerError> {
    let deleted = state
        .store
        .delete_conversation(&conversation_id)
        .await
        .map_err(ServerError::store("failed to delete chat"))?;
    info!(%conversation_id, deleted, "conversation deleted");
    Ok(Json(DeleteResponse {
        message: format!("Chat deleted successfully. Removed {deleted} messages."),
        deleted,
    }))
}

/// Summarize a stored conversation.
///
/// The request only fails when the conversation is missing or the store is
/// unavailable; summarizer problems degrade to the local heuristic. Every
/// summary is appended to the conversation's summary history.
#[utoipa::path(
    post,
    path = "/chats/summarize",
    tag = "chats",
    request_body = SummarizeRequest,
    responses(
        (status = 200, description = "Summary produced", body = SummarizeResponse),
        (status = 400, description = "Invalid request body"),
        (status = 404, description = "Conversation not found"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn summarize_chat(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ServerError> {
    let messages = state
        .store
        .conversation(&req.conversation_id)
        .await
        .map_err(ServerError::store("failed to load conversation"))?;

    let transcript = summarizer::transcript(&messages);
    let outcome = state.summarizer.summarize(&transcript, req.max_length).await;
    let source = outcome.source();
    let summary = outcome.into_text();

    state
        .store
        .append_summary(SummaryRecord {
            id: Uuid::new_v4().to_string(),
            conversation_id: req.conversation_id.clone(),
            summary: summary.clone(),
            source: source.to_string(),
            created_at: Utc::now(),
        })
        .await
        .map_err(ServerError::store("failed to save summary"))?;

    Ok(Json(SummarizeResponse {
        conversation_id: req.conversation_id,
        summary,
        source,
    }))
}

#[utoipa::path(
    get,
    path = "/chats/{conversation_id}/summaries",
    tag = "chats",
    params(("conversation_id" = String, Path, description = "Conversation id")),
    responses(
        (status = 200, description = "Stored summaries, oldest first", body = Vec<SummaryResponse>),
        (status = 500, description = "Store error"),
    )
)]
pub async fn list_summaries(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<String>,
) -> Result<Json<Vec<SummaryResponse>>, ServerError> {
    let summaries = state
        .store
        .list_summaries(&conversation_id)
        .await
        .map_err(ServerError::store("failed to list summaries"))?;
    Ok(Json(summaries.iter().map(|s| s.to_response()).collect()))
}
