use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::entities::ChatStore;
use crate::error::ServerError;
use crate::extract::ValidQuery;
use crate::schemas::chat::{ChatPageResponse, HistoryQuery};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(get_user_chats), components(schemas(ChatPageResponse)))]
pub struct UsersApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/users/{user_id}/chats", get(get_user_chats))
}

/// A user's messages, newest first, with optional date range and keyword filter.
#[utoipa::path(
    get,
    path = "/users/{user_id}/chats",
    tag = "users",
    params(
        ("user_id" = String, Path, description = "Sender id"),
        HistoryQuery,
    ),
    responses(
        (status = 200, description = "Page of messages", body = ChatPageResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Store error"),
    )
)]
pub async fn get_user_chats(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    ValidQuery(query): ValidQuery<HistoryQuery>,
) -> Result<Json<ChatPageResponse>, ServerError> {
    let page = state
        .store
        .user_history(&user_id, &query.filter(), query.page_request())
        .await
        .map_err(ServerError::store("failed to retrieve chats"))?;
    Ok(Json(ChatPageResponse {
        chats: page.messages.iter().map(|m| m.to_response()).collect(),
        total: page.total,
        page: query.page,
        limit: query.limit,
    }))
}
