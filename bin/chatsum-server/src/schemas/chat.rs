//! Chat message request / response types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::iso8601;
use crate::entities::{
    ChatMessage, HistoryFilter, NewChatMessage, PageRequest, parse_end_bound, parse_timestamp,
};

/// Request body for `POST /chats` (and each element of `POST /chats/bulk`).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct StoreChatRequest {
    /// ID of the user sending the message.
    #[serde(alias = "sender_id")]
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub user_id: String,
    /// Content of the chat message.
    #[serde(alias = "text")]
    pub message: String,
    /// ISO-8601 timestamp; defaults to the time of storage.
    #[serde(default)]
    #[validate(custom(function = "iso8601"))]
    pub timestamp: Option<String>,
    /// Groups messages into a conversation; generated when absent.
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Free-form additional data.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

impl From<StoreChatRequest> for NewChatMessage {
    fn from(req: StoreChatRequest) -> Self {
        NewChatMessage {
            sender_id: req.user_id,
            text: req.message,
            timestamp: req.timestamp,
            conversation_id: req.conversation_id,
            metadata: req.metadata,
        }
    }
}

/// Response body for `POST /chats`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoreChatResponse {
    pub id: String,
    pub conversation_id: String,
    pub message: String,
}

/// Response body for `POST /chats/bulk`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkStoreResponse {
    pub message: String,
    pub count: usize,
    pub ids: Vec<String>,
}

/// A stored chat message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatResponse {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub timestamp: String,
    pub conversation_id: String,
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Map<String, Value>>,
}

impl ChatMessage {
    pub fn to_response(&self) -> ChatResponse {
        ChatResponse {
            id: self.id.clone(),
            user_id: self.sender_id.clone(),
            message: self.text.clone(),
            timestamp: self.timestamp.clone(),
            conversation_id: self.conversation_id.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Query string for `GET /users/{user_id}/chats`.
#[derive(Debug, Clone, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Page number, starting at 1.
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,
    /// Items per page, 1–100.
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u32,
    /// Only messages at or after this ISO-8601 timestamp.
    #[validate(custom(function = "iso8601"))]
    pub start_date: Option<String>,
    /// Only messages at or before this ISO-8601 timestamp. A plain date
    /// includes that whole day.
    #[validate(custom(function = "iso8601"))]
    pub end_date: Option<String>,
    /// Only messages containing any of these words.
    pub keyword: Option<String>,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

impl HistoryQuery {
    pub fn filter(&self) -> HistoryFilter {
        HistoryFilter {
            start: self.start_date.as_deref().and_then(parse_timestamp),
            end: self.end_date.as_deref().and_then(parse_end_bound),
            keyword: self.keyword.clone().filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Response body for `GET /users/{user_id}/chats`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatPageResponse {
    pub chats: Vec<ChatResponse>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

/// Response body for `DELETE /chats/{conversation_id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted: u64,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn store_request_accepts_canonical_and_alias_names() {
        let a: StoreChatRequest =
            serde_json::from_value(json!({ "user_id": "u", "message": "hi" })).unwrap();
        let b: StoreChatRequest =
            serde_json::from_value(json!({ "sender_id": "u", "text": "hi" })).unwrap();
        assert_eq!(a.user_id, b.user_id);
        assert_eq!(a.message, b.message);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn store_request_rejects_empty_user_and_bad_timestamp() {
        let empty_user: StoreChatRequest =
            serde_json::from_value(json!({ "user_id": "", "message": "hi" })).unwrap();
        assert!(empty_user.validate().is_err());

        let bad_time: StoreChatRequest = serde_json::from_value(
            json!({ "user_id": "u", "message": "hi", "timestamp": "last tuesday" }),
        )
        .unwrap();
        assert!(bad_time.validate().is_err());
    }

    #[test]
    fn history_query_defaults_and_bounds() {
        let q: HistoryQuery = serde_json::from_value(json!({})).unwrap();
        assert_eq!((q.page, q.limit), (1, 10));
        assert!(q.validate().is_ok());

        let too_many: HistoryQuery = serde_json::from_value(json!({ "limit": 101 })).unwrap();
        assert!(too_many.validate().is_err());

        let page_zero: HistoryQuery = serde_json::from_value(json!({ "page": 0 })).unwrap();
        assert!(page_zero.validate().is_err());
    }

    #[test]
    fn date_params_become_utc_bounds() {
        let q: HistoryQuery = serde_json::from_value(json!({
            "start_date": "2024-01-01T02:00:00+02:00",
            "end_date": "2024-01-01",
        }))
        .unwrap();
        let filter = q.filter();
        assert_eq!(filter.start, parse_timestamp("2024-01-01T00:00:00Z"));
        assert_eq!(filter.end, parse_timestamp("2024-01-01T23:59:59.999999Z"));
    }

    #[test]
    fn blank_keyword_is_no_filter() {
        let q: HistoryQuery = serde_json::from_value(json!({ "keyword": "   " })).unwrap();
        assert!(q.filter().keyword.is_none());
    }
}
