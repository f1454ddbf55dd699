use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::entities::StoreError;

/// Naive date-time layouts accepted besides RFC 3339. Read as UTC.
const NAIVE_LAYOUTS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// A single message row in the `chat_messages` table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub sender_id: String,
    pub text: String,
    /// Canonical UTC timestamp (see [`canonical_timestamp`]); sorts chronologically.
    pub timestamp: String,
    pub conversation_id: String,
    pub metadata: Option<Map<String, Value>>,
}

/// A message as submitted, before the store assigns ids and defaults.
#[derive(Debug, Clone, Default)]
pub struct NewChatMessage {
    pub sender_id: String,
    pub text: String,
    pub timestamp: Option<String>,
    pub conversation_id: Option<String>,
    pub metadata: Option<Map<String, Value>>,
}

impl NewChatMessage {
    /// Fill in the store-assigned fields and normalize the timestamp to UTC.
    /// `conversation_id` is used only when the message does not carry one.
    pub fn into_message(
        self,
        id: String,
        conversation_id: impl FnOnce() -> String,
    ) -> Result<ChatMessage, StoreError> {
        let timestamp = match self.timestamp {
            Some(raw) => parse_timestamp(&raw)
                .map(canonical_timestamp)
                .ok_or(StoreError::InvalidTimestamp(raw))?,
            None => canonical_timestamp(Utc::now()),
        };
        Ok(ChatMessage {
            id,
            sender_id: self.sender_id,
            text: self.text,
            timestamp,
            conversation_id: self
                .conversation_id
                .filter(|c| !c.is_empty())
                .unwrap_or_else(conversation_id),
            metadata: self.metadata,
        })
    }
}

/// Optional filters on a user's history.
#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    /// Inclusive lower bound on `timestamp`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `timestamp`.
    pub end: Option<DateTime<Utc>>,
    /// Whitespace-separated terms; a message matches if it contains any.
    pub keyword: Option<String>,
}

impl HistoryFilter {
    pub fn keyword_terms(&self) -> Vec<String> {
        self.keyword
            .as_deref()
            .map(|k| k.split_whitespace().map(str::to_lowercase).collect())
            .unwrap_or_default()
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// A page of history plus the number of messages matching the filter.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub messages: Vec<ChatMessage>,
    pub total: u64,
}

/// Fixed-width UTC form, so string order is time order.
pub fn canonical_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse an ISO-8601 instant. Offsets are honoured, naive date-times are
/// read as UTC and a plain date means midnight UTC of that day.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Some(at.with_timezone(&Utc));
    }
    NAIVE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(value, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
        .map(|naive| naive.and_utc())
}

/// Like [`parse_timestamp`], but a plain date means the last microsecond of
/// that day, so an inclusive upper bound covers the whole day.
pub fn parse_end_bound(value: &str) -> Option<DateTime<Utc>> {
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(day) => day.and_hms_micro_opt(23, 59, 59, 999_999).map(|naive| naive.and_utc()),
        Err(_) => parse_timestamp(value),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(PageRequest { page: 1, limit: 10 }.offset(), 0);
        assert_eq!(PageRequest { page: 3, limit: 25 }.offset(), 50);
    }

    #[test]
    fn keyword_terms_are_lowercased() {
        let filter = HistoryFilter {
            keyword: Some("  Deploy   TONIGHT ".into()),
            ..Default::default()
        };
        assert_eq!(filter.keyword_terms(), vec!["deploy", "tonight"]);
        assert!(HistoryFilter::default().keyword_terms().is_empty());
    }

    #[test]
    fn into_message_keeps_supplied_conversation() {
        let msg = NewChatMessage {
            sender_id: "u".into(),
            text: "hi".into(),
            conversation_id: Some("conv".into()),
            ..Default::default()
        }
        .into_message("id".into(), || panic!("must not generate"))
        .unwrap();
        assert_eq!(msg.conversation_id, "conv");
        assert!(parse_timestamp(&msg.timestamp).is_some());
    }

    #[test]
    fn into_message_generates_missing_conversation() {
        let msg = NewChatMessage {
            sender_id: "u".into(),
            text: "hi".into(),
            conversation_id: Some(String::new()),
            timestamp: Some("2024-01-01T00:00:00Z".into()),
            ..Default::default()
        }
        .into_message("id".into(), || "fresh".into())
        .unwrap();
        assert_eq!(msg.conversation_id, "fresh");
        assert_eq!(msg.timestamp, "2024-01-01T00:00:00.000000Z");
    }

    #[test]
    fn into_message_normalizes_offsets_to_utc() {
        let msg = NewChatMessage {
            timestamp: Some("2024-01-01T10:00:00+05:00".into()),
            ..Default::default()
        }
        .into_message("id".into(), || "c".into())
        .unwrap();
        assert_eq!(msg.timestamp, "2024-01-01T05:00:00.000000Z");
    }

    #[test]
    fn into_message_rejects_unparseable_timestamp() {
        let err = NewChatMessage {
            timestamp: Some("last tuesday".into()),
            ..Default::default()
        }
        .into_message("id".into(), || "c".into())
        .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTimestamp(raw) if raw == "last tuesday"));
    }

    #[test]
    fn parses_iso_forms_to_utc() {
        let expect = |value: &str, canonical: &str| {
            let at = parse_timestamp(value).unwrap_or_else(|| panic!("{value} should parse"));
            assert_eq!(canonical_timestamp(at), canonical, "{value}");
        };
        expect("2024-03-01T12:30:00Z", "2024-03-01T12:30:00.000000Z");
        expect("2024-03-01T12:30:00.123456+02:00", "2024-03-01T10:30:00.123456Z");
        expect("2024-03-01T12:30:00.5", "2024-03-01T12:30:00.500000Z");
        expect("2024-03-01T12:30", "2024-03-01T12:30:00.000000Z");
        expect("2024-03-01", "2024-03-01T00:00:00.000000Z");
        assert!(parse_timestamp("2024-13-01").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn date_only_end_bound_covers_the_whole_day() {
        let end = parse_end_bound("2024-01-01").unwrap();
        assert_eq!(canonical_timestamp(end), "2024-01-01T23:59:59.999999Z");
        assert_eq!(
            parse_end_bound("2024-01-01T08:00:00Z"),
            parse_timestamp("2024-01-01T08:00:00Z")
        );
    }
}
