pub mod chat;
pub mod summary;

pub use chat::{
    ChatMessage, HistoryFilter, HistoryPage, NewChatMessage, PageRequest, canonical_timestamp,
    parse_end_bound, parse_timestamp,
};
pub use summary::SummaryRecord;
