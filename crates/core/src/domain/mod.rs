pub mod activity;
pub mod chat;
pub mod page;
pub mod review;
pub mod search_history;

pub use activity::{Activity, ActivityKind};
pub use chat::ChatMessage;
pub use page::Page;
pub use review::{Rating, Review};
pub use search_history::{SearchHistory, MAX_SEARCH_HISTORY, SEARCH_HISTORY_NAMESPACE};
