use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::feed::FeedItem;
use crate::types::ResourceKey;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub sender_image: Option<String>,
}

impl FeedItem for ChatMessage {
    fn item_id(&self) -> &str {
        &self.id
    }

    fn resource_keys(&self) -> Vec<ResourceKey> {
        self.sender_image
            .as_deref()
            .and_then(|name| ResourceKey::profile_image(name).ok())
            .into_iter()
            .collect()
    }
}
