use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::feed::FeedItem;
use crate::types::ResourceKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Like,
    Follow,
    Review,
    Comment,
}

impl ActivityKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "like" => Some(Self::Like),
            "follow" => Some(Self::Follow),
            "review" => Some(Self::Review),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub id: String,
    pub kind: ActivityKind,
    pub actor_id: String,
    pub actor_name: String,
    pub review_id: Option<String>,
    pub album_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub actor_image: Option<String>,
}

impl FeedItem for Activity {
    fn item_id(&self) -> &str {
        &self.id
    }

    fn resource_keys(&self) -> Vec<ResourceKey> {
        let image = self
            .actor_image
            .as_deref()
            .and_then(|name| ResourceKey::profile_image(name).ok());
        let album = self
            .album_id
            .as_deref()
            .and_then(|id| ResourceKey::album(id).ok());
        image.into_iter().chain(album).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ActivityKind;

    #[test]
    fn parse_kind_is_case_insensitive() {
        assert_eq!(ActivityKind::parse("LIKE"), Some(ActivityKind::Like));
        assert_eq!(ActivityKind::parse(" follow "), Some(ActivityKind::Follow));
        assert_eq!(ActivityKind::parse("poke"), None);
    }
}
