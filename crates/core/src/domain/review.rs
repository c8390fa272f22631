use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CoreError;
use crate::feed::{FeedItem, LikeEntry};
use crate::types::ResourceKey;

/// Star rating stored as half-stars, 0..=10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Rating(u8);

impl Rating {
    pub fn half_stars(self) -> u8 {
        self.0
    }

    pub fn stars(self) -> f32 {
        f32::from(self.0) / 2.0
    }
}

impl TryFrom<f32> for Rating {
    type Error = CoreError;

    fn try_from(stars: f32) -> Result<Self, Self::Error> {
        let doubled = stars * 2.0;
        if !(0.0..=10.0).contains(&doubled) || doubled.fract() != 0.0 {
            return Err(CoreError::InvalidRating(stars.to_string()));
        }
        Ok(Rating(doubled as u8))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub album_id: String,
    pub rating: Rating,
    pub body: String,
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub profile_image: Option<String>,
    pub viewer_like_id: Option<String>,
}

impl Review {
    pub fn like_entry(&self) -> LikeEntry {
        LikeEntry::new(
            self.viewer_like_id.is_some(),
            self.like_count,
            self.viewer_like_id.clone(),
        )
    }
}

impl FeedItem for Review {
    fn item_id(&self) -> &str {
        &self.id
    }

    fn resource_keys(&self) -> Vec<ResourceKey> {
        let mut keys = Vec::with_capacity(2);
        if let Some(key) = self
            .profile_image
            .as_deref()
            .and_then(|name| ResourceKey::profile_image(name).ok())
        {
            keys.push(key);
        }
        if let Ok(key) = ResourceKey::album(&self.album_id) {
            keys.push(key);
        }
        keys
    }
}
