use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::client::ApiError;
use liner_core::domain::{Activity, ActivityKind, ChatMessage, Page, Rating, Review};
use liner_core::types::{AlbumMetadata, Cursor};

#[derive(Debug, Serialize)]
pub(crate) struct SubjectPageRequest<'a> {
    #[serde(rename = "userIds", skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<&'a [String]>,
    #[serde(rename = "albumIds", skip_serializing_if = "Option::is_none")]
    pub album_ids: Option<&'a [String]>,
    pub cursor: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateLikeRequest<'a> {
    #[serde(rename = "userId")]
    pub user_id: &'a str,
    #[serde(rename = "reviewId")]
    pub review_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageBody<T> {
    #[serde(alias = "activities", alias = "reviews", alias = "messages")]
    pub items: Vec<T>,
    #[serde(rename = "nextCursor", default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivityNode {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "actorId")]
    actor_id: String,
    #[serde(rename = "actorName", default)]
    actor_name: Option<String>,
    #[serde(rename = "reviewId", default)]
    review_id: Option<String>,
    #[serde(rename = "albumId", default)]
    album_id: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: String,
    #[serde(rename = "actorImage", default)]
    actor_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewNode {
    id: String,
    #[serde(rename = "userId")]
    user_id: String,
    username: String,
    #[serde(rename = "albumId")]
    album_id: String,
    rating: f32,
    #[serde(alias = "text", default)]
    body: String,
    #[serde(rename = "likeCount", default)]
    like_count: i64,
    #[serde(rename = "createdAt")]
    created_at: String,
    #[serde(rename = "profileImage", default)]
    profile_image: Option<String>,
    #[serde(rename = "likeId", default)]
    like_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessageNode {
    id: String,
    #[serde(rename = "conversationId")]
    conversation_id: String,
    #[serde(rename = "senderId")]
    sender_id: String,
    body: String,
    #[serde(rename = "sentAt")]
    sent_at: String,
    #[serde(rename = "senderImage", default)]
    sender_image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikeCreated {
    #[serde(rename = "likeId", alias = "id")]
    pub like_id: String,
    #[serde(rename = "likeCount", default)]
    pub like_count: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LikeDeleted {
    #[serde(rename = "likeCount", default)]
    pub like_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogAlbum {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<CatalogArtist>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<CatalogImage>,
    #[serde(default)]
    genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CatalogImage {
    url: String,
    #[serde(default)]
    width: Option<u32>,
}

impl<T> PageBody<T> {
    /// Items that fail to map are skipped; a bad cursor fails the page.
    pub fn into_page<U, F>(self, mut map: F) -> Result<Page<U>, ApiError>
    where
        F: FnMut(T) -> Result<U, ApiError>,
    {
        let mut items = Vec::with_capacity(self.items.len());
        for node in self.items {
            match map(node) {
                Ok(item) => items.push(item),
                Err(err) => warn!(error = %err, "skipping malformed feed item"),
            }
        }
        let next_cursor = match self.next_cursor.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Cursor::parse(raw)
                    .map_err(|err| ApiError::InvalidResponse(err.to_string()))?,
            ),
        };
        Ok(Page::new(items, next_cursor))
    }
}

impl ActivityNode {
    pub fn into_domain(self) -> Result<Activity, ApiError> {
        let kind = ActivityKind::parse(&self.kind).ok_or_else(|| {
            ApiError::InvalidResponse(format!("unknown activity type: {}", self.kind))
        })?;
        Ok(Activity {
            kind,
            created_at: parse_datetime(&self.created_at)?,
            actor_name: self.actor_name.unwrap_or_else(|| self.actor_id.clone()),
            id: self.id,
            actor_id: self.actor_id,
            review_id: non_empty(self.review_id),
            album_id: non_empty(self.album_id),
            actor_image: non_empty(self.actor_image),
        })
    }
}

impl ReviewNode {
    pub fn into_domain(self) -> Result<Review, ApiError> {
        let rating = Rating::try_from(self.rating)
            .map_err(|err| ApiError::InvalidResponse(err.to_string()))?;
        Ok(Review {
            created_at: parse_datetime(&self.created_at)?,
            id: self.id,
            user_id: self.user_id,
            username: self.username,
            album_id: self.album_id,
            rating,
            body: self.body,
            like_count: self.like_count.max(0),
            profile_image: non_empty(self.profile_image),
            viewer_like_id: non_empty(self.like_id),
        })
    }
}

impl MessageNode {
    pub fn into_domain(self) -> Result<ChatMessage, ApiError> {
        Ok(ChatMessage {
            sent_at: parse_datetime(&self.sent_at)?,
            id: self.id,
            conversation_id: self.conversation_id,
            sender_id: self.sender_id,
            body: self.body,
            sender_image: non_empty(self.sender_image),
        })
    }
}

impl CatalogAlbum {
    pub fn into_domain(self) -> AlbumMetadata {
        let year = self
            .release_date
            .as_deref()
            .and_then(|date| date.get(..4))
            .and_then(|year| year.parse().ok());
        let cover_url = self
            .images
            .into_iter()
            .max_by_key(|image| image.width.unwrap_or(0))
            .map(|image| image.url);
        let artist = self
            .artists
            .into_iter()
            .map(|artist| artist.name)
            .collect::<Vec<_>>()
            .join(", ");
        AlbumMetadata {
            id: self.id,
            title: self.name,
            artist,
            year,
            cover_url,
            genres: self.genres,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|inner| !inner.trim().is_empty())
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, ApiError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::InvalidTimestamp(value.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::from_str;

    use super::*;

    #[test]
    fn activity_page_maps_items_and_cursor() {
        let body = r#"{
            "activities": [
                {"id": "a1", "type": "like", "actorId": "u2", "actorName": "june",
                 "reviewId": "r1", "albumId": "", "createdAt": "2024-05-01T10:00:00Z",
                 "actorImage": "june.png"}
            ],
            "nextCursor": "2024-05-01T10:00:00Z"
        }"#;
        let wire: PageBody<ActivityNode> = from_str(body).unwrap();
        let page = wire.into_page(ActivityNode::into_domain).unwrap();
        assert_eq!(page.items.len(), 1);
        let activity = &page.items[0];
        assert_eq!(activity.kind, ActivityKind::Like);
        assert_eq!(activity.album_id, None);
        assert_eq!(activity.actor_image.as_deref(), Some("june.png"));
        assert_eq!(
            page.next_cursor.unwrap().as_str(),
            "2024-05-01T10:00:00Z"
        );
    }

    #[test]
    fn null_cursor_means_last_page() {
        let body = r#"{"reviews": [], "nextCursor": null}"#;
        let wire: PageBody<ReviewNode> = from_str(body).unwrap();
        let page = wire.into_page(ReviewNode::into_domain).unwrap();
        assert!(page.is_terminal_empty());
    }

    #[test]
    fn missing_cursor_field_means_last_page() {
        let body = r#"{"messages": []}"#;
        let wire: PageBody<MessageNode> = from_str(body).unwrap();
        assert!(wire.into_page(MessageNode::into_domain).unwrap().is_last());
    }

    #[test]
    fn invalid_cursor_is_rejected() {
        let body = r#"{"messages": [], "nextCursor": "page-2"}"#;
        let wire: PageBody<MessageNode> = from_str(body).unwrap();
        assert!(matches!(
            wire.into_page(MessageNode::into_domain),
            Err(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn review_maps_viewer_like() {
        let body = r#"{
            "reviews": [
                {"id": "r1", "userId": "u1", "username": "mira", "albumId": "x1",
                 "rating": 4.5, "text": "warm", "likeCount": 3,
                 "createdAt": "2024-05-01T10:00:00Z", "likeId": "L7"}
            ],
            "nextCursor": null
        }"#;
        let wire: PageBody<ReviewNode> = from_str(body).unwrap();
        let page = wire.into_page(ReviewNode::into_domain).unwrap();
        let review = &page.items[0];
        assert_eq!(review.body, "warm");
        assert_eq!(review.rating.half_stars(), 9);
        assert_eq!(review.viewer_like_id.as_deref(), Some("L7"));
        assert!(review.like_entry().liked);
    }

    #[test]
    fn unknown_activity_type_is_invalid() {
        let node: ActivityNode = from_str(
            r#"{"id": "a1", "type": "poke", "actorId": "u2", "createdAt": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert!(node.into_domain().is_err());
    }

    #[test]
    fn malformed_items_are_skipped_without_losing_the_page() {
        let body = r#"{
            "activities": [
                {"id": "a1", "type": "poke", "actorId": "u2", "createdAt": "2024-05-01T10:00:00Z"},
                {"id": "a2", "type": "follow", "actorId": "u3", "createdAt": "2024-05-01T09:00:00Z"}
            ],
            "nextCursor": "2024-05-01T09:00:00Z"
        }"#;
        let wire: PageBody<ActivityNode> = from_str(body).unwrap();
        let page = wire.into_page(ActivityNode::into_domain).unwrap();
        let ids: Vec<_> = page.items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["a2"]);
        assert_eq!(page.next_cursor.unwrap().as_str(), "2024-05-01T09:00:00Z");

        let body = r#"{
            "reviews": [
                {"id": "r1", "userId": "u1", "username": "mira", "albumId": "x1",
                 "rating": 4.3, "text": "odd", "createdAt": "2024-05-01T10:00:00Z"}
            ],
            "nextCursor": null
        }"#;
        let wire: PageBody<ReviewNode> = from_str(body).unwrap();
        assert!(wire.into_page(ReviewNode::into_domain).unwrap().is_terminal_empty());
    }

    #[test]
    fn bad_timestamp_is_invalid() {
        let node: MessageNode = from_str(
            r#"{"id": "m1", "conversationId": "c1", "senderId": "u1", "body": "hi", "sentAt": "yesterday"}"#,
        )
        .unwrap();
        assert!(matches!(
            node.into_domain(),
            Err(ApiError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn catalog_album_picks_largest_cover_and_year() {
        let album: CatalogAlbum = from_str(
            r#"{
                "id": "x1", "name": "OK Computer",
                "artists": [{"name": "Radiohead"}],
                "release_date": "1997-05-21",
                "images": [{"url": "small", "width": 64}, {"url": "large", "width": 640}],
                "genres": ["art rock"]
            }"#,
        )
        .unwrap();
        let metadata = album.into_domain();
        assert_eq!(metadata.year, Some(1997));
        assert_eq!(metadata.cover_url.as_deref(), Some("large"));
        assert_eq!(metadata.artist, "Radiohead");
    }
}
