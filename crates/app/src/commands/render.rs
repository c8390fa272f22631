use serde::Serialize;

use liner_core::FeedError;
use liner_core::feed::{FeedView, LikeEntry, RenderItem};
use liner_core::types::{AlbumMetadata, Resource, ResourceKey};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedFeed<'a, T: Serialize> {
    pub items: Vec<RenderedItem<'a, T>>,
    pub has_more: bool,
    pub is_fetching: bool,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RenderedItem<'a, T: Serialize> {
    #[serde(flatten)]
    pub item: &'a T,
    pub resources: Vec<RenderedResource<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RenderedResource<'a> {
    Image { key: String, mime: &'a str, bytes: usize },
    Album { key: String, album: &'a AlbumMetadata },
    Missing { key: String },
    Placeholder { key: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedLike<'a> {
    pub review_id: &'a str,
    pub liked: bool,
    pub count: i64,
    pub like_id: Option<&'a str>,
}

pub fn feed<T: Serialize>(view: &FeedView<T>) -> RenderedFeed<'_, T> {
    RenderedFeed {
        items: view.items.iter().map(item).collect(),
        has_more: view.has_more,
        is_fetching: view.is_fetching,
        error: view.last_error.as_ref().map(FeedError::to_string),
    }
}

fn item<T: Serialize>(render: &RenderItem<T>) -> RenderedItem<'_, T> {
    let resources = render
        .resources
        .iter()
        .map(|(key, value)| resource(key, value.as_deref()))
        .collect();
    RenderedItem {
        item: &render.item,
        resources,
    }
}

fn resource<'a>(key: &ResourceKey, value: Option<&'a Resource>) -> RenderedResource<'a> {
    let key = key.to_string();
    match value {
        Some(Resource::Image(blob)) => RenderedResource::Image {
            key,
            mime: &blob.mime,
            bytes: blob.bytes.len(),
        },
        Some(Resource::Album(album)) => RenderedResource::Album { key, album },
        Some(Resource::Missing) => RenderedResource::Missing { key },
        None => RenderedResource::Placeholder { key },
    }
}

pub fn like<'a>(review_id: &'a str, entry: &'a LikeEntry) -> RenderedLike<'a> {
    RenderedLike {
        review_id,
        liked: entry.liked,
        count: entry.count,
        like_id: entry.like_id.as_deref(),
    }
}

pub fn print<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::Serialize;
    use serde_json::json;

    use super::feed;
    use liner_core::FeedError;
    use liner_core::feed::{FeedView, RenderItem};
    use liner_core::types::{ImageBlob, Resource, ResourceKey};

    #[derive(Debug, Clone, Serialize)]
    struct Post {
        id: String,
    }

    #[test]
    fn renders_resolved_missing_and_placeholder_resources() {
        let avatar = ResourceKey::profile_image("a.png").unwrap();
        let gone = ResourceKey::profile_image("gone.png").unwrap();
        let album = ResourceKey::album("alb1").unwrap();
        let view = FeedView {
            items: vec![RenderItem {
                item: Post { id: "p1".to_string() },
                resources: vec![
                    (
                        avatar,
                        Some(Arc::new(Resource::Image(ImageBlob {
                            mime: "image/png".to_string(),
                            bytes: vec![1, 2, 3],
                        }))),
                    ),
                    (gone, Some(Arc::new(Resource::Missing))),
                    (album, None),
                ],
            }],
            has_more: false,
            is_fetching: false,
            last_error: Some(FeedError::Network("offline".to_string())),
        };

        let value = serde_json::to_value(feed(&view)).unwrap();
        assert_eq!(value["items"][0]["id"], json!("p1"));
        let resources = &value["items"][0]["resources"];
        assert_eq!(resources[0]["status"], json!("image"));
        assert_eq!(resources[0]["bytes"], json!(3));
        assert_eq!(resources[1]["status"], json!("missing"));
        assert_eq!(resources[2]["status"], json!("placeholder"));
        assert_eq!(resources[2]["key"], json!("album:alb1"));
        assert_eq!(value["hasMore"], json!(false));
        assert!(value["error"].as_str().unwrap().contains("offline"));
    }
}
