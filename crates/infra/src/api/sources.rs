use std::sync::Arc;

use tracing::debug;

use crate::api::client::ApiClient;
use liner_core::domain::{Activity, ChatMessage, Page, Review};
use liner_core::feed::{LikeBackend, LikeReceipt, PageSource, ResourceSource};
use liner_core::types::{Cursor, Resource, ResourceKey};
use liner_core::{FeedError, MutationError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subjects(pub Vec<String>);

impl Subjects {
    pub fn single(user_id: &str) -> Self {
        Self(vec![user_id.to_string()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReviewQuery {
    ByUsers(Vec<String>),
    ByAlbums(Vec<String>),
}

pub struct ActivitySource {
    client: Arc<ApiClient>,
}

impl ActivitySource {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

impl PageSource for ActivitySource {
    type Query = Subjects;
    type Item = Activity;

    async fn fetch_page(&self, query: &Subjects, cursor: &Cursor) -> Result<Page<Activity>, FeedError> {
        Ok(self.client.activity_page(&query.0, cursor).await?)
    }
}

pub struct ReviewSource {
    client: Arc<ApiClient>,
}

impl ReviewSource {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

impl PageSource for ReviewSource {
    type Query = ReviewQuery;
    type Item = Review;

    async fn fetch_page(&self, query: &ReviewQuery, cursor: &Cursor) -> Result<Page<Review>, FeedError> {
        let page = match query {
            ReviewQuery::ByUsers(user_ids) => self.client.review_feed_page(user_ids, cursor).await?,
            ReviewQuery::ByAlbums(album_ids) => {
                self.client.album_reviews_page(album_ids, cursor).await?
            }
        };
        Ok(page)
    }
}

pub struct ChatSource {
    client: Arc<ApiClient>,
}

impl ChatSource {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

impl PageSource for ChatSource {
    type Query = String;
    type Item = ChatMessage;

    async fn fetch_page(&self, query: &String, cursor: &Cursor) -> Result<Page<ChatMessage>, FeedError> {
        Ok(self.client.messages_page(query, cursor).await?)
    }
}

impl ResourceSource for ApiClient {
    async fn fetch_resource(&self, key: &ResourceKey) -> Result<Option<Resource>, FeedError> {
        debug!(%key, "fetching resource");
        let resource = match key {
            ResourceKey::ProfileImage(filename) => {
                self.profile_image(filename).await?.map(Resource::Image)
            }
            ResourceKey::Album(catalog_id) => self.album(catalog_id).await?.map(Resource::Album),
        };
        Ok(resource)
    }
}

impl LikeBackend for ApiClient {
    async fn like(&self, user_id: &str, item_id: &str) -> Result<LikeReceipt, MutationError> {
        Ok(self.create_like(user_id, item_id).await?)
    }

    async fn unlike(&self, like_id: &str) -> Result<Option<i64>, MutationError> {
        Ok(self.delete_like(like_id).await?)
    }
}
