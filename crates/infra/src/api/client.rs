use reqwest::{Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::from_str;
use thiserror::Error;
use tracing::debug;

use crate::api::payload::decode_image_payload;
use crate::api::wire::{
    ActivityNode, CatalogAlbum, CreateLikeRequest, LikeCreated, LikeDeleted, MessageNode,
    PageBody, ReviewNode, SubjectPageRequest,
};
use liner_core::domain::{Activity, ChatMessage, Page, Review};
use liner_core::feed::LikeReceipt;
use liner_core::types::{AlbumMetadata, Cursor, ImageBlob, Session};
use liner_core::{FeedError, MutationError};

const USER_AGENT: &str = "liner";
const BODY_LOG_LIMIT: usize = 256;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn is_malformed(&self) -> bool {
        match self {
            ApiError::Http(err) => err.is_decode(),
            ApiError::Status { .. } | ApiError::InvalidUrl(_) => false,
            ApiError::InvalidResponse(_)
            | ApiError::InvalidTimestamp(_)
            | ApiError::InvalidPayload(_) => true,
        }
    }
}

impl From<ApiError> for FeedError {
    fn from(err: ApiError) -> Self {
        if err.is_malformed() {
            FeedError::MalformedResponse(err.to_string())
        } else {
            FeedError::Network(err.to_string())
        }
    }
}

impl From<ApiError> for MutationError {
    fn from(err: ApiError) -> Self {
        MutationError::Backend(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_base: String,
    catalog_base: String,
    catalog_token: Option<String>,
    session: Session,
}

impl ApiClient {
    pub fn new(
        http: reqwest::Client,
        api_base: &str,
        catalog_base: &str,
        session: Session,
    ) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            catalog_base: catalog_base.trim_end_matches('/').to_string(),
            catalog_token: None,
            session,
        }
    }

    pub fn with_catalog_token(mut self, token: Option<String>) -> Self {
        self.catalog_token = token;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn activity_page(
        &self,
        user_ids: &[String],
        cursor: &Cursor,
    ) -> Result<Page<Activity>, ApiError> {
        let request = SubjectPageRequest {
            user_ids: Some(user_ids),
            album_ids: None,
            cursor: cursor.as_str(),
        };
        let body: PageBody<ActivityNode> = self.post_json("/activity/feed", &request).await?;
        body.into_page(ActivityNode::into_domain)
    }

    pub async fn review_feed_page(
        &self,
        user_ids: &[String],
        cursor: &Cursor,
    ) -> Result<Page<Review>, ApiError> {
        let request = SubjectPageRequest {
            user_ids: Some(user_ids),
            album_ids: None,
            cursor: cursor.as_str(),
        };
        let body: PageBody<ReviewNode> = self.post_json("/reviews/feed", &request).await?;
        body.into_page(ReviewNode::into_domain)
    }

    pub async fn album_reviews_page(
        &self,
        album_ids: &[String],
        cursor: &Cursor,
    ) -> Result<Page<Review>, ApiError> {
        let request = SubjectPageRequest {
            user_ids: None,
            album_ids: Some(album_ids),
            cursor: cursor.as_str(),
        };
        let body: PageBody<ReviewNode> = self.post_json("/reviews/albums", &request).await?;
        body.into_page(ReviewNode::into_domain)
    }

    pub async fn messages_page(
        &self,
        conversation_id: &str,
        cursor: &Cursor,
    ) -> Result<Page<ChatMessage>, ApiError> {
        let url = endpoint(&self.api_base, &["messages", conversation_id])?;
        let response = self
            .authorized(self.http.get(url))
            .query(&[("cursor", cursor.as_str())])
            .send()
            .await?;
        let body: PageBody<MessageNode> = read_json(response).await?;
        body.into_page(MessageNode::into_domain)
    }

    pub async fn profile_image(&self, filename: &str) -> Result<Option<ImageBlob>, ApiError> {
        let url = endpoint(&self.api_base, &["images", filename])?;
        let response = self.authorized(self.http.get(url)).send().await?;
        let Some(body) = read_optional_text(response).await? else {
            return Ok(None);
        };
        decode_image_payload(filename, &body).map(Some)
    }

    pub async fn album(&self, catalog_id: &str) -> Result<Option<AlbumMetadata>, ApiError> {
        let url = endpoint(&self.catalog_base, &["albums", catalog_id])?;
        let mut request = self.http.get(url).header("User-Agent", USER_AGENT);
        if let Some(token) = self.catalog_token.as_deref() {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        let response = request.send().await?;
        let Some(body) = read_optional_text(response).await? else {
            return Ok(None);
        };
        let album: CatalogAlbum = parse_body(&body)?;
        Ok(Some(album.into_domain()))
    }

    pub async fn create_like(&self, user_id: &str, review_id: &str) -> Result<LikeReceipt, ApiError> {
        let request = CreateLikeRequest { user_id, review_id };
        let created: LikeCreated = self.post_json("/likes", &request).await?;
        Ok(LikeReceipt {
            like_id: created.like_id,
            count: created.like_count,
        })
    }

    pub async fn delete_like(&self, like_id: &str) -> Result<Option<i64>, ApiError> {
        let url = endpoint(&self.api_base, &["likes", like_id])?;
        let response = self.authorized(self.http.delete(url)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(status_error(status, body));
        }
        if body.trim().is_empty() {
            return Ok(None);
        }
        let deleted: LikeDeleted = parse_body(&body)?;
        Ok(deleted.like_count)
    }

    async fn post_json<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: for<'de> Deserialize<'de>,
        B: Serialize + ?Sized,
    {
        let url = format!("{}{path}", self.api_base);
        debug!(%url, "api post");
        let response = self.authorized(self.http.post(url)).json(body).send().await?;
        read_json(response).await
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.session.token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
    }
}

async fn read_json<T>(response: Response) -> Result<T, ApiError>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(status_error(status, body));
    }
    parse_body(&body)
}

async fn read_optional_text(response: Response) -> Result<Option<String>, ApiError> {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    let body = response.text().await?;
    if !status.is_success() {
        return Err(status_error(status, body));
    }
    Ok(Some(body))
}

fn parse_body<T>(body: &str) -> Result<T, ApiError>
where
    T: for<'de> Deserialize<'de>,
{
    from_str(body).map_err(|err| {
        ApiError::InvalidResponse(format!("{err}; body {}", truncate(body, BODY_LOG_LIMIT)))
    })
}

fn endpoint(base: &str, segments: &[&str]) -> Result<Url, ApiError> {
    let mut url = Url::parse(base).map_err(|err| ApiError::InvalidUrl(format!("{base}: {err}")))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn status_error(status: StatusCode, body: String) -> ApiError {
    ApiError::Status {
        status: status.as_u16(),
        body: truncate(&body, BODY_LOG_LIMIT),
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
