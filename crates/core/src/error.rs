use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("invalid rating: {0}")]
    InvalidRating(String),
    #[error("invalid resource key: {0}")]
    InvalidResourceKey(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("resolution error for {key}: {message}")]
pub struct ResolutionError {
    pub key: String,
    pub message: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MutationError {
    #[error("like request failed: {0}")]
    Backend(String),
    #[error("mutation already in flight for {0}")]
    Busy(String),
    #[error("no like id known for {0}")]
    MissingLikeId(String),
}
