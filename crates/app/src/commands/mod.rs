pub mod feeds;
pub mod history;
pub mod like;
pub mod render;
pub mod watch;

use std::sync::Arc;

use thiserror::Error;

use crate::jobs::JobError;
use crate::state::AppState;
use liner_core::{FeedError, MutationError};
use liner_infra::api::ApiClient;
use liner_infra::history::HistoryStoreError;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("session not configured (set LINER_USER_ID and LINER_TOKEN)")]
    SessionUnavailable,
    #[error("review {0} not found in the loaded feed")]
    ReviewNotFound(String),
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
    #[error("like error: {0}")]
    Mutation(#[from] MutationError),
    #[error("history error: {0}")]
    History(#[from] HistoryStoreError),
    #[error("job error: {0}")]
    Jobs(#[from] JobError),
    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

fn require_api(state: &AppState) -> Result<Arc<ApiClient>, CommandError> {
    state.api.clone().ok_or(CommandError::SessionUnavailable)
}

fn subjects_or_self(users: Vec<String>, api: &ApiClient) -> Vec<String> {
    if users.is_empty() {
        vec![api.session().user_id.clone()]
    } else {
        users
    }
}
