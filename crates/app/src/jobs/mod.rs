pub mod notify;
pub mod scheduler;
pub mod tasks;

use thiserror::Error;

use liner_infra::api::ApiError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("api error: {0}")]
    Api(#[from] ApiError),
    #[error("notification channel closed")]
    ChannelClosed,
}

impl JobError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, JobError::ChannelClosed)
    }
}
