pub mod domain;
pub mod error;
pub mod feed;
pub mod types;

pub use error::{CoreError, FeedError, MutationError, ResolutionError};
