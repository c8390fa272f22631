pub mod client;
pub mod payload;
pub mod sources;
mod wire;

pub use client::{ApiClient, ApiError};
pub use sources::{ActivitySource, ChatSource, ReviewQuery, ReviewSource, Subjects};
