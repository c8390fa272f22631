pub mod aggregator;
pub mod likes;
pub mod pager;
pub mod resource_cache;

use std::future::Future;

use crate::domain::Page;
use crate::error::FeedError;
use crate::types::{Cursor, Resource, ResourceKey};

pub use aggregator::{FeedAggregator, FeedSnapshot, FeedView, LoadOutcome, RenderItem, SkipReason};
pub use likes::{LikeBackend, LikeEntry, LikeReceipt, LikeReconciler};
pub use pager::{CursorPager, DrainMode, DrainResult};
pub use resource_cache::{AuxiliaryCache, BatchStats, ResolvedResource};

pub trait FeedItem: Clone + Send + Sync + 'static {
    fn item_id(&self) -> &str;

    fn resource_keys(&self) -> Vec<ResourceKey>;
}

pub trait PageSource: Send + Sync {
    type Query: Clone + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync;
    type Item: FeedItem;

    fn fetch_page(
        &self,
        query: &Self::Query,
        cursor: &Cursor,
    ) -> impl Future<Output = Result<Page<Self::Item>, FeedError>> + Send;
}

/// `Ok(None)` is a "not found" answer, not a failure.
pub trait ResourceSource: Send + Sync + 'static {
    fn fetch_resource(
        &self,
        key: &ResourceKey,
    ) -> impl Future<Output = Result<Option<Resource>, FeedError>> + Send;
}
