use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::FeedError;
use crate::feed::pager::{CursorPager, DrainMode};
use crate::feed::resource_cache::{AuxiliaryCache, BatchStats, ResolvedResource};
use crate::feed::{FeedItem, PageSource, ResourceSource};
use crate::types::{Cursor, ResourceKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded {
        appended: usize,
        has_more: bool,
        resources: BatchStats,
    },
    Skipped(SkipReason),
    Stale,
    Failed(FeedError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InFlight,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub len: usize,
    pub cursor: Option<Cursor>,
    pub has_more: bool,
    pub is_fetching: bool,
    pub generation: u64,
    pub last_error: Option<FeedError>,
}

#[derive(Debug, Clone)]
pub struct RenderItem<T> {
    pub item: T,
    pub resources: Vec<(ResourceKey, Option<ResolvedResource>)>,
}

impl<T> RenderItem<T> {
    pub fn resource(&self, key: &ResourceKey) -> Option<&ResolvedResource> {
        self.resources
            .iter()
            .find(|(candidate, _)| candidate == key)
            .and_then(|(_, value)| value.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct FeedView<T> {
    pub items: Vec<RenderItem<T>>,
    pub has_more: bool,
    pub is_fetching: bool,
    pub last_error: Option<FeedError>,
}

struct FeedState<T> {
    items: Vec<T>,
    cursor: Option<Cursor>,
    has_more: bool,
    is_fetching: bool,
    generation: u64,
    last_error: Option<FeedError>,
}

impl<T> FeedState<T> {
    fn new(initial: Cursor, generation: u64) -> Self {
        Self {
            items: Vec::new(),
            cursor: Some(initial),
            has_more: true,
            is_fetching: false,
            generation,
            last_error: None,
        }
    }

    fn restart(&mut self, initial: Cursor, generation: u64) {
        self.items.clear();
        self.cursor = Some(initial);
        self.has_more = true;
        self.is_fetching = false;
        self.generation = generation;
        self.last_error = None;
    }

    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            len: self.items.len(),
            cursor: self.cursor.clone(),
            has_more: self.has_more,
            is_fetching: self.is_fetching,
            generation: self.generation,
            last_error: self.last_error.clone(),
        }
    }
}

struct Tabs<Q, T> {
    feeds: HashMap<Q, FeedState<T>>,
    active: Option<Q>,
    // Generations are unique across the aggregator's lifetime, so a tab that
    // is dropped and recreated never matches a stale in-flight request.
    epoch: u64,
}

impl<Q, T> Tabs<Q, T>
where
    Q: Clone + Eq + std::hash::Hash,
{
    fn next_generation(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    fn feed_mut(&mut self, tab: &Q, initial: &Cursor) -> &mut FeedState<T> {
        let epoch = &mut self.epoch;
        self.feeds.entry(tab.clone()).or_insert_with(|| {
            *epoch += 1;
            FeedState::new(initial.clone(), *epoch)
        })
    }

    fn current_mut(&mut self, tab: &Q, generation: u64) -> Option<&mut FeedState<T>> {
        self.feeds
            .get_mut(tab)
            .filter(|feed| feed.generation == generation)
    }
}

type TabsLock<S> = Mutex<Tabs<<S as PageSource>::Query, <S as PageSource>::Item>>;

/// Multi-tab infinite-scroll state over one page source.
///
/// Each tab admits at most one in-flight page request. The check-and-set of
/// the fetching flag happens under a short lock before the first await, so
/// the guard holds on multi-threaded runtimes too.
pub struct FeedAggregator<S: PageSource, R> {
    pager: CursorPager<S>,
    cache: AuxiliaryCache<R>,
    mode: DrainMode,
    initial_cursor: Cursor,
    tabs: TabsLock<S>,
}

impl<S, R> FeedAggregator<S, R>
where
    S: PageSource,
    R: ResourceSource,
{
    pub fn new(pager: CursorPager<S>, resources: Arc<R>, mode: DrainMode) -> Self {
        Self {
            pager,
            cache: AuxiliaryCache::new(resources),
            mode,
            initial_cursor: Cursor::initial(),
            tabs: Mutex::new(Tabs {
                feeds: HashMap::new(),
                active: None,
                epoch: 0,
            }),
        }
    }

    pub fn with_initial_cursor(mut self, cursor: Cursor) -> Self {
        self.initial_cursor = cursor;
        self
    }

    pub fn cache(&self) -> &AuxiliaryCache<R> {
        &self.cache
    }

    pub fn pager(&self) -> &CursorPager<S> {
        &self.pager
    }

    pub async fn load_next_page(&self, tab: &S::Query) -> LoadOutcome {
        let (cursor, generation) = {
            let mut tabs = self.tabs.lock();
            let feed = tabs.feed_mut(tab, &self.initial_cursor);
            if feed.is_fetching {
                debug!(?tab, "page fetch already in flight");
                return LoadOutcome::Skipped(SkipReason::InFlight);
            }
            if !feed.has_more {
                return LoadOutcome::Skipped(SkipReason::Exhausted);
            }
            let Some(cursor) = feed.cursor.clone() else {
                return LoadOutcome::Skipped(SkipReason::Exhausted);
            };
            feed.is_fetching = true;
            (cursor, feed.generation)
        };
        let _fetching = FetchingFlag {
            tabs: &self.tabs,
            tab,
            generation,
        };

        let drained = match self.pager.drain(tab, &cursor, self.mode).await {
            Ok(drained) => drained,
            Err(err) => {
                warn!(error = %err, ?tab, cursor = %cursor, "page fetch failed");
                let mut tabs = self.tabs.lock();
                if let Some(feed) = tabs.current_mut(tab, generation) {
                    feed.last_error = Some(err.clone());
                }
                return LoadOutcome::Failed(err);
            }
        };

        let keys: Vec<ResourceKey> = drained
            .items
            .iter()
            .flat_map(|item| item.resource_keys())
            .collect();
        let appended = drained.items.len();
        let has_more = {
            let mut tabs = self.tabs.lock();
            let Some(feed) = tabs.current_mut(tab, generation) else {
                debug!(?tab, "discarding page for a reset tab");
                return LoadOutcome::Stale;
            };
            feed.items.extend(drained.items);
            feed.has_more = drained.next_cursor.is_some();
            feed.cursor = drained.next_cursor;
            feed.last_error = None;
            feed.has_more
        };
        debug!(?tab, appended, has_more, pages = drained.pages_fetched, "page appended");

        let resources = self.cache.resolve_batch(keys).await;
        LoadOutcome::Loaded {
            appended,
            has_more,
            resources,
        }
    }

    pub async fn reset(&self, tab: &S::Query) -> LoadOutcome {
        {
            let mut tabs = self.tabs.lock();
            let generation = tabs.next_generation();
            tabs.feed_mut(tab, &self.initial_cursor)
                .restart(self.initial_cursor.clone(), generation);
        }
        info!(?tab, "feed reset");
        self.load_next_page(tab).await
    }

    pub async fn invalidate(&self, tab: &S::Query) -> LoadOutcome {
        self.reset(tab).await
    }

    pub async fn select_tab(&self, tab: &S::Query) -> Option<LoadOutcome> {
        let empty = {
            let mut tabs = self.tabs.lock();
            tabs.active = Some(tab.clone());
            tabs.feeds
                .get(tab)
                .is_none_or(|feed| feed.items.is_empty() && !feed.is_fetching)
        };
        if empty {
            Some(self.reset(tab).await)
        } else {
            None
        }
    }

    pub fn active_tab(&self) -> Option<S::Query> {
        self.tabs.lock().active.clone()
    }

    pub fn snapshot(&self, tab: &S::Query) -> Option<FeedSnapshot> {
        self.tabs.lock().feeds.get(tab).map(FeedState::snapshot)
    }

    pub fn items(&self, tab: &S::Query) -> Vec<S::Item> {
        self.tabs
            .lock()
            .feeds
            .get(tab)
            .map(|feed| feed.items.clone())
            .unwrap_or_default()
    }

    pub fn view(&self, tab: &S::Query) -> FeedView<S::Item> {
        let (items, has_more, is_fetching, last_error) = {
            let tabs = self.tabs.lock();
            match tabs.feeds.get(tab) {
                Some(feed) => (
                    feed.items.clone(),
                    feed.has_more,
                    feed.is_fetching,
                    feed.last_error.clone(),
                ),
                None => (Vec::new(), true, false, None),
            }
        };
        let items = items
            .into_iter()
            .map(|item| {
                let resources = item
                    .resource_keys()
                    .into_iter()
                    .map(|key| {
                        let value = self.cache.get(&key);
                        (key, value)
                    })
                    .collect();
                RenderItem { item, resources }
            })
            .collect();
        FeedView {
            items,
            has_more,
            is_fetching,
            last_error,
        }
    }

    pub fn clear_session(&self) {
        {
            let mut tabs = self.tabs.lock();
            tabs.feeds.clear();
            tabs.active = None;
        }
        self.cache.clear();
    }
}

struct FetchingFlag<'a, Q, T>
where
    Q: Clone + Eq + std::hash::Hash,
{
    tabs: &'a Mutex<Tabs<Q, T>>,
    tab: &'a Q,
    generation: u64,
}

impl<Q, T> Drop for FetchingFlag<'_, Q, T>
where
    Q: Clone + Eq + std::hash::Hash,
{
    fn drop(&mut self) {
        let mut tabs = self.tabs.lock();
        if let Some(feed) = tabs.current_mut(self.tab, self.generation) {
            feed.is_fetching = false;
        }
    }
}
