use std::collections::HashSet;

use tracing::debug;

use crate::domain::Page;
use crate::error::FeedError;
use crate::feed::PageSource;
use crate::types::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainMode {
    SinglePage,
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainResult<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
    pub pages_fetched: usize,
}

impl<T> DrainResult<T> {
    pub fn is_exhausted(&self) -> bool {
        self.next_cursor.is_none()
    }
}

pub struct CursorPager<S> {
    source: S,
    max_pages: usize,
}

impl<S: PageSource> CursorPager<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_pages: 0,
        }
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn fetch_page(
        &self,
        query: &S::Query,
        cursor: &Cursor,
    ) -> Result<Page<S::Item>, FeedError> {
        self.source.fetch_page(query, cursor).await
    }

    /// Fetches pages sequentially starting at `start`.
    ///
    /// Empty pages that still carry a next cursor are skipped over in both
    /// modes; only a missing next cursor ends the stream. A cursor repeated
    /// within one drain is rejected as malformed.
    pub async fn drain(
        &self,
        query: &S::Query,
        start: &Cursor,
        mode: DrainMode,
    ) -> Result<DrainResult<S::Item>, FeedError> {
        let mut items = Vec::new();
        let mut cursor = start.clone();
        let mut seen = HashSet::new();
        seen.insert(start.clone());
        let mut pages_fetched = 0;

        loop {
            pages_fetched += 1;
            let page = self.fetch_page(query, &cursor).await?;
            let page_len = page.items.len();
            items.extend(page.items);

            let Some(next) = page.next_cursor else {
                debug!(?query, pages_fetched, total = items.len(), "page stream exhausted");
                return Ok(DrainResult {
                    items,
                    next_cursor: None,
                    pages_fetched,
                });
            };
            if !seen.insert(next.clone()) {
                return Err(FeedError::MalformedResponse(format!(
                    "cursor {next} repeated without progress"
                )));
            }
            cursor = next;

            if self.max_pages > 0 && pages_fetched >= self.max_pages {
                debug!(?query, pages_fetched, "drain page cap reached");
                break;
            }
            if mode == DrainMode::SinglePage && page_len > 0 {
                break;
            }
            if page_len == 0 {
                debug!(?query, cursor = %cursor, "empty page with next cursor; advancing");
            }
        }

        Ok(DrainResult {
            items,
            next_cursor: Some(cursor),
            pages_fetched,
        })
    }
}
