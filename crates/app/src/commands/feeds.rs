use std::sync::Arc;

use tracing::{debug, info};

use crate::commands::{CommandError, render, require_api, subjects_or_self};
use crate::state::AppState;
use liner_core::feed::{
    CursorPager, DrainMode, FeedAggregator, FeedView, LoadOutcome, PageSource, ResourceSource,
    SkipReason,
};
use liner_infra::api::{ActivitySource, ApiClient, ChatSource, ReviewQuery, ReviewSource, Subjects};

pub async fn feed(state: &AppState, users: Vec<String>, pages: usize) -> Result<(), CommandError> {
    let api = require_api(state)?;
    let tab = ReviewQuery::ByUsers(subjects_or_self(users, &api));
    let aggregator = review_aggregator(state, api);
    let view = load_pages(&aggregator, &tab, pages).await?;
    render::print(&render::feed(&view))?;
    Ok(())
}

pub async fn album_reviews(
    state: &AppState,
    albums: Vec<String>,
    pages: usize,
) -> Result<(), CommandError> {
    let api = require_api(state)?;
    let tab = ReviewQuery::ByAlbums(albums);
    let aggregator = review_aggregator(state, api);
    let view = load_pages(&aggregator, &tab, pages).await?;
    render::print(&render::feed(&view))?;
    Ok(())
}

pub async fn activity(state: &AppState, users: Vec<String>) -> Result<(), CommandError> {
    let api = require_api(state)?;
    let tab = Subjects(subjects_or_self(users, &api));
    let aggregator = activity_aggregator(state, api);
    let view = load_pages(&aggregator, &tab, 1).await?;
    render::print(&render::feed(&view))?;
    Ok(())
}

pub async fn chat(state: &AppState, conversation: String, pages: usize) -> Result<(), CommandError> {
    let api = require_api(state)?;
    let aggregator = aggregator(state, ChatSource::new(api.clone()), api, DrainMode::SinglePage);
    let view = load_pages(&aggregator, &conversation, pages).await?;
    render::print(&render::feed(&view))?;
    Ok(())
}

pub fn review_aggregator(
    state: &AppState,
    api: Arc<ApiClient>,
) -> FeedAggregator<ReviewSource, ApiClient> {
    aggregator(state, ReviewSource::new(api.clone()), api, DrainMode::SinglePage)
}

pub fn activity_aggregator(
    state: &AppState,
    api: Arc<ApiClient>,
) -> FeedAggregator<ActivitySource, ApiClient> {
    aggregator(state, ActivitySource::new(api.clone()), api, DrainMode::All)
}

fn aggregator<S: PageSource>(
    state: &AppState,
    source: S,
    api: Arc<ApiClient>,
    mode: DrainMode,
) -> FeedAggregator<S, ApiClient> {
    let pager = CursorPager::new(source).with_max_pages(state.config.max_drain_pages);
    FeedAggregator::new(pager, api, mode).with_initial_cursor(state.config.initial_cursor.clone())
}

pub async fn load_pages<S, R>(
    aggregator: &FeedAggregator<S, R>,
    tab: &S::Query,
    pages: usize,
) -> Result<FeedView<S::Item>, CommandError>
where
    S: PageSource,
    R: ResourceSource,
{
    let pages = pages.max(1);
    let mut outcome = aggregator.select_tab(tab).await;
    for loaded in 1..=pages {
        match outcome {
            Some(LoadOutcome::Failed(err)) => return Err(err.into()),
            Some(LoadOutcome::Loaded {
                appended,
                has_more,
                resources,
            }) => {
                debug!(appended, has_more, ?resources, "feed page loaded");
                if !has_more {
                    break;
                }
            }
            Some(LoadOutcome::Skipped(SkipReason::Exhausted)) => break,
            Some(LoadOutcome::Skipped(SkipReason::InFlight) | LoadOutcome::Stale) | None => {}
        }
        if loaded == pages {
            break;
        }
        outcome = Some(aggregator.load_next_page(tab).await);
    }
    let view = aggregator.view(tab);
    info!(?tab, items = view.items.len(), has_more = view.has_more, "feed loaded");
    Ok(view)
}
