use tracing::{debug, info};

use crate::commands::{CommandError, feeds, render, require_api, subjects_or_self};
use crate::state::AppState;
use liner_core::domain::Review;
use liner_core::feed::{
    FeedAggregator, FeedItem, LikeBackend, LikeEntry, LikeReconciler, PageSource, ResourceSource,
};
use liner_infra::api::ReviewQuery;

pub async fn toggle(
    state: &AppState,
    review_id: &str,
    users: Vec<String>,
    albums: Vec<String>,
    pages: usize,
) -> Result<(), CommandError> {
    let api = require_api(state)?;
    let tab = if albums.is_empty() {
        ReviewQuery::ByUsers(subjects_or_self(users, &api))
    } else {
        ReviewQuery::ByAlbums(albums)
    };
    let aggregator = feeds::review_aggregator(state, api.clone());
    let reconciler = LikeReconciler::new(api.as_ref().clone(), api.session().clone());
    let entry = toggle_in_feed(&aggregator, &tab, pages, &reconciler, review_id).await?;
    render::print(&render::like(review_id, &entry))?;
    Ok(())
}

pub async fn toggle_in_feed<S, R, B>(
    aggregator: &FeedAggregator<S, R>,
    tab: &S::Query,
    pages: usize,
    reconciler: &LikeReconciler<B>,
    review_id: &str,
) -> Result<LikeEntry, CommandError>
where
    S: PageSource<Item = Review>,
    R: ResourceSource,
    B: LikeBackend,
{
    let view = feeds::load_pages(aggregator, tab, pages).await?;
    let seeded = reconciler.seed_all(
        view.items
            .iter()
            .map(|render| (render.item.item_id().to_string(), render.item.like_entry())),
    );
    debug!(seeded, "like state seeded from feed");
    if reconciler.get(review_id).is_none() {
        return Err(CommandError::ReviewNotFound(review_id.to_string()));
    }
    let entry = reconciler.toggle_like(review_id).await?;
    info!(review_id, liked = entry.liked, count = entry.count, "like toggled");
    Ok(entry)
}
