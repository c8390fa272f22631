use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::commands::{CommandError, feeds, render, require_api, subjects_or_self};
use crate::jobs::notify::{self, Notification};
use crate::jobs::tasks::activity_poll::{self, ActivityPoll};
use crate::state::AppState;
use liner_infra::api::Subjects;

const NOTIFICATION_BUFFER: usize = 16;

pub async fn run(state: &AppState, users: Vec<String>) -> Result<(), CommandError> {
    let api = require_api(state)?;
    let subjects = Subjects(subjects_or_self(users, &api));
    let aggregator = feeds::activity_aggregator(state, api.clone());
    let view = feeds::load_pages(&aggregator, &subjects, 1).await?;
    render::print(&render::feed(&view))?;
    let head = view.items.first().map(|render| render.item.id.clone());

    let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
    let poll = activity_poll::run(
        ActivityPoll {
            api,
            subjects: subjects.clone(),
            cursor: state.config.initial_cursor.clone(),
            every: state.config.poll_interval,
        },
        head,
        tx,
    );
    let route = |notification: &Notification| match notification {
        Notification::Activity { user_ids } if *user_ids == subjects.0 => Some(subjects.clone()),
        _ => None,
    };
    let listen = notify::listen(rx, &aggregator, route, |tab, _| {
        let view = aggregator.view(tab);
        if let Err(err) = render::print(&render::feed(&view)) {
            warn!(error = %err, "failed to print refreshed feed");
        }
    });

    info!(subjects = ?subjects, "watching activity");
    let (polled, refreshed) = tokio::join!(poll, listen);
    info!(refreshed, "watch stopped");
    polled?;
    Ok(())
}
