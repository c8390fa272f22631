use crate::cli::HistoryAction;
use crate::commands::{CommandError, render};
use crate::state::AppState;
use liner_core::domain::SearchHistory;
use liner_infra::history::FileHistoryStore;

pub async fn run(state: &AppState, action: HistoryAction) -> Result<(), CommandError> {
    let history = apply(&state.history, action).await?;
    render::print(&history)?;
    Ok(())
}

async fn apply(store: &FileHistoryStore, action: HistoryAction) -> Result<SearchHistory, CommandError> {
    let history = match action {
        HistoryAction::List => store.load().await?,
        HistoryAction::Add { term } => store.record(&term).await?,
        HistoryAction::Remove { term } => store.remove(&term).await?,
        HistoryAction::Clear => store.clear().await?,
    };
    Ok(history)
}
