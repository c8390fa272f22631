mod cli;
mod commands;
mod config;
mod jobs;
mod state;
mod wiring;

use clap::Parser;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::commands::CommandError;
use crate::config::ConfigError;
use crate::state::AppState;
use crate::wiring::WiringError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("wiring error: {0}")]
    Wiring(#[from] WiringError),
    #[error("command error: {0}")]
    Command(#[from] CommandError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    config::load_dotenv()?;
    let config = config::AppConfig::from_env()?;
    let state = wiring::build_state(config)?;

    if matches!(cli.command, Command::Watch { .. }) {
        tokio::select! {
            _ = shutdown_signal() => {
                info!("shutdown signal received");
            }
            res = run(&state, cli.command) => {
                res?;
            }
        }
    } else {
        run(&state, cli.command).await?;
    }
    Ok(())
}

async fn run(state: &AppState, command: Command) -> Result<(), CommandError> {
    match command {
        Command::Feed { users, pages } => commands::feeds::feed(state, users, pages).await,
        Command::AlbumReviews { albums, pages } => {
            commands::feeds::album_reviews(state, albums, pages).await
        }
        Command::Activity { users } => commands::feeds::activity(state, users).await,
        Command::Chat {
            conversation,
            pages,
        } => commands::feeds::chat(state, conversation, pages).await,
        Command::Like {
            review,
            users,
            albums,
            pages,
        } => commands::like::toggle(state, &review, users, albums, pages).await,
        Command::History { action } => commands::history::run(state, action).await,
        Command::Watch { users } => commands::watch::run(state, users).await,
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install ctrl-c handler");
    }
}
