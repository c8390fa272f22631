use std::sync::Arc;

use reqwest::Client;
use thiserror::Error;
use tracing::warn;

use crate::config::AppConfig;
use crate::state::AppState;
use liner_infra::api::ApiClient;
use liner_infra::history::FileHistoryStore;

#[derive(Debug, Error)]
pub enum WiringError {
    #[error("http client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

pub fn build_state(config: AppConfig) -> Result<AppState, WiringError> {
    let client = Client::builder()
        .timeout(config.request_timeout)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()?;
    let api = match config.session() {
        Ok(session) => {
            let api = ApiClient::new(
                client,
                &config.api_base_url,
                &config.catalog_base_url,
                session,
            )
            .with_catalog_token(config.catalog_token.clone());
            Some(Arc::new(api))
        }
        Err(err) => {
            warn!(error = %err, "session not configured; remote commands disabled");
            None
        }
    };
    let history = FileHistoryStore::new(&config.data_dir);
    Ok(AppState {
        config: Arc::new(config),
        api,
        history: Arc::new(history),
    })
}
