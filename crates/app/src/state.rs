use std::sync::Arc;

use crate::config::AppConfig;
use liner_infra::api::ApiClient;
use liner_infra::history::FileHistoryStore;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub api: Option<Arc<ApiClient>>,
    pub history: Arc<FileHistoryStore>,
}
