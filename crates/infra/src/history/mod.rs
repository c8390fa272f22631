use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use liner_core::domain::{SearchHistory, SEARCH_HISTORY_NAMESPACE};

#[derive(Debug, Error)]
pub enum HistoryStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct FileHistoryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileHistoryStore {
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{SEARCH_HISTORY_NAMESPACE}.json")),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<SearchHistory, HistoryStoreError> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    pub async fn record(&self, term: &str) -> Result<SearchHistory, HistoryStoreError> {
        self.update(|history| {
            history.record(term);
        })
        .await
    }

    pub async fn remove(&self, term: &str) -> Result<SearchHistory, HistoryStoreError> {
        self.update(|history| {
            history.remove(term);
        })
        .await
    }

    pub async fn clear(&self) -> Result<SearchHistory, HistoryStoreError> {
        self.update(SearchHistory::clear).await
    }

    async fn update<F>(&self, mutate: F) -> Result<SearchHistory, HistoryStoreError>
    where
        F: FnOnce(&mut SearchHistory),
    {
        let _guard = self.lock.lock().await;
        let mut history = self.read().await?;
        mutate(&mut history);
        self.write(&history).await?;
        Ok(history)
    }

    async fn read(&self) -> Result<SearchHistory, HistoryStoreError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(SearchHistory::default()),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str::<Vec<String>>(&contents) {
            Ok(entries) => Ok(SearchHistory::from_entries(entries)),
            Err(err) => {
                warn!(error = %err, path = %self.path.display(), "search history unreadable; starting empty");
                Ok(SearchHistory::default())
            }
        }
    }

    async fn write(&self, history: &SearchHistory) -> Result<(), HistoryStoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec(history)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(entries = history.len(), "search history written");
        Ok(())
    }
}
