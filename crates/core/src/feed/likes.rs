use std::collections::{HashMap, HashSet};
use std::future::Future;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::MutationError;
use crate::types::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeReceipt {
    pub like_id: String,
    pub count: Option<i64>,
}

pub trait LikeBackend: Send + Sync {
    fn like(
        &self,
        user_id: &str,
        item_id: &str,
    ) -> impl Future<Output = Result<LikeReceipt, MutationError>> + Send;

    fn unlike(&self, like_id: &str) -> impl Future<Output = Result<Option<i64>, MutationError>> + Send;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikeEntry {
    pub liked: bool,
    pub count: i64,
    pub like_id: Option<String>,
}

impl LikeEntry {
    pub fn new(liked: bool, count: i64, like_id: Option<String>) -> Self {
        Self {
            liked,
            count,
            like_id,
        }
    }

    fn flipped(&self) -> Self {
        if self.liked {
            Self {
                liked: false,
                count: (self.count - 1).max(0),
                like_id: None,
            }
        } else {
            Self {
                liked: true,
                count: self.count + 1,
                like_id: None,
            }
        }
    }
}

#[derive(Debug, Default)]
struct LikeTable {
    entries: HashMap<String, LikeEntry>,
    pending: HashSet<String>,
}

/// Optimistic like/unlike with rollback.
///
/// The flipped state is visible through `get` before the backend answers.
/// Failure or cancellation restores the exact pre-mutation entry.
pub struct LikeReconciler<B> {
    backend: B,
    session: Session,
    table: Mutex<LikeTable>,
}

impl<B: LikeBackend> LikeReconciler<B> {
    pub fn new(backend: B, session: Session) -> Self {
        Self {
            backend,
            session,
            table: Mutex::new(LikeTable::default()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn get(&self, item_id: &str) -> Option<LikeEntry> {
        self.table.lock().entries.get(item_id).cloned()
    }

    pub fn is_pending(&self, item_id: &str) -> bool {
        self.table.lock().pending.contains(item_id)
    }

    pub fn seed(&self, item_id: &str, entry: LikeEntry) -> bool {
        let mut table = self.table.lock();
        if table.pending.contains(item_id) {
            return false;
        }
        table.entries.insert(item_id.to_string(), entry);
        true
    }

    pub fn seed_all<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (String, LikeEntry)>,
    {
        let mut table = self.table.lock();
        let mut seeded = 0;
        for (item_id, entry) in entries {
            if table.pending.contains(&item_id) {
                continue;
            }
            table.entries.insert(item_id, entry);
            seeded += 1;
        }
        seeded
    }

    pub async fn toggle_like(&self, item_id: &str) -> Result<LikeEntry, MutationError> {
        let (snapshot, provisional) = {
            let mut table = self.table.lock();
            if !table.pending.insert(item_id.to_string()) {
                return Err(MutationError::Busy(item_id.to_string()));
            }
            let snapshot = table.entries.get(item_id).cloned().unwrap_or_default();
            let provisional = snapshot.flipped();
            table
                .entries
                .insert(item_id.to_string(), provisional.clone());
            (snapshot, provisional)
        };
        let mut mutation = PendingMutation {
            table: &self.table,
            item_id,
            rollback: Some(snapshot.clone()),
        };
        debug!(item_id, liked = provisional.liked, count = provisional.count, "optimistic like applied");

        let result = if provisional.liked {
            self.backend
                .like(&self.session.user_id, item_id)
                .await
                .map(|receipt| LikeEntry {
                    liked: true,
                    count: receipt.count.unwrap_or(provisional.count),
                    like_id: Some(receipt.like_id),
                })
        } else {
            match snapshot.like_id.as_deref() {
                Some(like_id) => self.backend.unlike(like_id).await.map(|count| LikeEntry {
                    liked: false,
                    count: count.unwrap_or(provisional.count),
                    like_id: None,
                }),
                None => Err(MutationError::MissingLikeId(item_id.to_string())),
            }
        };

        match result {
            Ok(confirmed) => {
                self.table
                    .lock()
                    .entries
                    .insert(item_id.to_string(), confirmed.clone());
                mutation.rollback = None;
                Ok(confirmed)
            }
            Err(err) => {
                warn!(error = %err, item_id, "like mutation failed; rolling back");
                Err(err)
            }
        }
    }
}

struct PendingMutation<'a> {
    table: &'a Mutex<LikeTable>,
    item_id: &'a str,
    rollback: Option<LikeEntry>,
}

impl Drop for PendingMutation<'_> {
    fn drop(&mut self) {
        let mut table = self.table.lock();
        table.pending.remove(self.item_id);
        if let Some(snapshot) = self.rollback.take() {
            table.entries.insert(self.item_id.to_string(), snapshot);
        }
    }
}
