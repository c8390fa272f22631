use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::sync::mpsc::Sender;
use tracing::{debug, info};

use crate::jobs::JobError;
use crate::jobs::notify::Notification;
use crate::jobs::scheduler;
use liner_core::domain::{Activity, Page};
use liner_core::types::Cursor;
use liner_infra::api::{ApiClient, Subjects};

pub struct ActivityPoll {
    pub api: Arc<ApiClient>,
    pub subjects: Subjects,
    pub cursor: Cursor,
    pub every: Duration,
}

pub async fn run(
    poll: ActivityPoll,
    head: Option<String>,
    tx: Sender<Notification>,
) -> Result<(), JobError> {
    let poll = Arc::new(poll);
    let head = Arc::new(Mutex::new(head));
    scheduler::run_interval("activity_poll", poll.every, move || {
        let poll = poll.clone();
        let head = head.clone();
        let tx = tx.clone();
        async move { poll_once(&poll, &head, &tx).await }
    })
    .await
}

async fn poll_once(
    poll: &ActivityPoll,
    head: &Mutex<Option<String>>,
    tx: &Sender<Notification>,
) -> Result<(), JobError> {
    let page = poll.api.activity_page(&poll.subjects.0, &poll.cursor).await?;
    if !advance_head(&mut *head.lock().await, &page) {
        debug!("no new activity");
        return Ok(());
    }
    info!(subjects = ?poll.subjects, "new activity");
    tx.send(Notification::Activity {
        user_ids: poll.subjects.0.clone(),
    })
    .await
    .map_err(|_| JobError::ChannelClosed)
}

fn advance_head(head: &mut Option<String>, page: &Page<Activity>) -> bool {
    let Some(newest) = page.items.first() else {
        return false;
    };
    if head.as_deref() == Some(newest.id.as_str()) {
        return false;
    }
    *head = Some(newest.id.clone());
    true
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::advance_head;
    use liner_core::domain::{Activity, ActivityKind, Page};

    fn page(ids: &[&str]) -> Page<Activity> {
        let items = ids
            .iter()
            .map(|id| Activity {
                id: id.to_string(),
                kind: ActivityKind::Like,
                actor_id: "u2".to_string(),
                actor_name: "sam".to_string(),
                review_id: Some("r1".to_string()),
                album_id: None,
                created_at: Utc::now(),
                actor_image: None,
            })
            .collect();
        Page::new(items, None)
    }

    #[test]
    fn unchanged_head_is_quiet() {
        let mut head = Some("a2".to_string());
        assert!(!advance_head(&mut head, &page(&["a2", "a1"])));
        assert_eq!(head.as_deref(), Some("a2"));
    }

    #[test]
    fn new_head_is_recorded() {
        let mut head = Some("a2".to_string());
        assert!(advance_head(&mut head, &page(&["a3", "a2"])));
        assert_eq!(head.as_deref(), Some("a3"));
    }

    #[test]
    fn first_activity_after_empty_feed_counts() {
        let mut head = None;
        assert!(!advance_head(&mut head, &page(&[])));
        assert!(advance_head(&mut head, &page(&["a1"])));
    }
}
