use tokio::sync::mpsc::Receiver;
use tracing::{debug, info, warn};

use liner_core::feed::{FeedAggregator, LoadOutcome, PageSource, ResourceSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Activity { user_ids: Vec<String> },
    Message { conversation_id: String },
}

pub async fn listen<S, R, F, G>(
    mut rx: Receiver<Notification>,
    aggregator: &FeedAggregator<S, R>,
    route: F,
    mut on_refresh: G,
) -> usize
where
    S: PageSource,
    R: ResourceSource,
    F: Fn(&Notification) -> Option<S::Query>,
    G: FnMut(&S::Query, &LoadOutcome),
{
    let mut refreshed = 0;
    while let Some(first) = rx.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = rx.try_recv() {
            batch.push(next);
        }
        let mut tabs: Vec<S::Query> = Vec::new();
        for notification in &batch {
            match route(notification) {
                Some(tab) if !tabs.contains(&tab) => tabs.push(tab),
                Some(_) => {}
                None => debug!(?notification, "notification has no tab"),
            }
        }
        for tab in tabs {
            let outcome = aggregator.invalidate(&tab).await;
            if let LoadOutcome::Failed(err) = &outcome {
                warn!(error = %err, ?tab, "refresh after notification failed");
            }
            on_refresh(&tab, &outcome);
            refreshed += 1;
        }
    }
    info!(refreshed, "notification channel closed");
    refreshed
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::mpsc;

    use super::{Notification, listen};
    use liner_core::FeedError;
    use liner_core::domain::{ChatMessage, Page};
    use liner_core::feed::{
        CursorPager, DrainMode, FeedAggregator, LoadOutcome, PageSource, ResourceSource,
    };
    use liner_core::types::{Cursor, Resource, ResourceKey};

    #[derive(Default)]
    struct Counting {
        fetches: AtomicUsize,
    }

    impl PageSource for Counting {
        type Query = String;
        type Item = ChatMessage;

        async fn fetch_page(&self, query: &String, _: &Cursor) -> Result<Page<ChatMessage>, FeedError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(Page::new(
                vec![ChatMessage {
                    id: format!("m{n}"),
                    conversation_id: query.clone(),
                    sender_id: "u1".to_string(),
                    body: "hello".to_string(),
                    sent_at: chrono::Utc::now(),
                    sender_image: None,
                }],
                None,
            ))
        }
    }

    struct NoResources;

    impl ResourceSource for NoResources {
        async fn fetch_resource(&self, _: &ResourceKey) -> Result<Option<Resource>, FeedError> {
            Ok(None)
        }
    }

    fn route(notification: &Notification) -> Option<String> {
        match notification {
            Notification::Message { conversation_id } => Some(conversation_id.clone()),
            Notification::Activity { .. } => None,
        }
    }

    fn aggregator() -> FeedAggregator<Counting, NoResources> {
        FeedAggregator::new(
            CursorPager::new(Counting::default()),
            Arc::new(NoResources),
            DrainMode::SinglePage,
        )
    }

    fn message(conversation_id: &str) -> Notification {
        Notification::Message {
            conversation_id: conversation_id.to_string(),
        }
    }

    #[tokio::test]
    async fn queued_notifications_coalesce_per_tab() {
        let aggregator = aggregator();
        let (tx, rx) = mpsc::channel(8);
        tx.send(message("c1")).await.unwrap();
        tx.send(message("c1")).await.unwrap();
        tx.send(message("c2")).await.unwrap();
        tx.send(Notification::Activity {
            user_ids: vec!["u1".to_string()],
        })
        .await
        .unwrap();
        drop(tx);

        let mut refreshed_tabs = Vec::new();
        let count = listen(rx, &aggregator, route, |tab: &String, outcome| {
            assert!(matches!(outcome, LoadOutcome::Loaded { .. }));
            refreshed_tabs.push(tab.clone());
        })
        .await;

        assert_eq!(count, 2);
        assert_eq!(refreshed_tabs, vec!["c1".to_string(), "c2".to_string()]);
        assert_eq!(aggregator.pager().source().fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_replaces_tab_contents() {
        let aggregator = aggregator();
        let tab = "c1".to_string();
        aggregator.load_next_page(&tab).await;
        assert_eq!(aggregator.items(&tab)[0].id, "m1");

        let (tx, rx) = mpsc::channel(1);
        tx.send(message("c1")).await.unwrap();
        drop(tx);

        let count = listen(rx, &aggregator, route, |_: &String, _| {}).await;
        assert_eq!(count, 1);
        let items = aggregator.items(&tab);
        let ids: Vec<_> = items.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["m2"]);
    }
}
