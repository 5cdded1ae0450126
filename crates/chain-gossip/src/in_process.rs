//! Single-instance, no-network back-end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chain_types::CoreError;
use tokio::sync::{mpsc, Mutex};

use crate::{metrics, GossipBackend, GossipMessage, Subscription};

struct Subscriber {
    id: u64,
    sender: mpsc::Sender<GossipMessage>,
}

type TopicMap = Arc<Mutex<HashMap<String, Vec<Subscriber>>>>;

pub struct InProcessBackend {
    topics: TopicMap,
    next_id: AtomicU64,
}

impl Default for InProcessBackend {
    fn default() -> Self {
        Self {
            topics: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl InProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GossipBackend for InProcessBackend {
    async fn publish(&self, topic: &str, message: GossipMessage) -> Result<(), CoreError> {
        let subscribers: Vec<mpsc::Sender<GossipMessage>> = {
            let topics = self.topics.lock().await;
            topics
                .get(topic)
                .map(|subs| subs.iter().map(|s| s.sender.clone()).collect())
                .unwrap_or_default()
        };

        for sender in &subscribers {
            // Blocks when the subscriber's queue is full: mandatory
            // back-pressure, no silent drops.
            if sender.send(message.clone()).await.is_ok() {
                metrics::set_queue_size(topic, sender.capacity());
            }
        }
        metrics::record_publication(topic);
        Ok(())
    }

    async fn subscribe(&self, topic: &str, max_queue_size: usize) -> Result<Subscription, CoreError> {
        let (tx, rx) = mpsc::channel(max_queue_size.max(1));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        {
            let mut topics = self.topics.lock().await;
            let subs = topics.entry(topic.to_string()).or_default();
            subs.push(Subscriber { id, sender: tx });
            metrics::subscriber_joined(topic, subs.len());
        }

        let topics_for_close = self.topics.clone();
        let topic_for_close = topic.to_string();
        Ok(Subscription::new(topic.to_string(), rx, move || {
            let topics = topics_for_close;
            let topic = topic_for_close;
            tokio::spawn(async move {
                let mut guard = topics.lock().await;
                if let Some(subs) = guard.get_mut(&topic) {
                    subs.retain(|s| s.id != id);
                    let remaining = subs.len();
                    if remaining == 0 {
                        guard.remove(&topic);
                    }
                    metrics::subscriber_left(&topic, remaining);
                }
            });
        }))
    }

    async fn shutdown(&self) -> Result<(), CoreError> {
        let mut topics = self.topics.lock().await;
        topics.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_delivers_fifo_per_subscriber() {
        let backend = InProcessBackend::new();
        let mut sub = backend.subscribe("blocks", 10).await.unwrap();
        backend
            .publish("blocks", GossipMessage::Json(json!({"height": 1})))
            .await
            .unwrap();
        backend
            .publish("blocks", GossipMessage::Json(json!({"height": 2})))
            .await
            .unwrap();

        assert_eq!(
            sub.get().await,
            Some(GossipMessage::Json(json!({"height": 1})))
        );
        assert_eq!(
            sub.get().await,
            Some(GossipMessage::Json(json!({"height": 2})))
        );
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_a_no_op() {
        let backend = InProcessBackend::new();
        backend
            .publish("blocks", GossipMessage::Text("hi".into()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let backend = InProcessBackend::new();
        let mut blocks_sub = backend.subscribe("blocks", 10).await.unwrap();
        let mut tx_sub = backend.subscribe("transactions", 10).await.unwrap();

        backend
            .publish("blocks", GossipMessage::Text("b".into()))
            .await
            .unwrap();

        assert_eq!(blocks_sub.get().await, Some(GossipMessage::Text("b".into())));
        assert!(tx_sub.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn backpressure_blocks_publisher_until_consumer_drains() {
        let backend = Arc::new(InProcessBackend::new());
        let mut sub = backend.subscribe("blocks", 1).await.unwrap();
        backend
            .publish("blocks", GossipMessage::Text("1".into()))
            .await
            .unwrap();

        let backend2 = backend.clone();
        let publish_task = tokio::spawn(async move {
            backend2
                .publish("blocks", GossipMessage::Text("2".into()))
                .await
                .unwrap();
        });

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!publish_task.is_finished());

        assert_eq!(sub.get().await, Some(GossipMessage::Text("1".into())));
        publish_task.await.unwrap();
        assert_eq!(sub.get().await, Some(GossipMessage::Text("2".into())));
    }
}
