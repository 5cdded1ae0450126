//! External, network-wide back-end: newline-delimited JSON fanned out over
//! TCP to every connected peer, so messages cross process boundaries
//! without depending on an external broker.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chain_types::CoreError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Mutex};

use crate::{metrics, GossipBackend, GossipMessage, Subscription};

#[derive(Serialize, Deserialize)]
struct Envelope {
    topic: String,
    message: GossipMessage,
}

pub(crate) struct Subscriber {
    id: u64,
    topic: String,
    sender: mpsc::Sender<GossipMessage>,
}

/// A TCP-based broadcast backend. One node runs the listener; peers (and
/// this node's own local subscribers) connect as plain TCP clients and
/// receive every published envelope, filtering by topic.
pub struct TcpBroadcastBackend {
    listener_addr: std::net::SocketAddr,
    connections: Arc<Mutex<Vec<OwnedWriteHalf>>>,
    subscribers: Arc<Mutex<HashMap<u64, Subscriber>>>,
    next_id: AtomicU64,
    started: Mutex<bool>,
}

impl TcpBroadcastBackend {
    /// Binds a listener on `bind_addr` (e.g. `"127.0.0.1:0"` for an
    /// ephemeral port) and returns a backend ready to `start()`.
    pub async fn bind(bind_addr: &str) -> Result<Self, CoreError> {
        let listener = TcpListener::bind(bind_addr)
            .await
            .map_err(|e| CoreError::Internal(format!("gossip tcp bind failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| CoreError::Internal(e.to_string()))?;

        let connections: Arc<Mutex<Vec<OwnedWriteHalf>>> = Arc::new(Mutex::new(Vec::new()));
        let subscribers: Arc<Mutex<HashMap<u64, Subscriber>>> = Arc::new(Mutex::new(HashMap::new()));

        let accept_connections = connections.clone();
        let accept_subscribers = subscribers.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let (read_half, write_half) = stream.into_split();
                accept_connections.lock().await.push(write_half);
                tokio::spawn(pump_remote_connection(read_half, accept_subscribers.clone()));
            }
        });

        Ok(Self {
            listener_addr: addr,
            connections,
            subscribers,
            next_id: AtomicU64::new(0),
            started: Mutex::new(false),
        })
    }

    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.listener_addr
    }
}

#[async_trait]
impl GossipBackend for TcpBroadcastBackend {
    async fn start(&self) -> Result<(), CoreError> {
        *self.started.lock().await = true;
        Ok(())
    }

    async fn publish(&self, topic: &str, message: GossipMessage) -> Result<(), CoreError> {
        // Deliver to local subscribers directly (avoids a loopback
        // round-trip for the common single-node case).
        let locals: Vec<mpsc::Sender<GossipMessage>> = {
            let subs = self.subscribers.lock().await;
            subs.values()
                .filter(|s| s.topic == topic)
                .map(|s| s.sender.clone())
                .collect()
        };
        for sender in &locals {
            if sender.send(message.clone()).await.is_ok() {
                metrics::set_queue_size(topic, sender.capacity());
            }
        }

        let envelope = Envelope {
            topic: topic.to_string(),
            message,
        };
        let line = serde_json::to_string(&envelope).map_err(CoreError::from)? + "\n";

        let mut connections = self.connections.lock().await;
        let mut dead = Vec::new();
        for (idx, conn) in connections.iter_mut().enumerate() {
            if conn.write_all(line.as_bytes()).await.is_err() {
                dead.push(idx);
            }
        }
        for idx in dead.into_iter().rev() {
            connections.remove(idx);
        }

        metrics::record_publication(topic);
        Ok(())
    }

    async fn subscribe(&self, topic: &str, max_queue_size: usize) -> Result<Subscription, CoreError> {
        let (tx, rx) = mpsc::channel(max_queue_size.max(1));
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        {
            let mut subs = self.subscribers.lock().await;
            subs.insert(
                id,
                Subscriber {
                    id,
                    topic: topic.to_string(),
                    sender: tx,
                },
            );
            let count = subs.values().filter(|s| s.topic == topic).count();
            metrics::subscriber_joined(topic, count);
        }

        let subscribers_for_close = self.subscribers.clone();
        let topic_for_close = topic.to_string();
        Ok(Subscription::new(topic.to_string(), rx, move || {
            let subscribers = subscribers_for_close;
            let topic = topic_for_close;
            tokio::spawn(async move {
                let mut subs = subscribers.lock().await;
                subs.remove(&id);
                let remaining = subs.values().filter(|s| s.topic == topic).count();
                metrics::subscriber_left(&topic, remaining);
            });
        }))
    }

    async fn shutdown(&self) -> Result<(), CoreError> {
        self.connections.lock().await.clear();
        self.subscribers.lock().await.clear();
        *self.started.lock().await = false;
        Ok(())
    }
}

/// Reads NDJSON envelopes from a remote peer connection and republishes
/// them to this process's local subscribers — the other half of the
/// fan-out that [`TcpBroadcastBackend::publish`] writes into.
pub(crate) async fn pump_remote_connection(
    stream: OwnedReadHalf,
    subscribers: Arc<Mutex<HashMap<u64, Subscriber>>>,
) -> Result<(), CoreError> {
    let mut reader = BufReader::new(stream).lines();
    while let Some(line) = reader
        .next_line()
        .await
        .map_err(|e| CoreError::Internal(e.to_string()))?
    {
        let envelope: Envelope = serde_json::from_str(&line).map_err(CoreError::from)?;
        let locals: Vec<(u64, mpsc::Sender<GossipMessage>)> = {
            let subs = subscribers.lock().await;
            subs.values()
                .filter(|s| s.topic == envelope.topic)
                .map(|s| (s.id, s.sender.clone()))
                .collect()
        };
        for (id, sender) in locals {
            if sender.send(envelope.message.clone()).await.is_err() {
                tracing::debug!(subscriber_id = id, "dropping remote gossip message, subscriber gone");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn local_publish_reaches_local_subscriber() {
        let backend = TcpBroadcastBackend::bind("127.0.0.1:0").await.unwrap();
        backend.start().await.unwrap();
        let mut sub = backend.subscribe("blocks", 10).await.unwrap();
        backend
            .publish("blocks", GossipMessage::Json(json!({"height": 1})))
            .await
            .unwrap();
        assert_eq!(
            sub.get().await,
            Some(GossipMessage::Json(json!({"height": 1})))
        );
    }
}
