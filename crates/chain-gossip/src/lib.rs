//! Topic pub/sub broker with mandatory back-pressure: bounded
//! `tokio::sync::mpsc` per subscription with a blocking `send().await`,
//! since dropping a published message silently is never acceptable here.

mod in_process;
mod message;
pub mod metrics;
mod tcp;

pub use in_process::InProcessBackend;
pub use message::GossipMessage;
pub use tcp::TcpBroadcastBackend;

use async_trait::async_trait;
use chain_types::CoreError;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// A live subscription to one topic.
pub struct Subscription {
    topic: String,
    pub(crate) receiver: mpsc::Receiver<GossipMessage>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(
        topic: String,
        receiver: mpsc::Receiver<GossipMessage>,
        on_close: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            topic,
            receiver,
            on_close: Some(Box::new(on_close)),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Blocks until a message is available or the subscription is closed.
    pub async fn get(&mut self) -> Option<GossipMessage> {
        self.receiver.recv().await
    }

    /// Detaches from the topic. Idempotent.
    pub fn close(&mut self) {
        if let Some(cb) = self.on_close.take() {
            cb();
        }
        self.receiver.close();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pluggable transport behind the broker.
#[async_trait]
pub trait GossipBackend: Send + Sync {
    async fn start(&self) -> Result<(), CoreError> {
        Ok(())
    }

    /// Enqueues `message` into every current subscriber of `topic`,
    /// blocking on any subscriber whose queue is full (back-pressure).
    async fn publish(&self, topic: &str, message: GossipMessage) -> Result<(), CoreError>;

    async fn subscribe(&self, topic: &str, max_queue_size: usize) -> Result<Subscription, CoreError>;

    async fn shutdown(&self) -> Result<(), CoreError>;
}

/// Front door for publishers and subscribers; owns the currently active
/// back-end and allows it to be swapped live.
pub struct GossipBroker {
    backend: Mutex<Arc<dyn GossipBackend>>,
    started: Mutex<bool>,
}

impl GossipBroker {
    pub fn new(backend: Arc<dyn GossipBackend>) -> Self {
        Self {
            backend: Mutex::new(backend),
            started: Mutex::new(false),
        }
    }

    async fn ensure_started(&self) -> Result<Arc<dyn GossipBackend>, CoreError> {
        let backend = self.backend.lock().await.clone();
        let mut started = self.started.lock().await;
        if !*started {
            backend.start().await?;
            *started = true;
        }
        Ok(backend)
    }

    pub async fn publish(&self, topic: &str, message: impl Into<GossipMessage>) -> Result<(), CoreError> {
        let backend = self.ensure_started().await?;
        backend.publish(topic, message.into()).await
    }

    pub async fn subscribe(&self, topic: &str, max_queue_size: usize) -> Result<Subscription, CoreError> {
        let backend = self.ensure_started().await?;
        backend.subscribe(topic, max_queue_size).await
    }

    /// Atomically swaps the active back-end: starts `new`, swaps the
    /// pointer, then shuts down the previous one. Existing subscriptions
    /// are not migrated.
    pub async fn set_backend(&self, new_backend: Arc<dyn GossipBackend>) -> Result<(), CoreError> {
        new_backend.start().await?;
        let previous = {
            let mut guard = self.backend.lock().await;
            std::mem::replace(&mut *guard, new_backend)
        };
        *self.started.lock().await = true;
        previous.shutdown().await
    }

    pub async fn shutdown(&self) -> Result<(), CoreError> {
        let backend = self.backend.lock().await.clone();
        backend.shutdown().await?;
        *self.started.lock().await = false;
        metrics::reset_all_subscribers();
        Ok(())
    }
}

impl Default for GossipBroker {
    fn default() -> Self {
        Self::new(Arc::new(InProcessBackend::new()))
    }
}
