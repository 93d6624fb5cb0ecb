//! Per-session outbound message queues
//!
//! Queued messages reference payloads admitted once into the shared
//! [`PayloadStore`]. Consuming or clearing a queued message releases its
//! payload reference.

mod payload;

pub use payload::{MessageId, PayloadStore, Retention, StoreError};

use bytes::Bytes;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::protocol::QoS;

/// Message waiting for delivery to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedMessage {
    pub message_id: MessageId,
    pub topic: Arc<str>,
    pub qos: QoS,
    pub retain: bool,
}

impl QueuedMessage {
    /// Take the payload for delivery, releasing this message's reference
    pub fn consume(&self, store: &PayloadStore) -> Option<Bytes> {
        store.release(self.message_id)
    }
}

/// Queue errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Session queue is at its configured maximum
    Full { client_id: String, max: usize },
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full { client_id, max } => {
                write!(f, "queue for {} is full ({} messages)", client_id, max)
            }
        }
    }
}

impl std::error::Error for QueueError {}

/// Outbound queue collaborator
pub trait MessageQueue: Send + Sync {
    /// Append a message to a session's queue
    fn offer(&self, client_id: &str, message: QueuedMessage) -> Result<(), QueueError>;

    /// Take the oldest message from a session's queue
    fn pop(&self, client_id: &str) -> Option<QueuedMessage>;

    /// Drop every queued message for a session, releasing payload references
    fn clear(&self, client_id: &str);

    /// Number of queued messages for a session
    fn queue_size(&self, client_id: &str) -> usize;
}

impl<T: MessageQueue + ?Sized> MessageQueue for Arc<T> {
    fn offer(&self, client_id: &str, message: QueuedMessage) -> Result<(), QueueError> {
        (**self).offer(client_id, message)
    }

    fn pop(&self, client_id: &str) -> Option<QueuedMessage> {
        (**self).pop(client_id)
    }

    fn clear(&self, client_id: &str) {
        (**self).clear(client_id)
    }

    fn queue_size(&self, client_id: &str) -> usize {
        (**self).queue_size(client_id)
    }
}

/// In-memory bounded queue per session
pub struct MemoryMessageQueue {
    queues: DashMap<Arc<str>, VecDeque<QueuedMessage>>,
    max_queue_size: usize,
    store: Arc<PayloadStore>,
}

impl MemoryMessageQueue {
    pub fn new(max_queue_size: usize, store: Arc<PayloadStore>) -> Self {
        Self {
            queues: DashMap::new(),
            max_queue_size,
            store,
        }
    }

    pub fn max_queue_size(&self) -> usize {
        self.max_queue_size
    }
}

impl MessageQueue for MemoryMessageQueue {
    fn offer(&self, client_id: &str, message: QueuedMessage) -> Result<(), QueueError> {
        let mut queue = match self.queues.get_mut(client_id) {
            Some(queue) => queue,
            None => self.queues.entry(Arc::from(client_id)).or_default(),
        };
        if queue.len() >= self.max_queue_size {
            return Err(QueueError::Full {
                client_id: client_id.to_string(),
                max: self.max_queue_size,
            });
        }
        queue.push_back(message);
        Ok(())
    }

    fn pop(&self, client_id: &str) -> Option<QueuedMessage> {
        self.queues.get_mut(client_id)?.pop_front()
    }

    fn clear(&self, client_id: &str) {
        if let Some((_, queue)) = self.queues.remove(client_id) {
            if !queue.is_empty() {
                warn!("Discarding {} queued messages for {}", queue.len(), client_id);
            }
            for message in queue {
                self.store.release(message.message_id);
            }
        }
    }

    fn queue_size(&self, client_id: &str) -> usize {
        self.queues.get(client_id).map(|q| q.len()).unwrap_or(0)
    }
}
