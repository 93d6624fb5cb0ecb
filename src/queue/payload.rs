//! Shared payload store
//!
//! A payload fanned out to many sessions is admitted once and referenced by
//! id from each queued message. Each entry carries an atomic reference
//! count; the entry is evicted when the count reaches zero or when its
//! expiry passes, whichever comes first.

use bytes::Bytes;
use dashmap::DashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tracing::debug;

/// Identifier of a stored payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MessageId(u64);

impl MessageId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How long a stored payload lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    /// Evicted after `references` releases or at `expires_at`
    Shared {
        references: usize,
        expires_at: Option<Instant>,
    },
    /// Evicted after the first release
    SingleUse,
}

/// Payload store errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store is at capacity even after evicting expired entries
    Full { max_entries: usize },
    /// Shared retention with zero references
    NoReferences,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full { max_entries } => {
                write!(f, "payload store full ({} entries)", max_entries)
            }
            Self::NoReferences => write!(f, "shared payload needs at least one reference"),
        }
    }
}

impl std::error::Error for StoreError {}

#[derive(Debug)]
struct StoredPayload {
    payload: Bytes,
    references: AtomicUsize,
    expires_at: Option<Instant>,
}

impl StoredPayload {
    fn is_expired_at(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Reference-counted payload arena
#[derive(Debug)]
pub struct PayloadStore {
    entries: DashMap<MessageId, StoredPayload>,
    next_id: AtomicU64,
    max_entries: usize,
}

impl PayloadStore {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicU64::new(1),
            max_entries,
        }
    }

    /// Admit a payload, evicting expired entries first if the store is full
    pub fn add(&self, payload: Bytes, retention: Retention) -> Result<MessageId, StoreError> {
        let (references, expires_at) = match retention {
            Retention::Shared { references: 0, .. } => return Err(StoreError::NoReferences),
            Retention::Shared {
                references,
                expires_at,
            } => (references, expires_at),
            Retention::SingleUse => (1, None),
        };

        if self.entries.len() >= self.max_entries {
            self.evict_expired(Instant::now());
            if self.entries.len() >= self.max_entries {
                return Err(StoreError::Full {
                    max_entries: self.max_entries,
                });
            }
        }

        let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.insert(
            id,
            StoredPayload {
                payload,
                references: AtomicUsize::new(references),
                expires_at,
            },
        );
        Ok(id)
    }

    /// Payload bytes without consuming a reference
    pub fn read(&self, id: MessageId) -> Option<Bytes> {
        self.entries.get(&id).map(|e| e.payload.clone())
    }

    /// Consume one reference, evicting the entry when none remain
    ///
    /// Returns the payload, or `None` when the entry is already gone.
    pub fn release(&self, id: MessageId) -> Option<Bytes> {
        let removed = self.entries.remove_if(&id, |_, entry| {
            // Decrement and test under the shard guard
            entry.references.fetch_sub(1, Ordering::AcqRel) <= 1
        });
        match removed {
            Some((_, entry)) => Some(entry.payload),
            None => self.read(id),
        }
    }

    /// Outstanding references for an entry
    pub fn reference_count(&self, id: MessageId) -> Option<usize> {
        self.entries
            .get(&id)
            .map(|e| e.references.load(Ordering::Acquire))
    }

    /// Drop every entry whose expiry has passed, returning how many
    pub fn evict_expired(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired_at(now));
        let evicted = before.saturating_sub(self.entries.len());
        if evicted > 0 {
            debug!("Evicted {} expired payloads", evicted);
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn shared(references: usize) -> Retention {
        Retention::Shared {
            references,
            expires_at: None,
        }
    }

    #[test]
    fn test_single_use_evicted_on_release() {
        let store = PayloadStore::new(10);
        let id = store.add(Bytes::from_static(b"hello"), Retention::SingleUse).unwrap();
        assert_eq!(store.reference_count(id), Some(1));
        assert_eq!(store.release(id), Some(Bytes::from_static(b"hello")));
        assert!(store.is_empty());
        assert_eq!(store.release(id), None);
    }

    #[test]
    fn test_shared_counts_down() {
        let store = PayloadStore::new(10);
        let id = store.add(Bytes::from_static(b"x"), shared(3)).unwrap();
        assert!(store.release(id).is_some());
        assert!(store.release(id).is_some());
        assert_eq!(store.reference_count(id), Some(1));
        assert!(store.release(id).is_some());
        assert_eq!(store.reference_count(id), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_zero_references_rejected() {
        let store = PayloadStore::new(10);
        assert_eq!(
            store.add(Bytes::new(), shared(0)),
            Err(StoreError::NoReferences)
        );
    }

    #[test]
    fn test_expiry_eviction() {
        let store = PayloadStore::new(10);
        let now = Instant::now();
        let soon = store
            .add(
                Bytes::from_static(b"a"),
                Retention::Shared {
                    references: 2,
                    expires_at: Some(now + Duration::from_secs(5)),
                },
            )
            .unwrap();
        let later = store.add(Bytes::from_static(b"b"), shared(2)).unwrap();

        assert_eq!(store.evict_expired(now), 0);
        assert_eq!(store.evict_expired(now + Duration::from_secs(6)), 1);
        assert!(store.read(soon).is_none());
        assert!(store.read(later).is_some());
    }

    #[test]
    fn test_full_store() {
        let store = PayloadStore::new(2);
        store.add(Bytes::new(), Retention::SingleUse).unwrap();
        store.add(Bytes::new(), Retention::SingleUse).unwrap();
        assert_eq!(
            store.add(Bytes::new(), Retention::SingleUse),
            Err(StoreError::Full { max_entries: 2 })
        );
    }

    #[test]
    fn test_full_store_reclaims_expired() {
        let store = PayloadStore::new(1);
        store
            .add(
                Bytes::new(),
                Retention::Shared {
                    references: 1,
                    expires_at: Some(Instant::now()),
                },
            )
            .unwrap();
        assert!(store.add(Bytes::new(), Retention::SingleUse).is_ok());
        assert_eq!(store.len(), 1);
    }
}
