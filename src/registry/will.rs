//! Will message registry

use dashmap::DashMap;
use std::sync::Arc;

use crate::protocol::WillData;

/// Will message collaborator
pub trait WillRegistry: Send + Sync {
    fn has_will_message(&self, client_id: &str) -> bool;

    fn will_message(&self, client_id: &str) -> Option<WillData>;

    fn set_will_message(&self, client_id: &str, will: WillData);

    fn clear(&self, client_id: &str);
}

impl<T: WillRegistry + ?Sized> WillRegistry for Arc<T> {
    fn has_will_message(&self, client_id: &str) -> bool {
        (**self).has_will_message(client_id)
    }

    fn will_message(&self, client_id: &str) -> Option<WillData> {
        (**self).will_message(client_id)
    }

    fn set_will_message(&self, client_id: &str, will: WillData) {
        (**self).set_will_message(client_id, will)
    }

    fn clear(&self, client_id: &str) {
        (**self).clear(client_id)
    }
}

/// In-memory will registry
#[derive(Debug, Default)]
pub struct MemoryWillRegistry {
    wills: DashMap<Arc<str>, WillData>,
}

impl MemoryWillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.wills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wills.is_empty()
    }
}

impl WillRegistry for MemoryWillRegistry {
    fn has_will_message(&self, client_id: &str) -> bool {
        self.wills.contains_key(client_id)
    }

    fn will_message(&self, client_id: &str) -> Option<WillData> {
        self.wills.get(client_id).map(|w| w.clone())
    }

    fn set_will_message(&self, client_id: &str, will: WillData) {
        self.wills.insert(Arc::from(client_id), will);
    }

    fn clear(&self, client_id: &str) {
        self.wills.remove(client_id);
    }
}
