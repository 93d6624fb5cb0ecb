//! Topic id registry
//!
//! Predefined ids are shared by every session and come from configuration.
//! Normal ids are allocated per session on REGISTER (or on SUBSCRIBE to a
//! non-wildcard topic) and live until the session's registrations are
//! cleared.

use ahash::AHashMap;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::protocol::TopicInfo;

/// Topic registry errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicRegistryError {
    /// Every normal topic id is already allocated for this session
    IdsExhausted { client_id: String },
}

impl fmt::Display for TopicRegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdsExhausted { client_id } => {
                write!(f, "no topic ids left for {}", client_id)
            }
        }
    }
}

impl std::error::Error for TopicRegistryError {}

/// Topic id collaborator
pub trait TopicRegistry: Send + Sync {
    /// Topic path for a predefined id
    fn lookup_predefined(&self, client_id: &str, topic_id: u16) -> Option<String>;

    /// Existing registration (predefined or normal) for a topic path
    fn lookup(&self, client_id: &str, topic: &str) -> Option<TopicInfo>;

    /// Topic path for a normal id registered by this session
    fn topic_path(&self, client_id: &str, topic_id: u16) -> Option<String>;

    /// Register a topic path, returning the existing registration if any
    fn register(&self, client_id: &str, topic: &str) -> Result<TopicInfo, TopicRegistryError>;

    /// Drop every normal registration held by a session
    fn clear(&self, client_id: &str);
}

impl<T: TopicRegistry + ?Sized> TopicRegistry for Arc<T> {
    fn lookup_predefined(&self, client_id: &str, topic_id: u16) -> Option<String> {
        (**self).lookup_predefined(client_id, topic_id)
    }

    fn lookup(&self, client_id: &str, topic: &str) -> Option<TopicInfo> {
        (**self).lookup(client_id, topic)
    }

    fn topic_path(&self, client_id: &str, topic_id: u16) -> Option<String> {
        (**self).topic_path(client_id, topic_id)
    }

    fn register(&self, client_id: &str, topic: &str) -> Result<TopicInfo, TopicRegistryError> {
        (**self).register(client_id, topic)
    }

    fn clear(&self, client_id: &str) {
        (**self).clear(client_id)
    }
}

#[derive(Debug, Default)]
struct SessionTopics {
    by_topic: AHashMap<String, u16>,
    by_id: AHashMap<u16, String>,
    last_id: u16,
}

impl SessionTopics {
    fn allocate(&mut self) -> Option<u16> {
        // Ids wrap around and skip the ones still in use; 0 is reserved
        for _ in 0..u16::MAX {
            self.last_id = self.last_id.checked_add(1).unwrap_or(1);
            if !self.by_id.contains_key(&self.last_id) {
                return Some(self.last_id);
            }
        }
        None
    }
}

/// In-memory topic registry
#[derive(Debug, Default)]
pub struct MemoryTopicRegistry {
    predefined: AHashMap<u16, String>,
    predefined_by_topic: AHashMap<String, u16>,
    sessions: DashMap<Arc<str>, SessionTopics>,
}

impl MemoryTopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with predefined topic ids
    pub fn with_predefined<I, S>(predefined: I) -> Self
    where
        I: IntoIterator<Item = (u16, S)>,
        S: Into<String>,
    {
        let mut registry = Self::new();
        for (id, topic) in predefined {
            let topic = topic.into();
            registry.predefined_by_topic.insert(topic.clone(), id);
            registry.predefined.insert(id, topic);
        }
        registry
    }

    /// Number of normal registrations held by a session
    pub fn registration_count(&self, client_id: &str) -> usize {
        self.sessions
            .get(client_id)
            .map(|t| t.by_topic.len())
            .unwrap_or(0)
    }
}

impl TopicRegistry for MemoryTopicRegistry {
    fn lookup_predefined(&self, _client_id: &str, topic_id: u16) -> Option<String> {
        self.predefined.get(&topic_id).cloned()
    }

    fn lookup(&self, client_id: &str, topic: &str) -> Option<TopicInfo> {
        if let Some(id) = self.predefined_by_topic.get(topic) {
            return Some(TopicInfo::Predefined(*id));
        }
        self.sessions
            .get(client_id)?
            .by_topic
            .get(topic)
            .map(|id| TopicInfo::Normal(*id))
    }

    fn topic_path(&self, client_id: &str, topic_id: u16) -> Option<String> {
        self.sessions.get(client_id)?.by_id.get(&topic_id).cloned()
    }

    fn register(&self, client_id: &str, topic: &str) -> Result<TopicInfo, TopicRegistryError> {
        if let Some(id) = self.predefined_by_topic.get(topic) {
            return Ok(TopicInfo::Predefined(*id));
        }

        let mut topics = self.sessions.entry(Arc::from(client_id)).or_default();
        if let Some(id) = topics.by_topic.get(topic) {
            return Ok(TopicInfo::Normal(*id));
        }
        let id = topics
            .allocate()
            .ok_or_else(|| TopicRegistryError::IdsExhausted {
                client_id: client_id.to_string(),
            })?;
        topics.by_topic.insert(topic.to_string(), id);
        topics.by_id.insert(id, topic.to_string());
        Ok(TopicInfo::Normal(id))
    }

    fn clear(&self, client_id: &str) {
        self.sessions.remove(client_id);
    }
}
