//! Topic validation and subscription management
//!
//! The registry keeps every client's filters in one shared [`PathTrie`],
//! with the client identity as the trie member, alongside a per-client map
//! of granted QoS. Both live behind a single read-write lock so matching
//! never observes a filter without its grant.

pub mod validation;

pub use validation::{is_wild, validate_subscription, validate_topic_name, MAX_TOPIC_LENGTH};

use ahash::AHashMap;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::protocol::QoS;
use crate::tree::{PathTrie, TreeError, TrieLimits};

/// Effect of a subscribe call on the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionChange {
    /// The (client, filter) pair did not exist before
    Created,
    /// The pair existed with a different QoS, which has been overwritten
    QosChanged { previous: QoS },
    /// The pair existed with the same QoS
    Unchanged,
}

impl SubscriptionChange {
    /// Whether this was a net-new subscription
    pub fn is_new(&self) -> bool {
        matches!(self, SubscriptionChange::Created)
    }
}

#[derive(Debug, Default)]
struct Inner {
    trie: PathTrie<Arc<str>>,
    grants: AHashMap<Arc<str>, AHashMap<String, QoS>>,
}

/// Thread-safe subscription registry
#[derive(Debug)]
pub struct SubscriptionRegistry {
    inner: RwLock<Inner>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::with_limits(TrieLimits::default())
    }

    pub fn with_limits(limits: TrieLimits) -> Self {
        Self {
            inner: RwLock::new(Inner {
                trie: PathTrie::with_limits(limits),
                grants: AHashMap::new(),
            }),
        }
    }

    /// Add or update a subscription
    ///
    /// Trie limits are checked before any state changes, so an error leaves
    /// the registry untouched.
    pub fn subscribe(
        &self,
        client_id: &Arc<str>,
        filter: &str,
        qos: QoS,
    ) -> Result<SubscriptionChange, TreeError> {
        let mut inner = self.inner.write();

        let previous = inner
            .grants
            .get(client_id)
            .and_then(|filters| filters.get(filter))
            .copied();

        let change = match previous {
            Some(p) if p == qos => return Ok(SubscriptionChange::Unchanged),
            Some(p) => SubscriptionChange::QosChanged { previous: p },
            None => {
                inner.trie.add_path(filter, [client_id.clone()])?;
                SubscriptionChange::Created
            }
        };

        inner
            .grants
            .entry(client_id.clone())
            .or_default()
            .insert(filter.to_string(), qos);
        Ok(change)
    }

    /// Remove a subscription, returning whether it existed
    pub fn unsubscribe(&self, client_id: &str, filter: &str) -> bool {
        let mut inner = self.inner.write();
        let Inner { trie, grants } = &mut *inner;

        let Some(filters) = grants.get_mut(client_id) else {
            return false;
        };
        if filters.remove(filter).is_none() {
            return false;
        }
        if filters.is_empty() {
            grants.remove(client_id);
        }
        trie.remove_member(filter, &Arc::from(client_id));
        true
    }

    /// Remove every subscription held by a client, returning how many
    pub fn clear(&self, client_id: &str) -> usize {
        let mut inner = self.inner.write();
        let Inner { trie, grants } = &mut *inner;

        let Some((member, filters)) = grants.remove_entry(client_id) else {
            return 0;
        };
        for filter in filters.keys() {
            trie.remove_member(filter, &member);
        }
        filters.len()
    }

    /// Remove every subscription
    pub fn clear_all(&self) {
        let mut inner = self.inner.write();
        inner.trie.clear();
        inner.grants.clear();
    }

    /// Clients holding at least one filter that matches a concrete topic
    pub fn matches(&self, topic: &str) -> BTreeSet<Arc<str>> {
        self.inner.read().trie.search_members(topic)
    }

    /// QoS granted for an exact (client, filter) pair
    pub fn qos(&self, client_id: &str, filter: &str) -> Option<QoS> {
        self.inner
            .read()
            .grants
            .get(client_id)
            .and_then(|filters| filters.get(filter))
            .copied()
    }

    /// Highest QoS granted among a client's filters matching a concrete topic
    pub fn matching_qos(&self, client_id: &str, topic: &str) -> Option<QoS> {
        let inner = self.inner.read();
        let filters = inner.grants.get(client_id)?;
        filters
            .iter()
            .filter(|(filter, _)| inner.trie.filter_matches(filter, topic))
            .map(|(_, qos)| *qos)
            .max()
    }

    /// A client's filters and their grants, ordered by filter
    pub fn subscriptions(&self, client_id: &str) -> Vec<(String, QoS)> {
        let inner = self.inner.read();
        let mut subs: Vec<(String, QoS)> = inner
            .grants
            .get(client_id)
            .map(|filters| filters.iter().map(|(f, q)| (f.clone(), *q)).collect())
            .unwrap_or_default();
        subs.sort();
        subs
    }

    /// Total number of (client, filter) pairs
    pub fn subscription_count(&self) -> usize {
        self.inner.read().grants.values().map(|f| f.len()).sum()
    }

    /// Number of distinct filters with at least one subscriber
    pub fn filter_count(&self) -> usize {
        self.inner.read().trie.count_distinct_paths(true)
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[test]
    fn test_subscribe_idempotent() {
        let registry = SubscriptionRegistry::new();
        let c = id("c");
        assert_eq!(
            registry.subscribe(&c, "a/b", QoS::AtLeastOnce).unwrap(),
            SubscriptionChange::Created
        );
        assert_eq!(
            registry.subscribe(&c, "a/b", QoS::AtLeastOnce).unwrap(),
            SubscriptionChange::Unchanged
        );
        assert_eq!(
            registry.subscribe(&c, "a/b", QoS::ExactlyOnce).unwrap(),
            SubscriptionChange::QosChanged {
                previous: QoS::AtLeastOnce
            }
        );
        assert_eq!(registry.qos("c", "a/b"), Some(QoS::ExactlyOnce));
        assert_eq!(registry.subscription_count(), 1);
        assert_eq!(registry.matches("a/b").len(), 1);
    }

    #[test]
    fn test_matches_wildcards() {
        let registry = SubscriptionRegistry::new();
        registry.subscribe(&id("exact"), "home/kitchen/temp", QoS::AtMostOnce).unwrap();
        registry.subscribe(&id("single"), "home/+/temp", QoS::AtMostOnce).unwrap();
        registry.subscribe(&id("multi"), "home/#", QoS::AtMostOnce).unwrap();
        registry.subscribe(&id("other"), "office/#", QoS::AtMostOnce).unwrap();

        let found: Vec<String> = registry
            .matches("home/kitchen/temp")
            .iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(found, vec!["exact", "multi", "single"]);
        assert!(registry.matches("garden").is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let registry = SubscriptionRegistry::new();
        let a = id("a");
        let b = id("b");
        registry.subscribe(&a, "t/1", QoS::AtMostOnce).unwrap();
        registry.subscribe(&b, "t/1", QoS::AtMostOnce).unwrap();

        assert!(registry.unsubscribe("a", "t/1"));
        assert!(!registry.unsubscribe("a", "t/1"));
        assert!(!registry.unsubscribe("z", "t/1"));

        let found = registry.matches("t/1");
        assert_eq!(found.len(), 1);
        assert!(found.contains("b"));
        assert_eq!(registry.filter_count(), 1);

        assert!(registry.unsubscribe("b", "t/1"));
        assert_eq!(registry.filter_count(), 0);
    }

    #[test]
    fn test_clear_client() {
        let registry = SubscriptionRegistry::new();
        let a = id("a");
        registry.subscribe(&a, "x/1", QoS::AtMostOnce).unwrap();
        registry.subscribe(&a, "x/+", QoS::AtLeastOnce).unwrap();
        registry.subscribe(&id("b"), "x/+", QoS::AtLeastOnce).unwrap();

        assert_eq!(registry.clear("a"), 2);
        assert_eq!(registry.clear("a"), 0);
        assert!(registry.subscriptions("a").is_empty());
        assert_eq!(registry.subscription_count(), 1);
        assert!(!registry.matches("x/1").contains("a"));
    }

    #[test]
    fn test_matching_qos_takes_highest_grant() {
        let registry = SubscriptionRegistry::new();
        let c = id("c");
        registry.subscribe(&c, "s/+", QoS::AtMostOnce).unwrap();
        registry.subscribe(&c, "s/#", QoS::ExactlyOnce).unwrap();
        registry.subscribe(&c, "other", QoS::AtLeastOnce).unwrap();

        assert_eq!(registry.matching_qos("c", "s/1"), Some(QoS::ExactlyOnce));
        assert_eq!(registry.matching_qos("c", "nothing"), None);
        assert_eq!(registry.matching_qos("unknown", "s/1"), None);
    }

    #[test]
    fn test_subscriptions_listing() {
        let registry = SubscriptionRegistry::new();
        let c = id("c");
        registry.subscribe(&c, "b", QoS::AtLeastOnce).unwrap();
        registry.subscribe(&c, "a", QoS::AtMostOnce).unwrap();
        assert_eq!(
            registry.subscriptions("c"),
            vec![
                ("a".to_string(), QoS::AtMostOnce),
                ("b".to_string(), QoS::AtLeastOnce)
            ]
        );
    }

    #[test]
    fn test_limit_failure_leaves_registry_unchanged() {
        let registry = SubscriptionRegistry::with_limits(TrieLimits {
            max_path_segments: 3,
            ..TrieLimits::default()
        });
        let c = id("c");
        let err = registry.subscribe(&c, "a/b/c/d", QoS::AtMostOnce).unwrap_err();
        assert!(err.is_limit_exceeded());
        assert_eq!(registry.subscription_count(), 0);
        assert!(registry.qos("c", "a/b/c/d").is_none());
    }
}
