//! Runtime options for the session service

use std::time::Duration;

use crate::config::Config;
use crate::protocol::SESSION_EXPIRY_INFINITE;
use crate::topic::MAX_TOPIC_LENGTH;
use crate::tree::TrieLimits;

/// Options derived from configuration
#[derive(Debug, Clone)]
pub struct GatewayOptions {
    /// Maximum sessions held at once
    pub max_connected_clients: usize,
    /// Maximum queued messages per session
    pub max_queue_size: usize,
    /// Maximum payloads held in the shared payload store
    pub max_stored_payloads: usize,
    /// Whether going to sleep drops topic registrations
    pub sleep_clears_registrations: bool,
    /// Maximum topic length in bytes
    pub max_topic_length: usize,
    /// Session expiry applied when CONNECT carries none
    pub default_session_expiry: u32,
    /// Maximum packet size applied when CONNECT carries none
    pub default_max_packet_size: u32,
    /// Lifetime of payloads shared between several sessions
    pub payload_expiry: Duration,
    /// Maximum results of a client id prefix search
    pub prefix_search_limit: usize,
    /// Interval between session sweeps
    pub monitor_interval: Duration,
    /// Subscription trie limits
    pub trie_limits: TrieLimits,
    /// Predefined topic ids
    pub predefined_topics: Vec<(u16, String)>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            max_connected_clients: 100,
            max_queue_size: 25,
            max_stored_payloads: 100_000,
            sleep_clears_registrations: false,
            max_topic_length: MAX_TOPIC_LENGTH,
            default_session_expiry: SESSION_EXPIRY_INFINITE,
            default_max_packet_size: 65535,
            payload_expiry: Duration::from_secs(365 * 24 * 60 * 60),
            prefix_search_limit: 100,
            monitor_interval: Duration::from_secs(30),
            trie_limits: TrieLimits::default(),
            predefined_topics: Vec::new(),
        }
    }
}

impl GatewayOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_connected_clients: config.gateway.max_connected_clients(),
            max_queue_size: config.max_queue_size(),
            max_stored_payloads: config.queue.max_stored_payloads,
            sleep_clears_registrations: config.gateway.sleep_clears_registrations,
            max_topic_length: config.gateway.max_topic_length,
            default_session_expiry: config.session.default_session_expiry,
            default_max_packet_size: config.session.default_max_packet_size,
            payload_expiry: config.session.payload_expiry,
            prefix_search_limit: config.session.prefix_search_limit,
            monitor_interval: config.session.monitor_interval,
            trie_limits: config.tree.limits(),
            predefined_topics: config
                .topics
                .predefined
                .iter()
                .map(|p| (p.id, p.topic.clone()))
                .collect(),
        }
    }
}
