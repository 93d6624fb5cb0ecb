//! VibeSN - MQTT-SN gateway core
//!
//! The state a gateway keeps between its devices and an upstream MQTT
//! broker: a bounded path trie for topic matching, the per-client
//! subscription registry built on it, and the session lifecycle manager
//! that drives connect, sleep, subscribe and keepalive handling and fans
//! backend messages out onto session queues.

pub mod backend;
pub mod config;
pub mod error;
pub mod hooks;
pub mod logging;
pub mod protocol;
pub mod queue;
pub mod registry;
pub mod session;
pub mod topic;
pub mod tree;

pub use backend::{BackendConnector, BackendError};
pub use config::Config;
pub use error::GatewayError;
pub use hooks::{CompositeHooks, DefaultHooks, Hooks};
pub use protocol::{Outcome, QoS, ReturnCode, Status};
pub use queue::{MemoryMessageQueue, MessageQueue, PayloadStore};
pub use session::{
    spawn_session_monitor, ClientState, GatewayOptions, SessionHandle, SessionService,
};
pub use topic::SubscriptionRegistry;
pub use tree::{PathTrie, RadixTree, TreeError, TrieLimits};
