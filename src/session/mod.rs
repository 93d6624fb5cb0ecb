//! MQTT-SN Session Management
//!
//! Handles per-device session state and its lifecycle:
//!
//! ```text
//! Pending -> Connected -> Asleep -> Awake -> Connected
//!                      -> Disconnected -> (removed after expiry)
//! any -> Lost (transport failure)
//! ```
//!
//! Sessions are owned by [`SessionService`] and only mutated while holding
//! their mutex.

mod monitor;
mod options;
mod service;


pub use monitor::spawn_session_monitor;
pub use options::GatewayOptions;
pub use service::{FanOutReport, SessionService, SessionServiceBuilder, SweepReport};

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::protocol::SESSION_EXPIRY_INFINITE;

/// Shared handle to a session
pub type SessionHandle = Arc<Mutex<Session>>;

/// Client state as seen by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientState {
    /// Created, CONNECT not yet accepted
    Pending,
    /// Connected and active
    Connected,
    /// Sleeping; messages are queued until it wakes
    Asleep,
    /// Woken from sleep to collect queued messages
    Awake,
    /// Disconnected, kept until the session expiry passes
    Disconnected,
    /// Transport failed without a DISCONNECT
    Lost,
}

impl ClientState {
    /// States subject to keepalive monitoring
    pub fn is_monitored(&self) -> bool {
        matches!(self, ClientState::Connected | ClientState::Asleep)
    }

    /// States subject to session expiry
    pub fn is_inactive(&self) -> bool {
        matches!(self, ClientState::Disconnected | ClientState::Lost)
    }
}

/// In-flight message state collaborator
pub trait MessageStateService: Send + Sync {
    /// Drop in-flight and protocol message state for a session
    fn clear(&self, client_id: &str);
}

impl<T: MessageStateService + ?Sized> MessageStateService for Arc<T> {
    fn clear(&self, client_id: &str) {
        (**self).clear(client_id)
    }
}

/// Device session
#[derive(Debug)]
pub struct Session {
    pub(crate) client_id: Arc<str>,
    pub(crate) state: ClientState,
    /// Keepalive in seconds (sleep duration while asleep), 0 = unmonitored
    pub(crate) keep_alive: u32,
    /// Seconds a disconnected session is retained
    pub(crate) session_expiry_interval: u32,
    pub(crate) max_packet_size: u32,
    pub(crate) last_seen: Instant,
}

impl Session {
    pub fn new(
        client_id: Arc<str>,
        session_expiry_interval: u32,
        max_packet_size: u32,
        now: Instant,
    ) -> Self {
        Self {
            client_id,
            state: ClientState::Pending,
            keep_alive: 0,
            session_expiry_interval,
            max_packet_size,
            last_seen: now,
        }
    }

    pub fn client_id(&self) -> &Arc<str> {
        &self.client_id
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn keep_alive(&self) -> u32 {
        self.keep_alive
    }

    pub fn session_expiry_interval(&self) -> u32 {
        self.session_expiry_interval
    }

    pub fn max_packet_size(&self) -> u32 {
        self.max_packet_size
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    pub(crate) fn touch_at(&mut self, now: Instant) {
        self.last_seen = now;
    }

    /// Whether 1.5 keepalive periods have passed without traffic
    pub fn is_keep_alive_expired_at(&self, now: Instant) -> bool {
        if !self.state.is_monitored() || self.keep_alive == 0 {
            return false;
        }
        let grace = Duration::from_millis(u64::from(self.keep_alive) * 1500);
        self.last_seen + grace < now
    }

    /// Whether an inactive session has outlived its expiry interval
    pub fn is_expired_at(&self, now: Instant) -> bool {
        if !self.state.is_inactive() || self.session_expiry_interval == SESSION_EXPIRY_INFINITE {
            return false;
        }
        let expiry = Duration::from_secs(u64::from(self.session_expiry_interval));
        self.last_seen + expiry < now
    }
}
