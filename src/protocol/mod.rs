//! MQTT-SN protocol types
//!
//! The value types exchanged between the gateway core and its collaborators.
//! Wire encoding lives elsewhere; these are the decoded forms.

mod return_code;

use std::fmt;

use bytes::Bytes;

pub use return_code::ReturnCode;

/// Session expiry value meaning "never expires"
pub const SESSION_EXPIRY_INFINITE: u32 = u32::MAX;

/// Quality of Service levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum QoS {
    /// At most once delivery
    #[default]
    AtMostOnce = 0,
    /// At least once delivery
    AtLeastOnce = 1,
    /// Exactly once delivery
    ExactlyOnce = 2,
}

impl QoS {
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(QoS::AtMostOnce),
            1 => Some(QoS::AtLeastOnce),
            2 => Some(QoS::ExactlyOnce),
            _ => None,
        }
    }

    /// Returns the minimum of two QoS levels (for delivery downgrade)
    pub fn min(self, other: Self) -> Self {
        if (self as u8) < (other as u8) {
            self
        } else {
            other
        }
    }
}

/// Result status of a gateway or backend operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Error,
    /// Nothing to do; the state already matched the request
    Noop,
}

/// Outcome of a handshake operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub return_code: ReturnCode,
    pub reason: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            status: Status::Ok,
            return_code: ReturnCode::Accepted,
            reason: None,
        }
    }

    pub fn noop() -> Self {
        Self {
            status: Status::Noop,
            return_code: ReturnCode::Accepted,
            reason: None,
        }
    }

    pub fn error(return_code: ReturnCode, reason: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            return_code,
            reason: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{:?} ({}): {}", self.status, self.return_code, reason),
            None => write!(f, "{:?} ({})", self.status, self.return_code),
        }
    }
}

/// Topic as referenced by a device in SUBSCRIBE, UNSUBSCRIBE or REGISTER
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicRef {
    /// Predefined topic id agreed out of band
    Predefined(u16),
    /// Full topic name or filter
    Normal(String),
    /// Two-character short topic name
    Short(String),
}

/// Resolved topic identity returned to the device
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TopicInfo {
    /// Normal topic id registered for the session
    Normal(u16),
    /// Predefined topic id
    Predefined(u16),
    /// Short topic name, carried inline
    Short(String),
    /// Wildcard filter; no id is assigned
    Wild,
}

impl TopicInfo {
    pub fn topic_id(&self) -> Option<u16> {
        match self {
            TopicInfo::Normal(id) | TopicInfo::Predefined(id) => Some(*id),
            TopicInfo::Short(_) | TopicInfo::Wild => None,
        }
    }
}

/// Will message registered at connect time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WillData {
    pub topic: String,
    pub qos: QoS,
    pub retain: bool,
    pub payload: Bytes,
}

impl WillData {
    pub fn new(topic: impl Into<String>, qos: QoS, retain: bool, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            qos,
            retain,
            payload: payload.into(),
        }
    }
}

/// Decoded CONNECT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub clean_session: bool,
    /// Keepalive in seconds, 0 disables keepalive monitoring
    pub keep_alive: u16,
    /// Session expiry in seconds; `None` uses the configured default
    pub session_expiry_interval: Option<u32>,
    /// Largest packet the device accepts; `None` uses the configured default
    pub max_packet_size: Option<u32>,
    pub will: Option<WillData>,
}

impl Default for ConnectRequest {
    fn default() -> Self {
        Self {
            clean_session: true,
            keep_alive: 60,
            session_expiry_interval: None,
            max_packet_size: None,
            will: None,
        }
    }
}

/// Decoded DISCONNECT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisconnectRequest {
    /// Sleep duration in seconds; a positive value puts the session to sleep
    pub duration: Option<u32>,
}

impl DisconnectRequest {
    pub fn sleep(duration: u32) -> Self {
        Self {
            duration: Some(duration),
        }
    }

    pub fn sleep_duration(&self) -> Option<u32> {
        self.duration.filter(|d| *d > 0)
    }
}

/// Decoded SUBSCRIBE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeRequest {
    pub topic: TopicRef,
    pub qos: QoS,
}

impl SubscribeRequest {
    pub fn new(topic: TopicRef, qos: QoS) -> Self {
        Self { topic, qos }
    }
}

/// Result of a subscribe handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeResult {
    pub outcome: Outcome,
    pub topic_info: Option<TopicInfo>,
    pub granted_qos: QoS,
}

impl SubscribeResult {
    pub(crate) fn rejected(outcome: Outcome) -> Self {
        Self {
            outcome,
            topic_info: None,
            granted_qos: QoS::AtMostOnce,
        }
    }
}

/// Result of a register handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterResult {
    pub outcome: Outcome,
    pub topic_path: Option<String>,
    pub topic_info: Option<TopicInfo>,
}
