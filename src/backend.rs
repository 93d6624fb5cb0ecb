//! Backend broker connector
//!
//! The gateway forwards session-level intent (connect, subscribe, publish of
//! wills) to the backend broker through this trait. Implementations own the
//! upstream connection; calls are synchronous from the gateway's view.

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

use crate::protocol::{Outcome, QoS};

/// Backend connector errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Upstream connection is not available
    NotConnected,
    /// Upstream refused the request
    Rejected(String),
    /// Transport or protocol failure talking to the upstream
    Io(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "backend not connected"),
            Self::Rejected(reason) => write!(f, "backend rejected request: {}", reason),
            Self::Io(e) => write!(f, "backend I/O error: {}", e),
        }
    }
}

impl std::error::Error for BackendError {}

/// Upstream broker collaborator
pub trait BackendConnector: Send + Sync {
    fn connect(&self, client_id: &str) -> Result<Outcome, BackendError>;

    fn disconnect(&self, client_id: &str) -> Result<Outcome, BackendError>;

    fn subscribe(&self, client_id: &str, filter: &str, qos: QoS) -> Result<Outcome, BackendError>;

    fn unsubscribe(&self, client_id: &str, filter: &str) -> Result<Outcome, BackendError>;

    fn publish(
        &self,
        client_id: &str,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: Bytes,
    ) -> Result<(), BackendError>;
}

impl<T: BackendConnector + ?Sized> BackendConnector for Arc<T> {
    fn connect(&self, client_id: &str) -> Result<Outcome, BackendError> {
        (**self).connect(client_id)
    }

    fn disconnect(&self, client_id: &str) -> Result<Outcome, BackendError> {
        (**self).disconnect(client_id)
    }

    fn subscribe(&self, client_id: &str, filter: &str, qos: QoS) -> Result<Outcome, BackendError> {
        (**self).subscribe(client_id, filter, qos)
    }

    fn unsubscribe(&self, client_id: &str, filter: &str) -> Result<Outcome, BackendError> {
        (**self).unsubscribe(client_id, filter)
    }

    fn publish(
        &self,
        client_id: &str,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: Bytes,
    ) -> Result<(), BackendError> {
        (**self).publish(client_id, topic, qos, retain, payload)
    }
}
