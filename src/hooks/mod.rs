//! Gateway hooks
//!
//! Authorization and lifecycle callbacks consulted by the session service.
//! A cluster layer observes connects through `on_client_connected`.
//!
//! Hooks run while the calling session is locked and must return promptly.

use std::fmt;
use std::sync::Arc;

use crate::protocol::QoS;


#[derive(Debug)]
pub enum HookError {
    /// The hook could not reach a decision
    Internal(String),
    AuthorizationDenied,
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookError::Internal(msg) => write!(f, "Internal error: {}", msg),
            HookError::AuthorizationDenied => f.write_str("Authorization denied"),
        }
    }
}

impl std::error::Error for HookError {}

pub type HookResult<T> = Result<T, HookError>;

/// Gateway callbacks; every method defaults to permissive or no-op
pub trait Hooks: Send + Sync {
    /// May `client_id` subscribe to the resolved `topic`?
    ///
    /// An `Err` is treated as a denial by the session service.
    fn on_subscribe_check(&self, _client_id: &str, _topic: &str) -> HookResult<bool> {
        Ok(true)
    }

    /// Ceiling on the QoS granted for `topic`; the grant is the lower of this
    /// and the requested level
    fn on_maximum_qos(&self, _client_id: &str, _topic: &str) -> HookResult<QoS> {
        Ok(QoS::ExactlyOnce)
    }

    fn on_client_connected(&self, _client_id: &str) {}

    /// `graceful` is false for keepalive lapses and transport loss
    fn on_client_disconnected(&self, _client_id: &str, _graceful: bool) {}
}

/// Allows everything
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl Hooks for DefaultHooks {}

impl<T: Hooks + ?Sized> Hooks for Arc<T> {
    fn on_subscribe_check(&self, client_id: &str, topic: &str) -> HookResult<bool> {
        (**self).on_subscribe_check(client_id, topic)
    }

    fn on_maximum_qos(&self, client_id: &str, topic: &str) -> HookResult<QoS> {
        (**self).on_maximum_qos(client_id, topic)
    }

    fn on_client_connected(&self, client_id: &str) {
        (**self).on_client_connected(client_id)
    }

    fn on_client_disconnected(&self, client_id: &str, graceful: bool) {
        (**self).on_client_disconnected(client_id, graceful)
    }
}

/// Several hook sets consulted in insertion order
///
/// A subscription needs every member's approval and the first error stops
/// the check. The granted QoS ceiling is the lowest of all members. Events
/// reach every member.
#[derive(Default)]
pub struct CompositeHooks {
    members: Vec<Box<dyn Hooks>>,
}

impl CompositeHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<H: Hooks + 'static>(&mut self, hooks: H) {
        self.members.push(Box::new(hooks));
    }

    /// Builder form of [`add`](Self::add)
    pub fn with<H: Hooks + 'static>(mut self, hooks: H) -> Self {
        self.add(hooks);
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Hooks for CompositeHooks {
    fn on_subscribe_check(&self, client_id: &str, topic: &str) -> HookResult<bool> {
        for member in &self.members {
            if !member.on_subscribe_check(client_id, topic)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn on_maximum_qos(&self, client_id: &str, topic: &str) -> HookResult<QoS> {
        self.members
            .iter()
            .try_fold(QoS::ExactlyOnce, |ceiling, member| {
                Ok(ceiling.min(member.on_maximum_qos(client_id, topic)?))
            })
    }

    fn on_client_connected(&self, client_id: &str) {
        self.members
            .iter()
            .for_each(|member| member.on_client_connected(client_id));
    }

    fn on_client_disconnected(&self, client_id: &str, graceful: bool) {
        self.members
            .iter()
            .for_each(|member| member.on_client_disconnected(client_id, graceful));
    }
}
