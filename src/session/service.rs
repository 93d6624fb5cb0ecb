//! Session lifecycle manager
//!
//! Owns the authoritative client id -> session map and drives every
//! handshake that changes session state, the periodic sweep, and the
//! fan-out of backend messages onto session queues.
//!
//! Lock order is session mutex, then map shard, then client index. A session
//! mutex is never acquired while a map guard is held; iteration snapshots the
//! handles first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use super::{ClientState, GatewayOptions, MessageStateService, Session, SessionHandle};
use crate::backend::BackendConnector;
use crate::error::GatewayError;
use crate::hooks::{DefaultHooks, Hooks};
use crate::protocol::{
    ConnectRequest, DisconnectRequest, Outcome, QoS, RegisterResult, ReturnCode,
    SubscribeRequest, SubscribeResult, TopicInfo, TopicRef,
};
use crate::queue::{MemoryMessageQueue, MessageQueue, PayloadStore, QueuedMessage, Retention};
use crate::registry::{MemoryTopicRegistry, MemoryWillRegistry, TopicRegistry, WillRegistry};
use crate::topic::{is_wild, validate_subscription, SubscriptionChange, SubscriptionRegistry};
use crate::tree::RadixTree;

/// What a sweep did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SweepReport {
    /// Sessions whose keepalive lapsed and were marked disconnected
    pub disconnected: usize,
    /// Inactive sessions removed after their expiry
    pub removed: usize,
    /// Will messages published for lapsed sessions
    pub wills_published: usize,
    /// Expired payloads dropped from the store
    pub payloads_evicted: usize,
    /// Delay until the next sweep is due
    pub next_delay: Duration,
}

/// What a fan-out did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanOutReport {
    /// Sessions whose subscriptions matched
    pub recipients: usize,
    /// Messages placed on session queues
    pub enqueued: usize,
    /// Recipients skipped (oversize, queue full, session gone)
    pub skipped: usize,
}

/// Builder for [`SessionService`]
///
/// Collaborators left unset get in-memory implementations. A custom
/// message queue must release payloads into the same store passed to
/// [`payload_store`](Self::payload_store).
pub struct SessionServiceBuilder {
    options: GatewayOptions,
    backend: Arc<dyn BackendConnector>,
    topics: Option<Arc<dyn TopicRegistry>>,
    queue: Option<Arc<dyn MessageQueue>>,
    wills: Option<Arc<dyn WillRegistry>>,
    hooks: Option<Arc<dyn Hooks>>,
    message_state: Option<Arc<dyn MessageStateService>>,
    payloads: Option<Arc<PayloadStore>>,
}

impl SessionServiceBuilder {
    pub fn topic_registry(mut self, topics: Arc<dyn TopicRegistry>) -> Self {
        self.topics = Some(topics);
        self
    }

    pub fn message_queue(mut self, queue: Arc<dyn MessageQueue>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn will_registry(mut self, wills: Arc<dyn WillRegistry>) -> Self {
        self.wills = Some(wills);
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn Hooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn message_state(mut self, message_state: Arc<dyn MessageStateService>) -> Self {
        self.message_state = Some(message_state);
        self
    }

    pub fn payload_store(mut self, payloads: Arc<PayloadStore>) -> Self {
        self.payloads = Some(payloads);
        self
    }

    pub fn build(self) -> SessionService {
        let options = self.options;
        let payloads = self
            .payloads
            .unwrap_or_else(|| Arc::new(PayloadStore::new(options.max_stored_payloads)));
        let queue = self.queue.unwrap_or_else(|| {
            Arc::new(MemoryMessageQueue::new(
                options.max_queue_size,
                payloads.clone(),
            ))
        });
        let topics = self.topics.unwrap_or_else(|| {
            Arc::new(MemoryTopicRegistry::with_predefined(
                options.predefined_topics.iter().cloned(),
            ))
        });
        let wills = self
            .wills
            .unwrap_or_else(|| Arc::new(MemoryWillRegistry::new()));
        let hooks = self.hooks.unwrap_or_else(|| Arc::new(DefaultHooks));

        SessionService {
            sessions: DashMap::new(),
            client_index: Mutex::new(RadixTree::new()),
            subscriptions: SubscriptionRegistry::with_limits(options.trie_limits),
            payloads,
            backend: self.backend,
            topics,
            queue,
            wills,
            hooks,
            message_state: self.message_state,
            options,
            expansion_count: AtomicU64::new(0),
        }
    }
}

/// Session lifecycle manager
pub struct SessionService {
    sessions: DashMap<Arc<str>, SessionHandle>,
    /// Client ids for prefix search; only updated under a map shard guard
    client_index: Mutex<RadixTree<Arc<str>>>,
    subscriptions: SubscriptionRegistry,
    payloads: Arc<PayloadStore>,
    backend: Arc<dyn BackendConnector>,
    topics: Arc<dyn TopicRegistry>,
    queue: Arc<dyn MessageQueue>,
    wills: Arc<dyn WillRegistry>,
    hooks: Arc<dyn Hooks>,
    message_state: Option<Arc<dyn MessageStateService>>,
    options: GatewayOptions,
    expansion_count: AtomicU64,
}

impl SessionService {
    pub fn builder(backend: Arc<dyn BackendConnector>, options: GatewayOptions) -> SessionServiceBuilder {
        SessionServiceBuilder {
            options,
            backend,
            topics: None,
            queue: None,
            wills: None,
            hooks: None,
            message_state: None,
            payloads: None,
        }
    }

    /// Service with in-memory collaborators
    pub fn new(backend: Arc<dyn BackendConnector>, options: GatewayOptions) -> Self {
        Self::builder(backend, options).build()
    }

    pub fn options(&self) -> &GatewayOptions {
        &self.options
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    pub fn payload_store(&self) -> &Arc<PayloadStore> {
        &self.payloads
    }

    pub fn message_queue(&self) -> &Arc<dyn MessageQueue> {
        &self.queue
    }

    /// Look up a session, creating it in `Pending` when asked to
    ///
    /// Concurrent callers for the same id always receive the same handle.
    pub fn session(&self, client_id: &str, create_if_absent: bool) -> Option<SessionHandle> {
        if let Some(handle) = self.sessions.get(client_id) {
            return Some(handle.value().clone());
        }
        if !create_if_absent {
            return None;
        }

        let id: Arc<str> = Arc::from(client_id);
        let handle = match self.sessions.entry(id.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let handle = Arc::new(Mutex::new(Session::new(
                    id.clone(),
                    self.options.default_session_expiry,
                    self.options.default_max_packet_size,
                    Instant::now(),
                )));
                self.client_index.lock().insert(&id, id.clone());
                entry.insert(handle.clone());
                debug!("Created session for {}", id);
                handle
            }
        };
        Some(handle)
    }

    /// Re-register a handle that was removed while a caller still held it
    fn attach(&self, handle: &SessionHandle, client_id: &Arc<str>) -> bool {
        match self.sessions.entry(client_id.clone()) {
            Entry::Occupied(entry) => Arc::ptr_eq(entry.get(), handle),
            Entry::Vacant(entry) => {
                self.client_index.lock().insert(client_id, client_id.clone());
                entry.insert(handle.clone());
                true
            }
        }
    }

    /// Whether the map still refers to this handle
    fn is_attached(&self, handle: &SessionHandle, client_id: &str) -> bool {
        self.sessions
            .get(client_id)
            .is_some_and(|current| Arc::ptr_eq(current.value(), handle))
    }

    /// Remove the map entry if it still refers to this handle
    fn detach(&self, handle: &SessionHandle, client_id: &str) -> bool {
        self.sessions
            .remove_if(client_id, |_, current| {
                let same = Arc::ptr_eq(current, handle);
                if same {
                    self.client_index.lock().remove(client_id);
                }
                same
            })
            .is_some()
    }

    /// Clear all state held for a session and remove it
    ///
    /// The caller holds the session lock.
    fn purge(&self, handle: &SessionHandle, client_id: &str) -> bool {
        self.clean_session(client_id, true);
        let removed = self.detach(handle, client_id);
        if removed {
            info!("Removed session {}", client_id);
        }
        removed
    }

    fn clean_session(&self, client_id: &str, deep: bool) {
        debug!("Cleaning session state for {} (deep: {})", client_id, deep);
        if deep {
            self.queue.clear(client_id);
            self.subscriptions.clear(client_id);
        }
        if let Some(message_state) = &self.message_state {
            message_state.clear(client_id);
        }
        self.topics.clear(client_id);
        self.wills.clear(client_id);
    }

    fn check_capacity(&self, client_id: &str) -> Option<Outcome> {
        // Two unsynchronized reads; the id may appear in between
        let others = self
            .sessions
            .len()
            .saturating_sub(usize::from(self.sessions.contains_key(client_id)));
        if others >= self.options.max_connected_clients {
            return Some(Outcome::error(
                ReturnCode::RejectedCongestion,
                "gateway has reached capacity",
            ));
        }
        None
    }

    /// Publish and discard the session's will, if any
    ///
    /// The will is discarded even when publishing fails, so it is delivered
    /// at most once.
    fn dispatch_will(&self, client_id: &str) -> bool {
        let Some(will) = self.wills.will_message(client_id) else {
            return false;
        };
        self.wills.clear(client_id);

        match self
            .backend
            .publish(client_id, &will.topic, will.qos, will.retain, will.payload)
        {
            Ok(()) => {
                info!("Published will for {} to {}", client_id, will.topic);
                true
            }
            Err(e) => {
                error!("Failed to publish will for {} to {}: {}", client_id, will.topic, e);
                false
            }
        }
    }

    /// Handle CONNECT
    pub fn connect(&self, handle: &SessionHandle, request: &ConnectRequest) -> Outcome {
        let client_id = handle.lock().client_id.clone();

        if let Some(outcome) = self.check_capacity(&client_id) {
            let session = handle.lock();
            if session.state == ClientState::Pending {
                self.detach(handle, &client_id);
            }
            warn!("Rejected connection from {}: {}", client_id, outcome);
            return outcome;
        }

        let mut session = handle.lock();
        if !self.attach(handle, &client_id) {
            warn!("Rejected connection from {}: session superseded", client_id);
            return Outcome::error(
                ReturnCode::RejectedCongestion,
                "session superseded by a newer connection",
            );
        }

        let outcome = match self.backend.connect(&client_id) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::error(ReturnCode::RejectedCongestion, e.to_string()),
        };
        if outcome.is_error() {
            warn!("Backend refused connection for {}: {}", client_id, outcome);
            // Durable state survives so a later persistent reconnect resumes it
            self.detach(handle, &client_id);
            return outcome;
        }

        self.hooks.on_client_connected(&client_id);
        self.clean_session(&client_id, request.clean_session);
        if let Some(will) = &request.will {
            self.wills.set_will_message(&client_id, will.clone());
        }

        session.keep_alive = u32::from(request.keep_alive);
        session.session_expiry_interval = request
            .session_expiry_interval
            .unwrap_or(self.options.default_session_expiry);
        session.max_packet_size = request
            .max_packet_size
            .unwrap_or(self.options.default_max_packet_size);
        session.state = ClientState::Connected;
        session.touch_at(Instant::now());

        info!(
            "Client {} connected (clean session: {}, keep alive: {}s)",
            client_id, request.clean_session, request.keep_alive
        );
        outcome
    }

    /// Handle DISCONNECT, either going to sleep or ending the session
    pub fn disconnect(&self, handle: &SessionHandle, request: &DisconnectRequest) -> Outcome {
        let mut session = handle.lock();
        let client_id = session.client_id.clone();

        let outcome = match self.backend.disconnect(&client_id) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::error(ReturnCode::RejectedCongestion, e.to_string()),
        };
        if outcome.is_error() {
            warn!("Backend refused disconnect for {}: {}", client_id, outcome);
            return outcome;
        }

        match request.sleep_duration() {
            Some(duration) => {
                info!("Client {} going to sleep for {}s", client_id, duration);
                session.keep_alive = duration;
                session.session_expiry_interval = duration;
                session.state = ClientState::Asleep;
                session.touch_at(Instant::now());
                if self.options.sleep_clears_registrations {
                    self.topics.clear(&client_id);
                }
            }
            None => {
                info!("Client {} disconnected", client_id);
                session.state = ClientState::Disconnected;
                self.purge(handle, &client_id);
            }
        }

        self.hooks.on_client_disconnected(&client_id, true);
        outcome
    }

    /// Resolve a topic reference to a validated topic path
    fn resolve_path(&self, client_id: &str, topic: &TopicRef) -> Result<String, Outcome> {
        match topic {
            TopicRef::Predefined(id) => self
                .topics
                .lookup_predefined(client_id, *id)
                .ok_or_else(|| {
                    Outcome::error(ReturnCode::InvalidTopicId, "no topic found by specification")
                }),
            TopicRef::Normal(path) | TopicRef::Short(path) => {
                if validate_subscription(path, self.options.max_topic_length).is_err() {
                    return Err(Outcome::error(
                        ReturnCode::InvalidTopicId,
                        "invalid topic format",
                    ));
                }
                Ok(path.clone())
            }
        }
    }

    /// Topic identity returned to the device, registering normal topics
    fn topic_info(&self, client_id: &str, topic: &TopicRef, path: &str) -> Result<TopicInfo, Outcome> {
        match topic {
            TopicRef::Predefined(id) => Ok(TopicInfo::Predefined(*id)),
            _ if is_wild(path) => Ok(TopicInfo::Wild),
            TopicRef::Short(name) => Ok(TopicInfo::Short(name.clone())),
            TopicRef::Normal(_) => self.topics.register(client_id, path).map_err(|e| {
                warn!("Failed to register topic {} for {}: {}", path, client_id, e);
                Outcome::error(ReturnCode::RejectedCongestion, e.to_string())
            }),
        }
    }

    fn rollback_subscription(&self, client_id: &Arc<str>, filter: &str, change: SubscriptionChange) {
        match change {
            SubscriptionChange::Created => {
                self.subscriptions.unsubscribe(client_id, filter);
            }
            SubscriptionChange::QosChanged { previous } => {
                if let Err(e) = self.subscriptions.subscribe(client_id, filter, previous) {
                    error!("Failed to restore subscription {} for {}: {}", filter, client_id, e);
                }
            }
            SubscriptionChange::Unchanged => {}
        }
    }

    /// Handle SUBSCRIBE
    pub fn subscribe(&self, handle: &SessionHandle, request: &SubscribeRequest) -> SubscribeResult {
        let session = handle.lock();
        let client_id = session.client_id.clone();

        let path = match self.resolve_path(&client_id, &request.topic) {
            Ok(path) => path,
            Err(outcome) => return SubscribeResult::rejected(outcome),
        };
        let topic_info = match self.topic_info(&client_id, &request.topic, &path) {
            Ok(info) => info,
            Err(outcome) => return SubscribeResult::rejected(outcome),
        };

        let allowed = self
            .hooks
            .on_subscribe_check(&client_id, &path)
            .unwrap_or_else(|e| {
                warn!("Subscribe check failed for {} on {}: {}", client_id, path, e);
                false
            });
        if !allowed {
            return SubscribeResult::rejected(Outcome::error(
                ReturnCode::RejectedCongestion,
                "authorization service denied subscription",
            ));
        }
        let max_qos = self
            .hooks
            .on_maximum_qos(&client_id, &path)
            .unwrap_or_else(|e| {
                warn!("Maximum QoS check failed for {} on {}: {}", client_id, path, e);
                QoS::AtMostOnce
            });
        let qos = request.qos.min(max_qos);

        let change = match self.subscriptions.subscribe(&client_id, &path, qos) {
            Ok(change) => change,
            Err(e) => {
                warn!("Subscription {} for {} rejected: {}", path, client_id, e);
                return SubscribeResult::rejected(Outcome::error(
                    ReturnCode::RejectedCongestion,
                    e.to_string(),
                ));
            }
        };

        if change == SubscriptionChange::Unchanged {
            return SubscribeResult {
                outcome: Outcome::noop(),
                topic_info: Some(topic_info),
                granted_qos: qos,
            };
        }

        let outcome = match self.backend.subscribe(&client_id, &path, qos) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::error(ReturnCode::RejectedCongestion, e.to_string()),
        };
        if outcome.is_error() {
            warn!("Backend refused subscription {} for {}: {}", path, client_id, outcome);
            self.rollback_subscription(&client_id, &path, change);
            return SubscribeResult {
                outcome,
                topic_info: Some(topic_info),
                granted_qos: QoS::AtMostOnce,
            };
        }

        debug!("Client {} subscribed to {} at {:?}", client_id, path, qos);
        SubscribeResult {
            outcome,
            topic_info: Some(topic_info),
            granted_qos: qos,
        }
    }

    /// Handle UNSUBSCRIBE
    pub fn unsubscribe(&self, handle: &SessionHandle, topic: &TopicRef) -> Outcome {
        let session = handle.lock();
        let client_id = session.client_id.clone();

        let path = match self.resolve_path(&client_id, topic) {
            Ok(path) => path,
            Err(outcome) => return outcome,
        };

        let Some(previous) = self.subscriptions.qos(&client_id, &path) else {
            return Outcome::noop();
        };
        self.subscriptions.unsubscribe(&client_id, &path);

        let outcome = match self.backend.unsubscribe(&client_id, &path) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::error(ReturnCode::RejectedCongestion, e.to_string()),
        };
        if outcome.is_error() {
            warn!("Backend refused unsubscribe {} for {}: {}", path, client_id, outcome);
            if let Err(e) = self.subscriptions.subscribe(&client_id, &path, previous) {
                error!("Failed to restore subscription {} for {}: {}", path, client_id, e);
            }
            return outcome;
        }

        debug!("Client {} unsubscribed from {}", client_id, path);
        outcome
    }

    /// Handle REGISTER
    pub fn register(&self, handle: &SessionHandle, topic: &str) -> RegisterResult {
        if validate_subscription(topic, self.options.max_topic_length).is_err() {
            return RegisterResult {
                outcome: Outcome::error(ReturnCode::InvalidTopicId, "invalid topic format"),
                topic_path: None,
                topic_info: None,
            };
        }

        let session = handle.lock();
        let info = if is_wild(topic) {
            Ok(TopicInfo::Wild)
        } else {
            match self.topics.lookup(&session.client_id, topic) {
                Some(info) => Ok(info),
                None => self.topics.register(&session.client_id, topic),
            }
        };

        match info {
            Ok(info) => RegisterResult {
                outcome: Outcome::ok(),
                topic_path: Some(topic.to_string()),
                topic_info: Some(info),
            },
            Err(e) => {
                warn!("Failed to register topic {} for {}: {}", topic, session.client_id, e);
                RegisterResult {
                    outcome: Outcome::error(ReturnCode::RejectedCongestion, e.to_string()),
                    topic_path: Some(topic.to_string()),
                    topic_info: None,
                }
            }
        }
    }

    /// Sleeping client woke to collect queued messages
    pub fn wake(&self, handle: &SessionHandle) {
        let mut session = handle.lock();
        session.state = ClientState::Awake;
        session.touch_at(Instant::now());
    }

    pub fn ping(&self, handle: &SessionHandle) {
        handle.lock().touch_at(Instant::now());
    }

    pub fn update_last_seen(&self, handle: &SessionHandle) {
        handle.lock().touch_at(Instant::now());
    }

    /// Transport dropped without a DISCONNECT
    pub fn connection_lost(&self, handle: &SessionHandle) {
        let mut session = handle.lock();
        if session.state.is_inactive() {
            return;
        }
        let client_id = session.client_id.clone();
        warn!("Connection lost for {}", client_id);
        session.state = ClientState::Lost;
        self.dispatch_will(&client_id);
        self.hooks.on_client_disconnected(&client_id, false);
    }

    /// Run one sweep now
    pub fn do_work(&self) -> SweepReport {
        self.do_work_at(Instant::now())
    }

    /// Run one sweep as of `now`
    ///
    /// Monitored sessions whose keepalive lapsed are marked disconnected and
    /// their will is published. Inactive sessions past their expiry are
    /// cleared and removed.
    pub fn do_work_at(&self, now: Instant) -> SweepReport {
        let handles: Vec<SessionHandle> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        let mut report = SweepReport {
            next_delay: self.options.monitor_interval,
            ..SweepReport::default()
        };

        for handle in handles {
            let mut session = handle.lock();
            let client_id = session.client_id.clone();

            if session.is_keep_alive_expired_at(now) {
                warn!(
                    "Session {} missed keepalive ({}s), marking disconnected",
                    client_id, session.keep_alive
                );
                session.state = ClientState::Disconnected;
                report.disconnected += 1;
                if self.dispatch_will(&client_id) {
                    report.wills_published += 1;
                }
                self.hooks.on_client_disconnected(&client_id, false);
            } else if session.is_expired_at(now) {
                warn!(
                    "Removing session {}, inactive beyond its {}s expiry",
                    client_id, session.session_expiry_interval
                );
                if self.purge(&handle, &client_id) {
                    report.removed += 1;
                }
            }
        }

        report.payloads_evicted = self.payloads.evict_expired(now);
        report
    }

    /// Expand a backend message onto the queues of every matching session
    ///
    /// The payload is stored once and shared by reference. Recipients that
    /// cannot take the message release their reference immediately.
    pub fn receive_to_sessions(
        &self,
        topic: &str,
        qos: QoS,
        retain: bool,
        payload: Bytes,
    ) -> Result<FanOutReport, GatewayError> {
        let recipients = self.subscriptions.matches(topic);
        let mut report = FanOutReport {
            recipients: recipients.len(),
            ..FanOutReport::default()
        };
        debug!("Receiving backend message on {} into {} sessions", topic, recipients.len());
        if recipients.is_empty() {
            return Ok(report);
        }

        let size = payload.len();
        let retention = if recipients.len() > 1 {
            Retention::Shared {
                references: recipients.len(),
                expires_at: Some(Instant::now() + self.options.payload_expiry),
            }
        } else {
            Retention::SingleUse
        };
        let message_id = self.payloads.add(payload, retention)?;
        let topic: Arc<str> = Arc::from(topic);

        for client_id in recipients {
            let Some(handle) = self.sessions.get(&client_id).map(|h| h.value().clone()) else {
                debug!("No session for subscriber {}, skipping", client_id);
                self.payloads.release(message_id);
                report.skipped += 1;
                continue;
            };

            // Held until the offer so a concurrent purge cannot strand the message
            let session = handle.lock();
            if !self.is_attached(&handle, &client_id) {
                debug!("Session {} removed during fan-out, skipping", client_id);
                self.payloads.release(message_id);
                report.skipped += 1;
                continue;
            }

            let max_packet_size = session.max_packet_size;
            if size > max_packet_size as usize {
                warn!(
                    "Payload of {} bytes exceeds max packet size {} of {}, skipping",
                    size, max_packet_size, client_id
                );
                self.payloads.release(message_id);
                report.skipped += 1;
                continue;
            }

            let granted = self
                .subscriptions
                .matching_qos(&client_id, &topic)
                .unwrap_or_default();
            let message = QueuedMessage {
                message_id,
                topic: topic.clone(),
                qos: granted.min(qos),
                retain,
            };

            match self.queue.offer(&client_id, message) {
                Ok(()) => {
                    report.enqueued += 1;
                    self.expansion_count.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!("Queue rejected message for {}: {}", client_id, e);
                    self.payloads.release(message_id);
                    report.skipped += 1;
                }
            }
        }

        Ok(report)
    }

    fn snapshot(&self) -> Vec<SessionHandle> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of sessions in a state
    pub fn count_sessions(&self, state: ClientState) -> usize {
        self.snapshot()
            .iter()
            .filter(|handle| handle.lock().state == state)
            .count()
    }

    pub fn count_total_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, client_id: &str) -> bool {
        self.sessions.contains_key(client_id)
    }

    pub fn lookup_client_id_session(&self, client_id: &str) -> Option<SessionHandle> {
        self.session(client_id, false)
    }

    /// Client ids starting with `prefix`, in lexical order, capped at the
    /// configured limit
    pub fn prefix_search(&self, prefix: &str) -> Vec<Arc<str>> {
        self.client_index
            .lock()
            .search_prefix(prefix, self.options.prefix_search_limit)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Every client id, in lexical order
    pub fn client_ids(&self) -> Vec<Arc<str>> {
        let mut ids: Vec<Arc<str>> = self.sessions.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Clear all state for a session and remove it
    pub fn clear(&self, client_id: &str) -> bool {
        let Some(handle) = self.session(client_id, false) else {
            return false;
        };
        let mut session = handle.lock();
        session.state = ClientState::Disconnected;
        self.purge(&handle, client_id)
    }

    /// Drop every session reference without touching collaborators
    pub fn clear_all(&self) {
        self.sessions.clear();
        self.client_index.lock().clear();
        info!("Cleared all sessions");
    }

    /// Messages placed on session queues since the last reset
    pub fn expansion_count(&self) -> u64 {
        self.expansion_count.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.expansion_count.store(0, Ordering::Relaxed);
    }
}
