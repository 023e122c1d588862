//! Cross-realm event channel.
//!
//! The capture side runs in two isolated JS realms with no shared object
//! references; they exchange named, payload-carrying events instead of
//! calls. [`EventBus`] models that boundary: payloads are owned JSON values
//! — this is the one place messages must be serialized, never referenced.
//!
//! A request that expects a reply races a one-shot reply waiter against its
//! deadline; whichever side fires first deregisters the other before
//! settling, so every request settles exactly once. Deadline elapse yields
//! `None`, not an error — callers at this boundary treat a missing reply as
//! an empty result.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, trace};

// ============================================================================
// Types
// ============================================================================

/// A registered one-shot reply waiter.
struct ReplyWaiter {
    /// Waiter id for targeted deregistration on the timeout path.
    id: u64,
    /// Settles the requester; consumed exactly once.
    tx: oneshot::Sender<Value>,
}

#[derive(Default)]
struct BusInner {
    /// Persistent subscribers by topic.
    subscribers: FxHashMap<String, Vec<mpsc::UnboundedSender<Value>>>,
    /// One-shot reply waiters by topic.
    waiters: FxHashMap<String, Vec<ReplyWaiter>>,
    /// Waiter id allocator.
    next_waiter: u64,
}

// ============================================================================
// EventBus
// ============================================================================

/// Named-topic event channel between isolated execution realms.
#[derive(Default)]
pub struct EventBus {
    inner: Mutex<BusInner>,
}

impl EventBus {
    /// Creates an empty bus.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a payload to every subscriber and reply waiter of `topic`.
    ///
    /// Returns the number of deliveries. Closed subscribers are pruned.
    pub fn publish(&self, topic: &str, payload: Value) -> usize {
        let (targets, waiters) = {
            let mut inner = self.inner.lock();

            let waiters = inner.waiters.remove(topic).unwrap_or_default();

            let targets = match inner.subscribers.get_mut(topic) {
                Some(senders) => {
                    senders.retain(|tx| !tx.is_closed());
                    senders.clone()
                }
                None => Vec::new(),
            };

            (targets, waiters)
        };

        let mut delivered = 0;
        for waiter in waiters {
            if waiter.tx.send(payload.clone()).is_ok() {
                delivered += 1;
            }
        }
        for tx in targets {
            if tx.send(payload.clone()).is_ok() {
                delivered += 1;
            }
        }

        trace!(topic, delivered, "Event published");
        delivered
    }

    /// Subscribes to every future publish on `topic`.
    ///
    /// Dropping the receiver deregisters the subscription on the next
    /// publish.
    #[must_use]
    pub fn subscribe(&self, topic: &str) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .lock()
            .subscribers
            .entry(topic.to_string())
            .or_default()
            .push(tx);
        rx
    }

    /// Publishes a request and awaits one reply on `reply_topic`.
    ///
    /// The reply waiter is registered before the request is published, so a
    /// responder answering synchronously cannot be missed. Deadline elapse
    /// deregisters the waiter and resolves to `None` — a timeout is not an
    /// error at this boundary.
    pub async fn request(
        &self,
        request_topic: &str,
        reply_topic: &str,
        payload: Value,
        deadline: Duration,
    ) -> Option<Value> {
        let (tx, rx) = oneshot::channel();
        let waiter_id = {
            let mut inner = self.inner.lock();
            let id = inner.next_waiter;
            inner.next_waiter += 1;
            inner
                .waiters
                .entry(reply_topic.to_string())
                .or_default()
                .push(ReplyWaiter { id, tx });
            id
        };

        self.publish(request_topic, payload);

        match timeout(deadline, rx).await {
            Ok(Ok(value)) => Some(value),
            _ => {
                // Deadline won the race: deregister the waiter before
                // settling so a late reply cannot reach a second outcome.
                self.remove_waiter(reply_topic, waiter_id);
                debug!(request_topic, reply_topic, "Request deadline elapsed");
                None
            }
        }
    }

    /// Number of live reply waiters on a topic.
    #[must_use]
    pub fn waiter_count(&self, topic: &str) -> usize {
        self.inner
            .lock()
            .waiters
            .get(topic)
            .map_or(0, Vec::len)
    }

    fn remove_waiter(&self, topic: &str, waiter_id: u64) {
        let mut inner = self.inner.lock();
        if let Some(waiters) = inner.waiters.get_mut(topic) {
            waiters.retain(|w| w.id != waiter_id);
            if waiters.is_empty() {
                inner.waiters.remove(topic);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
