//! Capture agent command façade.
//!
//! The capture agent drives element extraction on a live page. Its
//! counterpart — the script with DOM access — runs in an isolated realm and
//! is reached only through named bus events, never direct calls. Selection
//! mode lives in an explicit [`AgentState`] value owned by the agent
//! instance and threaded through its handlers; there are no ambient
//! globals.
//!
//! Every command is idempotent and independently invocable. Requests that
//! expect a reply race the reply event against a deadline; on deadline
//! elapse extraction resolves to `None` and the mode query to `false` —
//! successes, not errors, unlike relay command deadlines. Callers depend on
//! that asymmetry.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::bus::EventBus;
use crate::model::ExtractedNode;

// ============================================================================
// Topics
// ============================================================================

/// Cross-realm capture event names.
pub mod topics {
    /// Enter interactive selection mode.
    pub const BEGIN_SELECT: &str = "begin-select";
    /// Leave interactive selection mode.
    pub const END_SELECT: &str = "end-select";
    /// Extraction request (selector or coordinate payload).
    pub const EXTRACT: &str = "extract";
    /// Extraction reply.
    pub const EXTRACTED: &str = "extracted";
    /// Selection-mode query.
    pub const STATUS_QUERY: &str = "status-query";
    /// Selection-mode reply.
    pub const STATUS: &str = "status";
    /// Agent availability announcement.
    pub const READY: &str = "ready";
}

// ============================================================================
// Constants
// ============================================================================

/// Default deadline for extraction requests.
const EXTRACT_DEADLINE: Duration = Duration::from_millis(5000);

/// Default deadline for the selection-mode query.
const STATUS_DEADLINE: Duration = Duration::from_millis(1000);

// ============================================================================
// AgentState
// ============================================================================

/// Mutable capture state owned by one agent instance.
#[derive(Debug, Default)]
struct AgentState {
    /// Whether interactive selection mode was last commanded on.
    selecting: bool,
}

// ============================================================================
// CaptureAgent
// ============================================================================

/// Command façade over the cross-realm capture boundary.
pub struct CaptureAgent {
    /// Event channel to the page realm.
    bus: Arc<EventBus>,

    /// Selection-mode state.
    state: Mutex<AgentState>,

    /// Deadline for extraction requests.
    extract_deadline: Duration,

    /// Deadline for the selection-mode query.
    status_deadline: Duration,
}

impl CaptureAgent {
    /// Creates an agent over the given bus with default deadlines.
    #[must_use]
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            state: Mutex::new(AgentState::default()),
            extract_deadline: EXTRACT_DEADLINE,
            status_deadline: STATUS_DEADLINE,
        }
    }

    /// Overrides the request deadlines.
    #[must_use]
    pub fn with_deadlines(mut self, extract: Duration, status: Duration) -> Self {
        self.extract_deadline = extract;
        self.status_deadline = status;
        self
    }

    /// Announces the agent version to the page realm.
    pub fn announce_ready(&self, version: &str) {
        self.bus.publish(topics::READY, json!({ "version": version }));
    }

    // ========================================================================
    // Selection mode
    // ========================================================================

    /// Enters interactive selection mode.
    pub fn begin_selection(&self) {
        self.state.lock().selecting = true;
        self.bus.publish(topics::BEGIN_SELECT, Value::Null);
        debug!("Selection mode on");
    }

    /// Leaves interactive selection mode.
    pub fn end_selection(&self) {
        self.state.lock().selecting = false;
        self.bus.publish(topics::END_SELECT, Value::Null);
        debug!("Selection mode off");
    }

    /// Last commanded selection-mode state of this agent.
    #[inline]
    #[must_use]
    pub fn is_selecting(&self) -> bool {
        self.state.lock().selecting
    }

    /// Queries the page realm for its live selection-mode state.
    ///
    /// Deadline elapse resolves to `false`, not an error.
    pub async fn selection_active(&self) -> bool {
        let reply = self
            .bus
            .request(
                topics::STATUS_QUERY,
                topics::STATUS,
                Value::Null,
                self.status_deadline,
            )
            .await;

        reply
            .as_ref()
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    // ========================================================================
    // Extraction
    // ========================================================================

    /// Extracts the element matched by a CSS selector.
    ///
    /// Deadline elapse resolves to `None`, not an error.
    pub async fn extract_by_selector(&self, selector: &str) -> Option<ExtractedNode> {
        self.extract(json!({ "selector": selector })).await
    }

    /// Extracts the topmost element at a viewport coordinate.
    ///
    /// Deadline elapse resolves to `None`, not an error.
    pub async fn extract_by_coordinate(&self, x: f64, y: f64) -> Option<ExtractedNode> {
        self.extract(json!({ "x": x, "y": y })).await
    }

    async fn extract(&self, request: Value) -> Option<ExtractedNode> {
        let reply = self
            .bus
            .request(
                topics::EXTRACT,
                topics::EXTRACTED,
                request,
                self.extract_deadline,
            )
            .await?;

        if reply.is_null() {
            return None;
        }

        let node: ExtractedNode = match serde_json::from_value(reply) {
            Ok(node) => node,
            Err(e) => {
                warn!(error = %e, "Discarding malformed extraction reply");
                return None;
            }
        };

        if let Err(e) = node.validate() {
            warn!(error = %e, "Discarding extraction reply violating tree invariants");
            return None;
        }

        Some(node)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{BoundingBox, NodeKind};

    fn fast_agent(bus: &Arc<EventBus>) -> CaptureAgent {
        CaptureAgent::new(Arc::clone(bus))
            .with_deadlines(Duration::from_millis(5000), Duration::from_millis(1000))
    }

    fn sample_node() -> ExtractedNode {
        ExtractedNode::new("node-1", NodeKind::Container, BoundingBox::new(0.0, 0.0, 80.0, 40.0))
            .with_child(ExtractedNode::new(
                "node-2",
                NodeKind::Text,
                BoundingBox::new(4.0, 4.0, 72.0, 16.0),
            ))
    }

    /// Page-realm stand-in: answers extract requests after a delay.
    fn spawn_responder(bus: &Arc<EventBus>, delay: Duration, reply: Value) {
        let bus = Arc::clone(bus);
        let mut requests = bus.subscribe(topics::EXTRACT);
        tokio::spawn(async move {
            let _ = requests.recv().await;
            tokio::time::sleep(delay).await;
            bus.publish(topics::EXTRACTED, reply);
        });
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_by_coordinate_receives_payload() {
        let bus = Arc::new(EventBus::new());
        let agent = fast_agent(&bus);

        let reply = serde_json::to_value(sample_node()).expect("serialize");
        spawn_responder(&bus, Duration::from_millis(200), reply);

        let node = agent.extract_by_coordinate(100.0, 50.0).await.expect("node");
        assert_eq!(node.id, "node-1");
        assert_eq!(node.children.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_timeout_is_none_not_error() {
        let bus = Arc::new(EventBus::new());
        let agent = fast_agent(&bus);

        let started = tokio::time::Instant::now();
        let node = agent.extract_by_selector("#missing").await;
        assert!(node.is_none());
        assert_eq!(started.elapsed(), Duration::from_millis(5000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_null_reply_is_none() {
        let bus = Arc::new(EventBus::new());
        let agent = fast_agent(&bus);

        spawn_responder(&bus, Duration::from_millis(10), Value::Null);
        assert!(agent.extract_by_selector("#gone").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_extract_invalid_tree_discarded() {
        let bus = Arc::new(EventBus::new());
        let agent = fast_agent(&bus);

        // Vector payload plus children violates the leaf-substitute rule.
        let mut bad = sample_node();
        bad.vector = Some("<svg/>".to_string());
        let reply = serde_json::to_value(bad).expect("serialize");

        spawn_responder(&bus, Duration::from_millis(10), reply);
        assert!(agent.extract_by_selector("#bad").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_query_timeout_is_false() {
        let bus = Arc::new(EventBus::new());
        let agent = fast_agent(&bus);

        let started = tokio::time::Instant::now();
        assert!(!agent.selection_active().await);
        assert_eq!(started.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_status_query_answered() {
        let bus = Arc::new(EventBus::new());
        let agent = fast_agent(&bus);

        let responder = Arc::clone(&bus);
        let mut queries = bus.subscribe(topics::STATUS_QUERY);
        tokio::spawn(async move {
            let _ = queries.recv().await;
            responder.publish(topics::STATUS, Value::Bool(true));
        });

        assert!(agent.selection_active().await);
    }

    #[tokio::test]
    async fn test_selection_mode_idempotent() {
        let bus = Arc::new(EventBus::new());
        let agent = fast_agent(&bus);

        assert!(!agent.is_selecting());
        agent.begin_selection();
        agent.begin_selection();
        assert!(agent.is_selecting());
        agent.end_selection();
        assert!(!agent.is_selecting());
    }

    #[tokio::test]
    async fn test_selection_events_reach_page_realm() {
        let bus = Arc::new(EventBus::new());
        let agent = fast_agent(&bus);

        let mut begin = bus.subscribe(topics::BEGIN_SELECT);
        let mut end = bus.subscribe(topics::END_SELECT);

        agent.begin_selection();
        agent.end_selection();

        assert!(begin.recv().await.is_some());
        assert!(end.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_ready_announcement() {
        let bus = Arc::new(EventBus::new());
        let agent = fast_agent(&bus);

        let mut ready = bus.subscribe(topics::READY);
        agent.announce_ready("1.4.0");
        assert_eq!(ready.recv().await.expect("event")["version"], "1.4.0");
    }
}
