//! Pending-command set and settlement rules.
//!
//! Correlation ids decouple request and response ordering: concurrent
//! commands may complete in any order, each tracked by its own pending
//! entry. Three independent event sources can settle the same command —
//! response arrival, deadline elapse, and session disconnect — so every
//! settlement path removes the pending entry under the lock before touching
//! the waiting future. Whoever removes the entry settles it; everyone else
//! finds it gone and backs off.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CommandId, SessionId};
use crate::protocol::{CommandEnvelope, ExecutorCommand, ResponseFrame};

use super::session::Session;

// ============================================================================
// Constants
// ============================================================================

/// Default timeout for executor commands.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum pending commands before rejecting new ones.
const MAX_PENDING_COMMANDS: usize = 128;

// ============================================================================
// Types
// ============================================================================

/// One outstanding command awaiting settlement.
struct PendingCommand {
    /// Settles the caller's future; consumed exactly once.
    tx: oneshot::Sender<Result<Value>>,
    /// Session the command was transmitted on.
    session: SessionId,
    /// When the command was issued.
    issued_at: Instant,
}

/// State guarded by the relay's single lock.
///
/// Response arrival, deadline tasks, and disconnect handling all mutate
/// these two structures concurrently; the shared lock is what makes
/// remove-before-settle atomic.
#[derive(Default)]
struct RelayInner {
    /// The single active executor session, if any.
    session: Option<Session>,
    /// Pending commands by correlation id.
    pending: FxHashMap<CommandId, PendingCommand>,
}

// ============================================================================
// Relay
// ============================================================================

/// Correlates outbound executor commands with inbound responses.
///
/// Holds at most one live session (newest connection wins). Command
/// issuance is non-blocking; completion is observed through the returned
/// future, which settles exactly once with the response, a `Timeout`, or a
/// `Disconnected` failure.
pub struct Relay {
    inner: Mutex<RelayInner>,
}

impl Relay {
    /// Creates an empty relay with no active session.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(RelayInner::default()),
        })
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Registers a new session as the single active session.
    ///
    /// Atomically replaces any prior session; every command pending against
    /// the replaced session settles `Disconnected` immediately. Dropping the
    /// replaced session closes its outbound channel, which unwinds the old
    /// connection's event loop.
    pub fn connect(&self, outbound: mpsc::UnboundedSender<String>) -> SessionId {
        let session = Session::new(outbound);
        let session_id = session.id();

        let (replaced, orphaned) = {
            let mut inner = self.inner.lock();
            let replaced = inner.session.replace(session).map(|old| old.id());
            let orphaned: Vec<PendingCommand> = if replaced.is_some() {
                inner.pending.drain().map(|(_, entry)| entry).collect()
            } else {
                Vec::new()
            };
            (replaced, orphaned)
        };

        match replaced {
            Some(old) => info!(
                session = %session_id,
                replaced = %old,
                orphaned = orphaned.len(),
                "Executor session replaced"
            ),
            None => info!(session = %session_id, "Executor session connected"),
        }

        for entry in orphaned {
            let _ = entry.tx.send(Err(Error::Disconnected));
        }

        session_id
    }

    /// Drops the given session if it is still the active one.
    ///
    /// Every command pending against it settles `Disconnected` at once —
    /// fast-fail rather than waiting out each individual deadline. A stale
    /// id (a session that was already replaced) is a no-op.
    pub fn disconnect(&self, session_id: SessionId) {
        let orphaned: Vec<PendingCommand> = {
            let mut inner = self.inner.lock();
            match inner.session.as_ref() {
                Some(current) if current.id() == session_id => {
                    inner.session = None;
                    inner.pending.drain().map(|(_, entry)| entry).collect()
                }
                _ => return,
            }
        };

        info!(
            session = %session_id,
            orphaned = orphaned.len(),
            "Executor session disconnected"
        );

        for entry in orphaned {
            let _ = entry.tx.send(Err(Error::Disconnected));
        }
    }

    // ========================================================================
    // Command issuance
    // ========================================================================

    /// Sends a typed command with the given timeout.
    ///
    /// # Errors
    ///
    /// Same contract as [`Relay::send_command`].
    pub async fn send(
        self: &Arc<Self>,
        command: ExecutorCommand,
        timeout: Duration,
    ) -> Result<Value> {
        let kind = command.kind();
        let payload = command.into_payload()?;
        self.send_command(kind, payload, timeout).await
    }

    /// Transmits `{id, kind, payload}` to the current session and awaits
    /// the correlated response.
    ///
    /// Allocates a fresh, process-unique correlation id, records a pending
    /// entry with a deadline, and returns a future that settles exactly
    /// once. Commands are never queued for a future session.
    ///
    /// # Errors
    ///
    /// - [`Error::Disconnected`] immediately if there is no active session,
    ///   or later if the session drops mid-flight
    /// - [`Error::Timeout`] if no response arrives before the deadline
    /// - [`Error::Executor`] if the executor answers `ok: false`
    /// - [`Error::Validation`] if the pending set is full
    pub async fn send_command(
        self: &Arc<Self>,
        kind: impl Into<String>,
        payload: Value,
        timeout: Duration,
    ) -> Result<Value> {
        let envelope = CommandEnvelope::new(kind, payload);
        let command_id = envelope.id;
        let frame = serde_json::to_string(&envelope)?;

        let (tx, rx) = oneshot::channel();

        {
            let mut inner = self.inner.lock();
            let Some(session) = inner.session.clone() else {
                return Err(Error::Disconnected);
            };
            if inner.pending.len() >= MAX_PENDING_COMMANDS {
                warn!(
                    pending = inner.pending.len(),
                    max = MAX_PENDING_COMMANDS,
                    "Too many pending commands"
                );
                return Err(Error::validation(format!(
                    "too many pending commands: {}/{}",
                    inner.pending.len(),
                    MAX_PENDING_COMMANDS
                )));
            }

            let session_id = session.id();
            inner.pending.insert(
                command_id,
                PendingCommand {
                    tx,
                    session: session_id,
                    issued_at: Instant::now(),
                },
            );

            if let Err(e) = session.send_frame(frame) {
                inner.pending.remove(&command_id);
                return Err(e);
            }
        }

        debug!(command = %command_id, kind = %envelope.kind, "Command transmitted");

        // Per-command wall-clock deadline; not renewable, no cancellation
        // API beyond this and disconnect.
        let relay = Arc::clone(self);
        let timeout_ms = timeout.as_millis() as u64;
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            relay.expire(command_id, timeout_ms);
        });

        Ok(rx.await??)
    }

    // ========================================================================
    // Settlement sources
    // ========================================================================

    /// Routes an inbound response frame to its waiting future.
    ///
    /// An unknown or already-settled id (e.g. a late reply after timeout)
    /// is silently discarded; it can neither settle a future twice nor
    /// affect an unrelated command.
    pub fn on_response(&self, frame: ResponseFrame) {
        let entry = self.inner.lock().pending.remove(&frame.id);

        match entry {
            Some(entry) => {
                debug!(
                    command = %frame.id,
                    ok = frame.ok,
                    elapsed = ?entry.issued_at.elapsed(),
                    "Response correlated"
                );
                let _ = entry.tx.send(frame.into_result());
            }
            None => {
                debug!(command = %frame.id, "Response for unknown or settled command, discarding");
            }
        }
    }

    /// Deadline handler; no-op when the response or a disconnect won the
    /// race.
    fn expire(&self, command_id: CommandId, timeout_ms: u64) {
        let entry = self.inner.lock().pending.remove(&command_id);

        if let Some(entry) = entry {
            debug!(
                command = %command_id,
                session = %entry.session,
                "Command deadline elapsed"
            );
            let _ = entry.tx.send(Err(Error::timeout(command_id, timeout_ms)));
        }
    }

    // ========================================================================
    // Observability
    // ========================================================================

    /// Number of active sessions (0 or 1).
    #[inline]
    #[must_use]
    pub fn session_count(&self) -> usize {
        usize::from(self.inner.lock().session.is_some())
    }

    /// Number of commands awaiting settlement.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Id of the current session, if any.
    #[inline]
    #[must_use]
    pub fn current_session(&self) -> Option<SessionId> {
        self.inner.lock().session.as_ref().map(Session::id)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;
    use tokio::sync::mpsc::UnboundedReceiver;

    /// Registers a fake executor session and returns its frame stream.
    fn attach_executor(relay: &Arc<Relay>) -> (SessionId, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = relay.connect(tx);
        (id, rx)
    }

    async fn next_envelope(rx: &mut UnboundedReceiver<String>) -> CommandEnvelope {
        let frame = rx.recv().await.expect("frame");
        serde_json::from_str(&frame).expect("parse envelope")
    }

    #[tokio::test]
    async fn test_no_session_fails_immediately() {
        let relay = Relay::new();

        let err = relay
            .send_command("node.export", json!({}), Duration::from_secs(30))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Disconnected));
        assert_eq!(relay.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_response_settles_success() {
        let relay = Relay::new();
        let (_id, mut rx) = attach_executor(&relay);

        let sender = Arc::clone(&relay);
        let call = tokio::spawn(async move {
            sender
                .send_command("selection.set", json!({ "nodeIds": [] }), Duration::from_secs(30))
                .await
        });

        let envelope = next_envelope(&mut rx).await;
        assert_eq!(envelope.kind, "selection.set");

        relay.on_response(ResponseFrame::success(envelope.id, json!({ "selected": 0 })));

        let result = call.await.expect("join").expect("settle");
        assert_eq!(result["selected"], 0);
        assert_eq!(relay.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_executor_error_carried_through() {
        let relay = Relay::new();
        let (_id, mut rx) = attach_executor(&relay);

        let sender = Arc::clone(&relay);
        let call = tokio::spawn(async move {
            sender
                .send_command("node.combine", json!({}), Duration::from_secs(30))
                .await
        });

        let envelope = next_envelope(&mut rx).await;
        relay.on_response(ResponseFrame::failure(envelope.id, "nodes not siblings"));

        let err = call.await.expect("join").unwrap_err();
        assert!(matches!(err, Error::Executor { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_settles_timeout_and_late_reply_is_discarded() {
        let relay = Relay::new();
        let (_id, mut rx) = attach_executor(&relay);

        let started = tokio::time::Instant::now();
        let sender = Arc::clone(&relay);
        let call = tokio::spawn(async move {
            sender
                .send_command("node.export", json!({ "nodeId": "1:2" }), Duration::from_millis(50))
                .await
        });

        let envelope = next_envelope(&mut rx).await;

        let err = call.await.expect("join").unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert_eq!(started.elapsed(), Duration::from_millis(50));
        assert_eq!(relay.pending_count(), 0);

        // A reply racing in after the deadline must be silently discarded.
        tokio::time::sleep(Duration::from_millis(50)).await;
        relay.on_response(ResponseFrame::success(envelope.id, json!({ "late": true })));
        assert_eq!(relay.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_fails_all_pending_immediately() {
        let relay = Relay::new();
        let (session_id, mut rx) = attach_executor(&relay);

        let mut calls = Vec::new();
        for _ in 0..3 {
            let sender = Arc::clone(&relay);
            calls.push(tokio::spawn(async move {
                sender
                    .send_command("node.export", json!({}), Duration::from_secs(60))
                    .await
            }));
        }
        for _ in 0..3 {
            next_envelope(&mut rx).await;
        }
        assert_eq!(relay.pending_count(), 3);

        relay.disconnect(session_id);

        for call in calls {
            let err = call.await.expect("join").unwrap_err();
            assert!(
                matches!(err, Error::Disconnected),
                "expected Disconnected, got {err}"
            );
        }
        assert_eq!(relay.pending_count(), 0);
        assert_eq!(relay.session_count(), 0);
    }

    #[tokio::test]
    async fn test_stale_disconnect_is_noop() {
        let relay = Relay::new();
        let (old_id, _old_rx) = attach_executor(&relay);
        let (new_id, mut new_rx) = attach_executor(&relay);

        // The old connection's event loop reports its close after
        // replacement; the newer session must survive it.
        relay.disconnect(old_id);
        assert_eq!(relay.current_session(), Some(new_id));

        let sender = Arc::clone(&relay);
        let call = tokio::spawn(async move {
            sender
                .send_command("selection.set", json!({ "nodeIds": [] }), Duration::from_secs(30))
                .await
        });
        let envelope = next_envelope(&mut new_rx).await;
        relay.on_response(ResponseFrame::success(envelope.id, json!({})));
        call.await.expect("join").expect("settle");
    }

    #[tokio::test]
    async fn test_newest_connection_wins() {
        let relay = Relay::new();
        let (_old_id, mut old_rx) = attach_executor(&relay);

        let sender = Arc::clone(&relay);
        let stranded = tokio::spawn(async move {
            sender
                .send_command("node.export", json!({}), Duration::from_secs(60))
                .await
        });
        next_envelope(&mut old_rx).await;

        let (new_id, mut new_rx) = attach_executor(&relay);

        // Replacement fails the old session's pending command at once.
        let err = stranded.await.expect("join").unwrap_err();
        assert!(matches!(err, Error::Disconnected));
        assert_eq!(relay.current_session(), Some(new_id));

        // New traffic flows to the new session.
        let sender = Arc::clone(&relay);
        let call = tokio::spawn(async move {
            sender
                .send_command("node.export", json!({}), Duration::from_secs(30))
                .await
        });
        let envelope = next_envelope(&mut new_rx).await;
        relay.on_response(ResponseFrame::success(envelope.id, json!({ "ok": 1 })));
        call.await.expect("join").expect("settle");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_commands_settle_exactly_once() {
        let relay = Relay::new();
        let (_id, mut rx) = attach_executor(&relay);

        const N: usize = 16;
        let mut calls = Vec::new();
        for _ in 0..N {
            let sender = Arc::clone(&relay);
            calls.push(tokio::spawn(async move {
                sender
                    .send_command("node.export", json!({}), Duration::from_millis(100))
                    .await
            }));
        }

        let mut envelopes = Vec::new();
        for _ in 0..N {
            envelopes.push(next_envelope(&mut rx).await);
        }

        // Answer every other command, in reverse arrival order; the rest
        // run into their deadlines.
        for (i, envelope) in envelopes.iter().enumerate().rev() {
            if i % 2 == 0 {
                relay.on_response(ResponseFrame::success(envelope.id, json!({ "slot": i })));
            }
        }

        // Every future settles exactly once, none dangle.
        for (i, call) in calls.into_iter().enumerate() {
            let result = call.await.expect("join");
            if i % 2 == 0 {
                assert_eq!(result.expect("answered")["slot"], i);
            } else {
                assert!(matches!(result.unwrap_err(), Error::Timeout { .. }));
            }
        }
        assert_eq!(relay.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_pending_cap_rejects_excess_load() {
        let relay = Relay::new();
        let (session_id, mut rx) = attach_executor(&relay);

        let mut calls = Vec::new();
        for _ in 0..MAX_PENDING_COMMANDS {
            let sender = Arc::clone(&relay);
            calls.push(tokio::spawn(async move {
                sender
                    .send_command("node.export", json!({}), Duration::from_secs(60))
                    .await
            }));
        }
        for _ in 0..MAX_PENDING_COMMANDS {
            next_envelope(&mut rx).await;
        }

        let err = relay
            .send_command("node.export", json!({}), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        relay.disconnect(session_id);
        for call in calls {
            assert!(call.await.expect("join").is_err());
        }
    }
}
