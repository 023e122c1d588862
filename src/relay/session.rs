//! Live-connection handle.

// ============================================================================
// Imports
// ============================================================================

use std::time::Instant;

use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::identifiers::SessionId;

// ============================================================================
// Session
// ============================================================================

/// One live connection to an executor instance.
///
/// The session does not own the socket; it holds the outbound half of the
/// per-connection frame channel. Dropping the session (on replacement or
/// disconnect) closes that channel, which unwinds the connection's event
/// loop.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session id, allocated on connect.
    id: SessionId,

    /// Outbound frame channel into the connection event loop.
    outbound: mpsc::UnboundedSender<String>,

    /// When the executor connected.
    connected_at: Instant,
}

impl Session {
    /// Creates a session over an outbound frame channel.
    #[must_use]
    pub fn new(outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: SessionId::next(),
            outbound,
            connected_at: Instant::now(),
        }
    }

    /// Returns the session id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Time since the executor connected.
    #[inline]
    #[must_use]
    pub fn uptime(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }

    /// Hands a serialized frame to the connection event loop.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Disconnected`] if the connection's event loop is
    /// gone.
    pub fn send_frame(&self, frame: String) -> Result<()> {
        self.outbound.send(frame).map_err(|_| Error::Disconnected)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_frame_delivers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = Session::new(tx);

        session.send_frame("{\"id\":1}".to_string()).expect("send");
        assert_eq!(rx.recv().await.as_deref(), Some("{\"id\":1}"));
    }

    #[test]
    fn test_send_frame_after_loop_gone() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let session = Session::new(tx);
        drop(rx);

        let err = session.send_frame(String::new()).unwrap_err();
        assert!(err.is_disconnect());
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let a = Session::new(tx.clone());
        let b = Session::new(tx);
        assert_ne!(a.id(), b.id());
    }
}
