//! WebSocket listener and per-session event loop.
//!
//! The executor connects here. Each accepted socket is upgraded, registered
//! with the relay as the active session (newest connection wins), and pumped
//! by a single select loop: inbound text frames parse as response frames and
//! feed correlation; outbound frames drain from the session channel onto the
//! sink. Socket close reports a disconnect, which fast-fails everything the
//! session still had pending.

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::protocol::ResponseFrame;

use super::core::Relay;

// ============================================================================
// Constants
// ============================================================================

/// Default bind address for the executor listener (localhost).
const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Accept poll interval; bounds shutdown latency.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

// ============================================================================
// RelayServer
// ============================================================================

/// WebSocket server the design-tool executor connects to.
///
/// # Example
///
/// ```ignore
/// let relay = Relay::new();
/// let server = RelayServer::bind(Arc::clone(&relay), 0).await?;
/// println!("executor URL: {}", server.ws_url());
/// ```
pub struct RelayServer {
    /// Port the listener is bound to.
    port: u16,

    /// Shared relay.
    relay: Arc<Relay>,

    /// Shutdown flag checked by the accept loop.
    shutdown: AtomicBool,
}

impl RelayServer {
    /// Binds the executor listener and starts the accept loop.
    ///
    /// Use port 0 to let the OS assign a random available port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(relay: Arc<Relay>, port: u16) -> Result<Arc<Self>> {
        Self::bind_ip(relay, DEFAULT_BIND_IP, port).await
    }

    /// Binds the executor listener to a specific IP and port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind_ip(relay: Arc<Relay>, ip: IpAddr, port: u16) -> Result<Arc<Self>> {
        let addr = SocketAddr::new(ip, port);
        let listener = TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        let server = Arc::new(Self {
            port: actual_port,
            relay,
            shutdown: AtomicBool::new(false),
        });

        let accept = Arc::clone(&server);
        tokio::spawn(async move {
            accept.accept_loop(listener).await;
        });

        info!(port = actual_port, "Relay WebSocket server bound");

        Ok(server)
    }

    /// Returns the port the listener is bound to.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the WebSocket URL executors should connect to.
    ///
    /// Format: `ws://127.0.0.1:{port}`
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://127.0.0.1:{}", self.port)
    }

    /// Stops accepting new connections.
    ///
    /// The live session, if any, is dropped through the relay.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(session_id) = self.relay.current_session() {
            self.relay.disconnect(session_id);
        }
        info!("Relay server shutting down");
    }

    // ========================================================================
    // Accept loop
    // ========================================================================

    /// Background task that accepts executor connections.
    async fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        debug!("Accept loop started");

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                debug!("Accept loop shutting down");
                break;
            }

            match timeout(ACCEPT_POLL, listener.accept()).await {
                Ok(Ok((stream, addr))) => {
                    let server = Arc::clone(&self);
                    tokio::spawn(async move {
                        if let Err(e) = server.handle_connection(stream, addr).await {
                            warn!(error = %e, ?addr, "Connection handling failed");
                        }
                    });
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Accept failed");
                }
                Err(_) => {
                    // Poll timeout, re-check the shutdown flag.
                    continue;
                }
            }
        }

        debug!("Accept loop terminated");
    }

    /// Upgrades one socket and runs its session until close.
    async fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) -> Result<()> {
        debug!(?addr, "Executor TCP connection");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::parse(format!("WebSocket upgrade failed: {e}")))?;

        info!(?addr, "Executor WebSocket established");

        self.run_session(ws_stream).await;
        Ok(())
    }

    /// Per-session event loop: pumps frames both ways until the socket
    /// closes or the session is replaced.
    async fn run_session(&self, ws_stream: WebSocketStream<TcpStream>) {
        let (mut ws_write, mut ws_read) = ws_stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();

        let session_id = self.relay.connect(outbound_tx);

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ResponseFrame>(&text) {
                                Ok(frame) => self.relay.on_response(frame),
                                Err(e) => {
                                    warn!(session = %session_id, error = %e, "Malformed response frame");
                                }
                            }
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!(session = %session_id, "WebSocket closed by executor");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(session = %session_id, error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!(session = %session_id, "WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                frame = outbound_rx.recv() => {
                    match frame {
                        Some(json) => {
                            if let Err(e) = ws_write.send(Message::Text(json.into())).await {
                                warn!(session = %session_id, error = %e, "Failed to send frame");
                                break;
                            }
                        }

                        // The relay dropped our session (replaced by a
                        // newer connection); unwind and close the socket.
                        None => {
                            debug!(session = %session_id, "Session replaced, closing socket");
                            break;
                        }
                    }
                }
            }
        }

        let _ = ws_write.close().await;
        self.relay.disconnect(session_id);
    }
}

// ============================================================================
// Tests
// ============================================================================
