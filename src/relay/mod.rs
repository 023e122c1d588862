//! Relay / session manager.
//!
//! The relay owns the single live connection to the design-tool executor,
//! assigns correlation ids to outbound commands, and settles pending
//! requests from inbound responses, deadline elapse, or disconnect.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Relay (Rust)   │                              │  Executor       │
//! │                 │         WebSocket            │  (sandboxed     │
//! │  RelayServer    │◄────────────────────────────►│   design tool)  │
//! │  → Session      │      localhost:PORT          │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Session Lifecycle
//!
//! 1. `RelayServer::bind` - Bind the WebSocket listener
//! 2. Executor connects; `Relay::connect` registers the session
//!    (newest connection wins, replacing any prior session)
//! 3. `Relay::send_command` - Correlated request/response traffic
//! 4. Socket close - every pending command settles `Disconnected`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Pending-command set and settlement rules |
//! | `server` | WebSocket listener and per-session event loop |
//! | `session` | Live-connection handle |

// ============================================================================
// Submodules
// ============================================================================

/// Pending-command set and settlement rules.
pub mod core;

/// WebSocket listener and per-session event loop.
pub mod server;

/// Live-connection handle.
pub mod session;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{DEFAULT_COMMAND_TIMEOUT, Relay};
pub use server::RelayServer;
pub use session::Session;
