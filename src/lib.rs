//! Sketchwire - capture-to-design relay.
//!
//! This library bridges a page-embedded capture agent and a sandboxed
//! design-tool executor: a captured visual element becomes an equivalent
//! structured object inside the design host, driven interactively or by an
//! automated tool-calling agent.
//!
//! # Architecture
//!
//! Three independently-lifecycled processes exchange asynchronous commands
//! and responses:
//!
//! - **Capture agent** (page side): extracts element trees, reached only
//!   through named bus events across its realm boundary
//! - **Relay** (this process): correlates outbound executor commands with
//!   inbound responses, with timeout and disconnect semantics
//! - **Executor** (design tool): connects over WebSocket, at most one
//!   active session at a time, newest connection wins
//!
//! The tool dispatch layer exposes the relay to external callers as
//! synchronous-looking request/response calls over HTTP.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use sketchwire::{AppState, Config, Relay, RelayServer, ToolContext, ToolRegistry};
//!
//! #[tokio::main]
//! async fn main() -> sketchwire::Result<()> {
//!     let config = Config::new().with_http_port(4114).with_relay_port(4115);
//!
//!     // Relay the executor connects into.
//!     let relay = Relay::new();
//!     let server = RelayServer::bind(Arc::clone(&relay), config.relay_addr.port()).await?;
//!     println!("executor URL: {}", server.ws_url());
//!
//!     // Tool dispatch over HTTP.
//!     let ctx = ToolContext::new(relay).with_command_timeout(config.command_timeout);
//!     let state = AppState::new(ToolRegistry::with_defaults(), ctx);
//!     sketchwire::ingress::serve(config.http_addr, state).await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`agent`] | Capture-agent command façade |
//! | [`bus`] | Cross-realm event channel |
//! | [`config`] | Host configuration |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe id wrappers |
//! | [`ingress`] | HTTP front door |
//! | [`model`] | Extraction data model |
//! | [`protocol`] | Relay wire protocol (internal) |
//! | [`relay`] | Session manager and executor transport |
//! | [`storage`] | Saved-component store |
//! | [`tools`] | Tool dispatch layer |

// ============================================================================
// Modules
// ============================================================================

/// Capture-agent command façade.
///
/// Drives selection and extraction across the page realm boundary.
pub mod agent;

/// Cross-realm event channel.
///
/// Named, payload-carrying events between isolated execution contexts.
pub mod bus;

/// Host configuration.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for relay entities.
///
/// Newtype wrappers prevent mixing incompatible ids at compile time.
pub mod identifiers;

/// HTTP front door.
///
/// Deserializes external requests into tool dispatch calls.
pub mod ingress;

/// Extraction data model.
///
/// The node/tree and style representation crossing every boundary.
pub mod model;

/// Relay wire protocol message types.
///
/// Internal module defining command/response frame structures.
pub mod protocol;

/// Session manager and executor transport.
///
/// Owns the pending-command set and the single live executor session.
pub mod relay;

/// Saved-component store.
pub mod storage;

/// Tool dispatch layer.
///
/// Name-keyed registry of asynchronous handlers.
pub mod tools;

// ============================================================================
// Re-exports
// ============================================================================

// Capture types
pub use agent::CaptureAgent;
pub use bus::EventBus;

// Configuration
pub use config::Config;

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CommandId, SessionId};

// Ingress types
pub use ingress::AppState;

// Model types
pub use model::{
    BoundingBox, ExtractedNode, NodeKind, Rgba, StyleSnapshot, is_visible, resolve_var_fallbacks,
};

// Relay types
pub use relay::{Relay, RelayServer, Session};

// Storage types
pub use storage::{AuthStore, ComponentStore, SavedComponent};

// Tool types
pub use tools::{Tool, ToolContext, ToolRegistry};
