//! Error types for the sketchwire relay.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use sketchwire::{Result, Error};
//!
//! async fn example(relay: &Arc<Relay>) -> Result<()> {
//!     let result = relay.send_command("node.export", payload, timeout).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Caller | [`Error::Validation`], [`Error::NotFound`], [`Error::UnsupportedType`] |
//! | Relay | [`Error::Timeout`], [`Error::Disconnected`], [`Error::Executor`] |
//! | Transport | [`Error::Parse`], [`Error::WebSocket`], [`Error::ChannelClosed`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::CommandId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Caller Errors
    // ========================================================================
    /// Malformed or insufficient arguments.
    ///
    /// Returned when a command or tool call carries arguments that cannot
    /// be acted on (e.g. fewer than two nodes for a boolean combine).
    #[error("Validation error: {message}")]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// An id or name lookup resolved to nothing.
    #[error("Not found: {what}")]
    NotFound {
        /// What was looked up.
        what: String,
    },

    /// Operation is invalid for the resolved entity kind.
    ///
    /// Returned when a command targets a node the executor cannot operate
    /// on (e.g. exporting a document or page container).
    #[error("Unsupported type: {kind}")]
    UnsupportedType {
        /// The offending entity kind.
        kind: String,
    },

    // ========================================================================
    // Relay Errors
    // ========================================================================
    /// Command deadline elapsed before a response arrived.
    #[error("Command {command_id} timed out after {timeout_ms}ms")]
    Timeout {
        /// The command that timed out.
        command_id: CommandId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// No active executor session, or the session dropped mid-flight.
    #[error("Executor disconnected")]
    Disconnected,

    /// Error carried in an `ok: false` executor response frame.
    #[error("Executor error: {message}")]
    Executor {
        /// Error message echoed from the executor.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Malformed transport body or wire frame.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse failure.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a validation error.
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Creates a not-found error.
    #[inline]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Creates an unsupported-type error.
    #[inline]
    pub fn unsupported_type(kind: impl Into<String>) -> Self {
        Self::UnsupportedType { kind: kind.into() }
    }

    /// Creates a command timeout error.
    #[inline]
    pub fn timeout(command_id: CommandId, timeout_ms: u64) -> Self {
        Self::Timeout {
            command_id,
            timeout_ms,
        }
    }

    /// Creates an executor-reported error.
    #[inline]
    pub fn executor(message: impl Into<String>) -> Self {
        Self::Executor {
            message: message.into(),
        }
    }

    /// Creates a parse error.
    #[inline]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a command timeout.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a disconnect failure.
    #[inline]
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Disconnected | Self::WebSocket(_))
    }

    /// Returns `true` if the fault originated from caller input.
    #[inline]
    #[must_use]
    pub fn is_caller_fault(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::NotFound { .. } | Self::UnsupportedType { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
