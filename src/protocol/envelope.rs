//! Wire frame types.
//!
//! One JSON text frame per message, in both directions.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::CommandId;

// ============================================================================
// CommandEnvelope
// ============================================================================

/// A command frame from the relay to the executor.
///
/// # Format
///
/// ```json
/// {
///   "id": "uuid",
///   "kind": "node.export",
///   "payload": { ... }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEnvelope {
    /// Correlation id; the response echoes it exactly.
    pub id: CommandId,

    /// Command kind in `module.methodName` format.
    pub kind: String,

    /// Command payload.
    pub payload: Value,
}

impl CommandEnvelope {
    /// Creates an envelope with a fresh correlation id.
    #[inline]
    #[must_use]
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            id: CommandId::generate(),
            kind: kind.into(),
            payload,
        }
    }

    /// Creates an envelope with a specific id.
    #[inline]
    #[must_use]
    pub fn with_id(id: CommandId, kind: impl Into<String>, payload: Value) -> Self {
        Self {
            id,
            kind: kind.into(),
            payload,
        }
    }
}

// ============================================================================
// ResponseFrame
// ============================================================================

/// A response frame from the executor to the relay.
///
/// # Format
///
/// Success:
/// ```json
/// { "id": "uuid", "ok": true, "result": { ... } }
/// ```
///
/// Error:
/// ```json
/// { "id": "uuid", "ok": false, "error": "message" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFrame {
    /// Matches the command id.
    pub id: CommandId,

    /// Whether the command succeeded.
    pub ok: bool,

    /// Result data (if success).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error message (if failure).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseFrame {
    /// Creates a success frame.
    #[inline]
    #[must_use]
    pub fn success(id: CommandId, result: Value) -> Self {
        Self {
            id,
            ok: true,
            result: Some(result),
            error: None,
        }
    }

    /// Creates an error frame.
    #[inline]
    #[must_use]
    pub fn failure(id: CommandId, error: impl Into<String>) -> Self {
        Self {
            id,
            ok: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Extracts the result value, mapping an `ok: false` frame to the
    /// carried error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Executor`] when the frame reports failure.
    pub fn into_result(self) -> Result<Value> {
        if self.ok {
            Ok(self.result.unwrap_or(Value::Null))
        } else {
            let message = self.error.unwrap_or_else(|| "unknown error".to_string());
            Err(Error::executor(message))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
