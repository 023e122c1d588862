//! Relay wire protocol message types.
//!
//! Defines the frame format exchanged with the design-tool executor and the
//! typed command surface built on top of it.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | [`CommandEnvelope`] | Relay → Executor | Command request |
//! | [`ResponseFrame`] | Executor → Relay | Command response |
//!
//! One JSON text frame per message; the response `id` echoes the request id
//! exactly.
//!
//! # Command Naming
//!
//! Command kinds follow `module.methodName` format:
//!
//! - `node.combine`
//! - `node.export`
//! - `selection.set`
//! - `vector.reconstruct`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Executor command surface and contract validation |
//! | `envelope` | Wire frame types |

// ============================================================================
// Submodules
// ============================================================================

/// Executor command surface and contract validation.
pub mod command;

/// Wire frame types.
pub mod envelope;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    BooleanOperator, CombineParams, ExecutorCommand, ExportFormat, ExportParams, PlaceholderSpec,
    ReconstructParams, SelectionParams, TargetKind, ensure_combinable, ensure_exportable,
};
pub use envelope::{CommandEnvelope, ResponseFrame};
