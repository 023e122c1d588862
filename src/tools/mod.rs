//! Tool dispatch layer.
//!
//! A name-keyed registry of asynchronous handlers. Each handler either
//! answers locally (storage, auth, static catalogs) or issues a command
//! through the relay and awaits its settlement. Faults never cross the
//! dispatch boundary: the registry converts every failure into a structured
//! `{"error": ...}` value, so callers distinguish success from failure by
//! result shape, not by exception type.
//!
//! # Handler Groups
//!
//! | Module | Tools |
//! |--------|-------|
//! | `component` | `save_component`, `list_components`, `load_component`, `delete_component` |
//! | `auth` | `set_access_token`, `auth_status` |
//! | `executor` | `boolean_combine`, `export_node`, `set_selection`, `reconstruct_vector` |
//! | `scripts` | `list_available_scripts` |
//! | `registry` | dispatch + `relay_status` |

// ============================================================================
// Submodules
// ============================================================================

/// Authentication tools.
pub mod auth;

/// Component CRUD tools.
pub mod component;

/// Executor-forwarding tools.
pub mod executor;

/// Dispatch registry and management tools.
pub mod registry;

/// Static script catalog.
pub mod scripts;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::relay::Relay;
use crate::relay::core::DEFAULT_COMMAND_TIMEOUT;
use crate::storage::{AuthStore, ComponentStore};

use scripts::ScriptCatalog;

// ============================================================================
// Re-exports
// ============================================================================

pub use registry::ToolRegistry;

// ============================================================================
// Tool
// ============================================================================

/// One named asynchronous handler.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as exposed to callers.
    fn name(&self) -> &'static str;

    /// Runs the handler.
    ///
    /// # Errors
    ///
    /// Any error is converted to a structured `{"error"}` result by the
    /// registry; handlers are free to use the full taxonomy.
    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value>;
}

// ============================================================================
// ToolContext
// ============================================================================

/// Collaborators shared by every handler.
///
/// Handlers never touch executor transport directly; forwarding goes
/// through the relay's public operations.
#[derive(Clone)]
pub struct ToolContext {
    /// Command relay to the executor.
    pub relay: Arc<Relay>,

    /// Saved-component store.
    pub components: Arc<ComponentStore>,

    /// Access-token slot.
    pub auth: Arc<AuthStore>,

    /// Static script catalog.
    pub scripts: Arc<ScriptCatalog>,

    /// Timeout applied to forwarded executor commands.
    pub command_timeout: Duration,
}

impl ToolContext {
    /// Creates a context over a relay with fresh local collaborators.
    #[must_use]
    pub fn new(relay: Arc<Relay>) -> Self {
        Self {
            relay,
            components: Arc::new(ComponentStore::new()),
            auth: Arc::new(AuthStore::new()),
            scripts: Arc::new(ScriptCatalog::bundled()),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Overrides the forwarded-command timeout.
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}

// ============================================================================
// Argument Parsing
// ============================================================================

/// Deserializes tool arguments, mapping failures to `Validation`.
pub(crate) fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| Error::validation(format!("invalid arguments: {e}")))
}
