//! Dispatch registry and management tools.

// ============================================================================
// Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::error::Result;

use super::auth::{AuthStatusTool, SetAccessTokenTool};
use super::component::{
    DeleteComponentTool, ListComponentsTool, LoadComponentTool, SaveComponentTool,
};
use super::executor::{CombineTool, ExportTool, ReconstructTool, SelectionTool};
use super::scripts::ListScriptsTool;
use super::{Tool, ToolContext};

// ============================================================================
// ToolRegistry
// ============================================================================

/// Name-keyed registry of asynchronous tool handlers.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the full bundled catalog.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        // Component CRUD
        registry.register(Arc::new(SaveComponentTool));
        registry.register(Arc::new(ListComponentsTool));
        registry.register(Arc::new(LoadComponentTool));
        registry.register(Arc::new(DeleteComponentTool));

        // Authentication
        registry.register(Arc::new(SetAccessTokenTool));
        registry.register(Arc::new(AuthStatusTool));

        // Executor forwarding
        registry.register(Arc::new(CombineTool));
        registry.register(Arc::new(ExportTool));
        registry.register(Arc::new(SelectionTool));
        registry.register(Arc::new(ReconstructTool));

        // Script catalog
        registry.register(Arc::new(ListScriptsTool));

        // Management
        registry.register(Arc::new(RelayStatusTool));

        registry
    }

    /// Registers a tool under its name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        debug!(name = tool.name(), "Registering tool");
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Registered tool names, sorted.
    #[must_use]
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Dispatches one tool call.
    ///
    /// Never fails across this boundary: an unknown name or a handler fault
    /// comes back as a structured `{"error": ...}` value; callers inspect
    /// the result shape.
    pub async fn handle(&self, name: &str, args: Value, ctx: &ToolContext) -> Value {
        let Some(tool) = self.tools.get(name) else {
            warn!(tool = name, "Unknown tool");
            return json!({ "error": format!("Unknown tool: {name}") });
        };

        debug!(tool = name, "Dispatching tool");
        match tool.call(args, ctx).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %e, "Tool failed");
                json!({ "error": e.to_string() })
            }
        }
    }
}

// ============================================================================
// RelayStatusTool
// ============================================================================

/// Reports relay/session health.
pub struct RelayStatusTool;

#[async_trait]
impl Tool for RelayStatusTool {
    fn name(&self) -> &'static str {
        "relay_status"
    }

    async fn call(&self, _args: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({
            "activeSessions": ctx.relay.session_count(),
            "pendingCommands": ctx.relay.pending_count(),
        }))
    }
}

// ============================================================================
// Tests
// ============================================================================
