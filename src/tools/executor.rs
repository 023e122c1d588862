//! Executor-forwarding tools.
//!
//! Each handler validates what it can locally, builds a typed command, and
//! awaits its settlement through the relay. A `Disconnected` or `Timeout`
//! failure surfaces as the same structured error shape every other tool
//! fault does.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::resolve_var_fallbacks;
use crate::protocol::{
    BooleanOperator, CombineParams, ExecutorCommand, ExportFormat, ExportParams,
    ReconstructParams, SelectionParams,
};

use super::{Tool, ToolContext, parse_args};

// ============================================================================
// CombineTool
// ============================================================================

#[derive(Deserialize)]
struct CombineArgs {
    #[serde(rename = "nodeIds")]
    node_ids: Vec<String>,
    operator: BooleanOperator,
}

/// Boolean-combines nodes under their shared parent.
pub struct CombineTool;

#[async_trait]
impl Tool for CombineTool {
    fn name(&self) -> &'static str {
        "boolean_combine"
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let args: CombineArgs = parse_args(args)?;
        let params = CombineParams {
            node_ids: args.node_ids,
            operator: args.operator,
        };
        params.validate()?;

        ctx.relay
            .send(ExecutorCommand::Combine(params), ctx.command_timeout)
            .await
    }
}

// ============================================================================
// ExportTool
// ============================================================================

#[derive(Deserialize)]
struct ExportArgs {
    #[serde(rename = "nodeId")]
    node_id: String,
    /// Format name; unrecognized values fall back to PNG.
    format: Option<String>,
    scale: Option<f64>,
}

/// Renders a node to an image payload.
pub struct ExportTool;

#[async_trait]
impl Tool for ExportTool {
    fn name(&self) -> &'static str {
        "export_node"
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let args: ExportArgs = parse_args(args)?;
        let format = args
            .format
            .as_deref()
            .map_or_else(ExportFormat::default, ExportFormat::from_name);
        let mut params = ExportParams::new(args.node_id);
        params.format = format;
        if let Some(scale) = args.scale {
            params.scale = scale;
        }

        let result = ctx
            .relay
            .send(ExecutorCommand::Export(params), ctx.command_timeout)
            .await?;

        // The executor returns the rendered bytes base64-encoded; decode to
        // verify the payload and report its size alongside.
        let data = result
            .get("data")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::parse("export response missing data field"))?;
        let bytes = Base64Standard
            .decode(data)
            .map_err(|e| Error::parse(format!("export payload is not valid base64: {e}")))?;

        debug!(format = ?format, bytes = bytes.len(), "Export payload received");

        Ok(json!({
            "format": format,
            "data": data,
            "byteLength": bytes.len(),
        }))
    }
}

// ============================================================================
// SelectionTool
// ============================================================================

/// Selects nodes, optionally framing the viewport on them.
pub struct SelectionTool;

#[async_trait]
impl Tool for SelectionTool {
    fn name(&self) -> &'static str {
        "set_selection"
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let params: SelectionParams = parse_args(args)?;

        ctx.relay
            .send(ExecutorCommand::Selection(params), ctx.command_timeout)
            .await
    }
}

// ============================================================================
// ReconstructTool
// ============================================================================

#[derive(Deserialize)]
struct ReconstructArgs {
    vector: String,
    width: Option<f64>,
    height: Option<f64>,
}

/// Rebuilds a captured vector payload inside the design tool.
pub struct ReconstructTool;

#[async_trait]
impl Tool for ReconstructTool {
    fn name(&self) -> &'static str {
        "reconstruct_vector"
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let args: ReconstructArgs = parse_args(args)?;
        if args.vector.trim().is_empty() {
            return Err(Error::validation("vector payload must not be empty"));
        }

        // The executor's importer ignores custom properties; resolve every
        // var() reference to its literal fallback before it crosses the
        // relay.
        let params = ReconstructParams {
            vector: resolve_var_fallbacks(&args.vector),
            width: args.width,
            height: args.height,
        };

        ctx.relay
            .send(ExecutorCommand::Reconstruct(params), ctx.command_timeout)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
