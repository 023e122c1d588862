//! Component CRUD tools.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{Error, Result};
use crate::model::ExtractedNode;

use super::{Tool, ToolContext, parse_args};

// ============================================================================
// Arguments
// ============================================================================

#[derive(Deserialize)]
struct SaveArgs {
    name: String,
    node: ExtractedNode,
}

/// Lookup key: a storage id or an operator-chosen name.
#[derive(Deserialize)]
struct KeyArgs {
    key: String,
}

// ============================================================================
// SaveComponentTool
// ============================================================================

/// Saves a captured tree under a name.
pub struct SaveComponentTool;

#[async_trait]
impl Tool for SaveComponentTool {
    fn name(&self) -> &'static str {
        "save_component"
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let args: SaveArgs = parse_args(args)?;
        if args.name.trim().is_empty() {
            return Err(Error::validation("component name must not be empty"));
        }
        args.node.validate()?;

        let saved = ctx.components.save(args.name, args.node);
        Ok(json!({
            "id": saved.id,
            "name": saved.name,
            "createdAt": saved.created_at,
        }))
    }
}

// ============================================================================
// ListComponentsTool
// ============================================================================

/// Lists saved components, newest first.
pub struct ListComponentsTool;

#[async_trait]
impl Tool for ListComponentsTool {
    fn name(&self) -> &'static str {
        "list_components"
    }

    async fn call(&self, _args: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({ "components": ctx.components.list() }))
    }
}

// ============================================================================
// LoadComponentTool
// ============================================================================

/// Loads a saved component by id or name.
pub struct LoadComponentTool;

#[async_trait]
impl Tool for LoadComponentTool {
    fn name(&self) -> &'static str {
        "load_component"
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let args: KeyArgs = parse_args(args)?;
        let component = ctx
            .components
            .get(&args.key)
            .ok_or_else(|| Error::not_found(format!("component '{}'", args.key)))?;

        Ok(serde_json::to_value(component)?)
    }
}

// ============================================================================
// DeleteComponentTool
// ============================================================================

/// Deletes a saved component by id or name.
pub struct DeleteComponentTool;

#[async_trait]
impl Tool for DeleteComponentTool {
    fn name(&self) -> &'static str {
        "delete_component"
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let args: KeyArgs = parse_args(args)?;
        if !ctx.components.delete(&args.key) {
            return Err(Error::not_found(format!("component '{}'", args.key)));
        }
        Ok(json!({ "deleted": true }))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{BoundingBox, NodeKind};
    use crate::relay::Relay;
    use crate::tools::ToolRegistry;

    fn context() -> ToolContext {
        ToolContext::new(Relay::new())
    }

    fn node_json() -> Value {
        serde_json::to_value(ExtractedNode::new(
            "n1",
            NodeKind::Container,
            BoundingBox::new(0.0, 0.0, 40.0, 20.0),
        ))
        .expect("serialize")
    }

    #[tokio::test]
    async fn test_save_load_delete_roundtrip() {
        let registry = ToolRegistry::with_defaults();
        let ctx = context();

        let saved = registry
            .handle("save_component", json!({ "name": "navbar", "node": node_json() }), &ctx)
            .await;
        assert!(saved.get("error").is_none(), "save failed: {saved}");

        let loaded = registry
            .handle("load_component", json!({ "key": "navbar" }), &ctx)
            .await;
        assert_eq!(loaded["data"]["id"], "n1");

        let listed = registry.handle("list_components", json!({}), &ctx).await;
        assert_eq!(listed["components"].as_array().expect("array").len(), 1);

        let deleted = registry
            .handle("delete_component", json!({ "key": saved["id"] }), &ctx)
            .await;
        assert_eq!(deleted["deleted"], true);
        assert!(ctx.components.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_is_not_found() {
        let registry = ToolRegistry::with_defaults();
        let result = registry
            .handle("load_component", json!({ "key": "ghost" }), &context())
            .await;
        assert_eq!(result["error"], "Not found: component 'ghost'");
    }

    #[tokio::test]
    async fn test_save_rejects_empty_name() {
        let registry = ToolRegistry::with_defaults();
        let result = registry
            .handle("save_component", json!({ "name": "  ", "node": node_json() }), &context())
            .await;
        assert!(
            result["error"]
                .as_str()
                .expect("error")
                .starts_with("Validation error")
        );
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_tree() {
        let registry = ToolRegistry::with_defaults();
        let mut node = node_json();
        node["vector"] = json!("<svg/>");
        node["children"] = json!([{
            "id": "c1",
            "kind": "text",
            "bounds": { "x": 0.0, "y": 0.0, "width": 1.0, "height": 1.0 }
        }]);

        let result = registry
            .handle("save_component", json!({ "name": "bad", "node": node }), &context())
            .await;
        assert!(result.get("error").is_some());
    }

    #[tokio::test]
    async fn test_malformed_args_are_validation_errors() {
        let registry = ToolRegistry::with_defaults();
        let result = registry
            .handle("load_component", json!({ "nope": 1 }), &context())
            .await;
        assert!(
            result["error"]
                .as_str()
                .expect("error")
                .contains("invalid arguments")
        );
    }
}
