//! Authentication tools.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{Error, Result};

use super::{Tool, ToolContext, parse_args};

// ============================================================================
// SetAccessTokenTool
// ============================================================================

#[derive(Deserialize)]
struct TokenArgs {
    token: String,
}

/// Stores the operator's access token.
pub struct SetAccessTokenTool;

#[async_trait]
impl Tool for SetAccessTokenTool {
    fn name(&self) -> &'static str {
        "set_access_token"
    }

    async fn call(&self, args: Value, ctx: &ToolContext) -> Result<Value> {
        let args: TokenArgs = parse_args(args)?;
        if args.token.trim().is_empty() {
            return Err(Error::validation("token must not be empty"));
        }

        ctx.auth.set_token(args.token);
        Ok(json!({ "authenticated": true }))
    }
}

// ============================================================================
// AuthStatusTool
// ============================================================================

/// Reports whether an access token is stored.
pub struct AuthStatusTool;

#[async_trait]
impl Tool for AuthStatusTool {
    fn name(&self) -> &'static str {
        "auth_status"
    }

    async fn call(&self, _args: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({ "authenticated": ctx.auth.is_authenticated() }))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::relay::Relay;
    use crate::tools::ToolRegistry;

    #[tokio::test]
    async fn test_token_lifecycle() {
        let registry = ToolRegistry::with_defaults();
        let ctx = ToolContext::new(Relay::new());

        let status = registry.handle("auth_status", json!({}), &ctx).await;
        assert_eq!(status["authenticated"], false);

        let set = registry
            .handle("set_access_token", json!({ "token": "sk-42" }), &ctx)
            .await;
        assert_eq!(set["authenticated"], true);

        let status = registry.handle("auth_status", json!({}), &ctx).await;
        assert_eq!(status["authenticated"], true);
    }

    #[tokio::test]
    async fn test_empty_token_rejected() {
        let registry = ToolRegistry::with_defaults();
        let ctx = ToolContext::new(Relay::new());

        let result = registry
            .handle("set_access_token", json!({ "token": "" }), &ctx)
            .await;
        assert!(result.get("error").is_some());
        assert!(!ctx.auth.is_authenticated());
    }
}
