//! Static script catalog.
//!
//! The capture side is driven by injectable scripts served to the page.
//! Their sources ship with the host application; the relay only knows the
//! catalog — names, purposes, and the events each script participates in —
//! so agents can discover what is available.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::Result;

use super::{Tool, ToolContext};

// ============================================================================
// ScriptEntry
// ============================================================================

/// One injectable capture script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptEntry {
    /// Script name.
    pub name: String,

    /// What the script does.
    pub description: String,

    /// Bus topics the script publishes or answers.
    pub topics: Vec<String>,
}

impl ScriptEntry {
    fn new(name: &str, description: &str, topics: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            topics: topics.iter().map(ToString::to_string).collect(),
        }
    }
}

// ============================================================================
// ScriptCatalog
// ============================================================================

/// The scripts bundled with the capture side.
#[derive(Debug, Clone, Default)]
pub struct ScriptCatalog {
    entries: Vec<ScriptEntry>,
}

impl ScriptCatalog {
    /// Creates an empty catalog.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The bundled catalog.
    #[must_use]
    pub fn bundled() -> Self {
        Self {
            entries: vec![
                ScriptEntry::new(
                    "page-extractor",
                    "Walks the DOM from a selector or coordinate and answers with a captured tree",
                    &["extract", "extracted"],
                ),
                ScriptEntry::new(
                    "selection-overlay",
                    "Draws the hover overlay while interactive selection is on",
                    &["begin-select", "end-select"],
                ),
                ScriptEntry::new(
                    "status-reporter",
                    "Answers selection-mode queries from the page realm",
                    &["status-query", "status"],
                ),
            ],
        }
    }

    /// All catalog entries.
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[ScriptEntry] {
        &self.entries
    }
}

// ============================================================================
// ListScriptsTool
// ============================================================================

/// Lists the injectable capture scripts.
pub struct ListScriptsTool;

#[async_trait]
impl Tool for ListScriptsTool {
    fn name(&self) -> &'static str {
        "list_available_scripts"
    }

    async fn call(&self, _args: Value, ctx: &ToolContext) -> Result<Value> {
        Ok(json!({ "scripts": ctx.scripts.entries() }))
    }
}

// ============================================================================
// Tests
// ============================================================================
