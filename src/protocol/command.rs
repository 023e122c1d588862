//! Executor command surface and contract validation.
//!
//! Four command categories cross the relay to the design-tool executor.
//! The executor itself is an external collaborator; this module carries the
//! typed payloads plus the pure parts of its contract — argument validation,
//! the lenient export-format mapping, and the placeholder policy for failed
//! vector conversions — so callers fail fast and tests pin the semantics.
//!
//! # Command Kinds
//!
//! | Kind | Purpose |
//! |------|---------|
//! | `node.combine` | Boolean-combine nodes under their shared parent |
//! | `node.export` | Render a node to an image payload |
//! | `selection.set` | Select nodes, optionally framing the viewport |
//! | `vector.reconstruct` | Rebuild a captured vector payload as a node |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// BooleanOperator
// ============================================================================

/// Boolean-combine operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BooleanOperator {
    /// Union of all inputs.
    Union,
    /// First input minus the rest.
    Subtract,
    /// Intersection of all inputs.
    Intersect,
    /// Symmetric difference.
    Exclude,
}

// ============================================================================
// ExportFormat
// ============================================================================

/// Export image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportFormat {
    /// PNG (default).
    #[default]
    Png,
    /// SVG markup.
    Svg,
    /// JPEG.
    Jpg,
    /// PDF.
    Pdf,
}

impl ExportFormat {
    /// Maps a caller-supplied format name, case-insensitively.
    ///
    /// Unrecognized names silently fall back to PNG — a deliberate leniency
    /// of the export contract, not an error.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "SVG" => Self::Svg,
            "JPG" | "JPEG" => Self::Jpg,
            "PDF" => Self::Pdf,
            _ => Self::Png,
        }
    }
}

// ============================================================================
// TargetKind
// ============================================================================

/// Kind of the design-tool node a command id resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetKind {
    /// The document root.
    Document,
    /// A page container.
    Page,
    /// A frame.
    Frame,
    /// A group.
    Group,
    /// A drawable shape.
    Shape,
    /// A text node.
    Text,
    /// A vector network.
    Vector,
}

impl TargetKind {
    /// Returns `true` for the structural roots no node-level operation may
    /// target.
    #[inline]
    #[must_use]
    pub const fn is_structural_root(&self) -> bool {
        matches!(self, Self::Document | Self::Page)
    }

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "DOCUMENT",
            Self::Page => "PAGE",
            Self::Frame => "FRAME",
            Self::Group => "GROUP",
            Self::Shape => "SHAPE",
            Self::Text => "TEXT",
            Self::Vector => "VECTOR",
        }
    }
}

// ============================================================================
// Contract Validation
// ============================================================================

/// Checks that every combine input is a combinable node kind.
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] if any input resolved to a
/// document or page container.
pub fn ensure_combinable(kinds: &[TargetKind]) -> Result<()> {
    for kind in kinds {
        if kind.is_structural_root() {
            return Err(Error::unsupported_type(kind.as_str()));
        }
    }
    Ok(())
}

/// Checks that a node kind can be exported.
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] for document or page containers.
pub fn ensure_exportable(kind: TargetKind) -> Result<()> {
    if kind.is_structural_root() {
        return Err(Error::unsupported_type(kind.as_str()));
    }
    Ok(())
}

// ============================================================================
// Parameter Structs
// ============================================================================

fn default_scale() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

/// Parameters for `node.combine`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombineParams {
    /// Input node ids; all must share one parent container.
    #[serde(rename = "nodeIds")]
    pub node_ids: Vec<String>,

    /// Combine operator.
    pub operator: BooleanOperator,
}

impl CombineParams {
    /// Validates argument arity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] with fewer than two node ids.
    pub fn validate(&self) -> Result<()> {
        if self.node_ids.len() < 2 {
            return Err(Error::validation(format!(
                "boolean combine requires at least 2 nodes, got {}",
                self.node_ids.len()
            )));
        }
        Ok(())
    }
}

/// Parameters for `node.export`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportParams {
    /// Node to export.
    #[serde(rename = "nodeId")]
    pub node_id: String,

    /// Image format.
    #[serde(default)]
    pub format: ExportFormat,

    /// Render scale factor.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl ExportParams {
    /// Creates export parameters with the default format and scale.
    #[inline]
    #[must_use]
    pub fn new(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            format: ExportFormat::default(),
            scale: default_scale(),
        }
    }
}

/// Parameters for `selection.set`.
///
/// Ids that do not resolve, or that resolve to structural roots, are
/// silently skipped by the executor rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionParams {
    /// Nodes to select.
    #[serde(rename = "nodeIds")]
    pub node_ids: Vec<String>,

    /// Frame the viewport on the resulting selection.
    #[serde(rename = "zoomToFit", default = "default_true")]
    pub zoom_to_fit: bool,
}

/// Parameters for `vector.reconstruct`.
///
/// The payload must already have custom-property fallbacks resolved; the
/// executor's importer ignores `var()` references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructParams {
    /// Resolved vector payload.
    pub vector: String,

    /// Target width in device pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    /// Target height in device pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl ReconstructParams {
    /// Requested target size, defaulting to 24×24.
    #[must_use]
    pub fn target_size(&self) -> (f64, f64) {
        (
            self.width.unwrap_or(PLACEHOLDER_SIZE),
            self.height.unwrap_or(PLACEHOLDER_SIZE),
        )
    }
}

// ============================================================================
// PlaceholderSpec
// ============================================================================

/// Default edge length for the conversion-fault placeholder.
pub const PLACEHOLDER_SIZE: f64 = 24.0;

/// Marker name the executor reports for a substituted placeholder.
pub const PLACEHOLDER_NAME: &str = "vector-placeholder";

/// The container substituted when vector conversion faults.
///
/// A malformed capture must never abort a batch: the executor swallows the
/// conversion fault, creates this placeholder at the requested (or default)
/// size, and reports success under the marker name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderSpec {
    /// Marker name.
    pub name: String,

    /// Placeholder width.
    pub width: f64,

    /// Placeholder height.
    pub height: f64,
}

impl PlaceholderSpec {
    /// Builds the placeholder for a reconstruct request.
    #[must_use]
    pub fn for_request(params: &ReconstructParams) -> Self {
        let (width, height) = params.target_size();
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            width,
            height,
        }
    }
}

// ============================================================================
// ExecutorCommand
// ============================================================================

/// All executor commands, tagged by wire kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum ExecutorCommand {
    /// Boolean-combine nodes under their shared parent.
    #[serde(rename = "node.combine")]
    Combine(CombineParams),

    /// Render a node to an image payload.
    #[serde(rename = "node.export")]
    Export(ExportParams),

    /// Select nodes, optionally framing the viewport.
    #[serde(rename = "selection.set")]
    Selection(SelectionParams),

    /// Rebuild a captured vector payload as a node.
    #[serde(rename = "vector.reconstruct")]
    Reconstruct(ReconstructParams),
}

impl ExecutorCommand {
    /// Wire kind of this command.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Combine(_) => "node.combine",
            Self::Export(_) => "node.export",
            Self::Selection(_) => "selection.set",
            Self::Reconstruct(_) => "vector.reconstruct",
        }
    }

    /// Serializes the payload half of the wire frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if the payload cannot be serialized.
    pub fn into_payload(self) -> Result<Value> {
        let value = match self {
            Self::Combine(p) => serde_json::to_value(p)?,
            Self::Export(p) => serde_json::to_value(p)?,
            Self::Selection(p) => serde_json::to_value(p)?,
            Self::Reconstruct(p) => serde_json::to_value(p)?,
        };
        Ok(value)
    }
}

// ============================================================================
// Tests
// ============================================================================
