//! Captured node tree and geometry.
//!
//! [`ExtractedNode`] is the intermediate representation of one captured
//! visual element, independent of any host API. Children are owned, so the
//! tree is finite and acyclic by construction; child order is source visual
//! order and is preserved end-to-end.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::style::StyleSnapshot;

// ============================================================================
// NodeKind
// ============================================================================

/// Kind of a captured element.
///
/// An explicit discriminant instead of probing node-like values for the
/// presence of geometry or payload fields; match exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Root container of a capture (exempt from the zero-size rule).
    Root,
    /// Generic box with children.
    #[default]
    Container,
    /// Text-bearing element.
    Text,
    /// Raster image element.
    Image,
    /// Vector-drawable element; carries a raw vector payload instead of
    /// recursive children.
    Vector,
    /// Anything else.
    Other,
}

impl NodeKind {
    /// Returns `true` for the capture root container.
    #[inline]
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }
}

// ============================================================================
// BoundingBox
// ============================================================================

/// Bounding geometry in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl BoundingBox {
    /// Creates a bounding box.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if either dimension is zero.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0.0 || self.height == 0.0
    }

    /// Right edge (`x + width`).
    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

// ============================================================================
// ExtractedNode
// ============================================================================

/// A tree node representing one captured visual element.
///
/// # Invariants
///
/// - The tree is acyclic and finite (children are owned values).
/// - Child order is source visual order, preserved end-to-end.
/// - A node carrying a vector payload has no children: the payload is a
///   leaf substitute for recursive decomposition. [`ExtractedNode::validate`]
///   checks this over a whole tree; deserialized input must be validated
///   before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedNode {
    /// Stable identifier of the captured element.
    pub id: String,

    /// Element kind.
    pub kind: NodeKind,

    /// Bounding geometry in device pixels.
    pub bounds: BoundingBox,

    /// Resolved style snapshot.
    #[serde(default)]
    pub style: StyleSnapshot,

    /// Child nodes in source visual order.
    #[serde(default)]
    pub children: Vec<ExtractedNode>,

    /// Raw vector-graphics payload, present only for vector-drawable
    /// elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<String>,

    /// Text payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ExtractedNode {
    /// Creates a node with no children and no payloads.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: NodeKind, bounds: BoundingBox) -> Self {
        Self {
            id: id.into(),
            kind,
            bounds,
            style: StyleSnapshot::default(),
            children: Vec::new(),
            vector: None,
            text: None,
        }
    }

    /// Sets the style snapshot.
    #[must_use]
    pub fn with_style(mut self, style: StyleSnapshot) -> Self {
        self.style = style;
        self
    }

    /// Appends a child, preserving insertion order.
    #[must_use]
    pub fn with_child(mut self, child: ExtractedNode) -> Self {
        self.children.push(child);
        self
    }

    /// Sets the vector payload, discarding any children.
    ///
    /// A vector payload replaces recursive decomposition, so the two are
    /// mutually exclusive.
    #[must_use]
    pub fn with_vector(mut self, vector: impl Into<String>) -> Self {
        self.children.clear();
        self.vector = Some(vector.into());
        self
    }

    /// Sets the text payload.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Returns the total node count of this subtree, including `self`.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ExtractedNode::node_count)
            .sum::<usize>()
    }

    /// Validates tree invariants over this subtree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if a node carries both a vector payload
    /// and children, or has an empty id.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(Error::validation("node id must not be empty"));
        }
        if self.vector.is_some() && !self.children.is_empty() {
            return Err(Error::validation(format!(
                "node '{}' carries a vector payload and children",
                self.id
            )));
        }
        for child in &self.children {
            child.validate()?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
