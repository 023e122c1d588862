//! Pure visibility classification.
//!
//! Decides whether a captured node belongs in the extracted tree. The
//! verdict is a pure, total function of the node's kind, geometry, and style
//! snapshot; it is recomputed per extraction pass and never stored on the
//! node.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;

use super::node::{BoundingBox, NodeKind};
use super::style::StyleSnapshot;

// ============================================================================
// Constants
// ============================================================================

/// Absolutely positioned boxes parked further than this past the viewport
/// origin are treated as intentionally hidden (the offscreen idiom).
const OFFSCREEN_LIMIT: f64 = 5000.0;

/// Matches the all-zero clip rectangle accessibility-hiding idiom,
/// `clip: rect(0, 0, 0, 0)` with or without `px` units.
static ZERO_CLIP_RECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rect\(\s*0(?:px)?\s*,?\s*0(?:px)?\s*,?\s*0(?:px)?\s*,?\s*0(?:px)?\s*\)$")
        .unwrap()
});

// ============================================================================
// Classification
// ============================================================================

/// Classifies one captured node as visible or hidden.
///
/// A node is hidden when any of these holds:
///
/// - `display` is `none`
/// - `visibility` is `hidden`
/// - opacity resolves to exactly `0`
/// - the bounding box has zero width or height and the node is not the
///   root container
/// - an all-zero `clip` rectangle is set
/// - `clip-path` is `inset(50%)`
/// - the node is absolutely or fixed positioned and its right or bottom
///   edge lies more than 5000 device pixels before the viewport origin
///
/// All other nodes are visible.
#[must_use]
pub fn is_visible(kind: NodeKind, bounds: &BoundingBox, style: &StyleSnapshot) -> bool {
    if style.get("display").is_some_and(|v| v.trim() == "none") {
        return false;
    }

    if style
        .get("visibility")
        .is_some_and(|v| v.trim() == "hidden")
    {
        return false;
    }

    if style.opacity() == 0.0 {
        return false;
    }

    if bounds.is_empty() && !kind.is_root() {
        return false;
    }

    if style
        .get("clip")
        .is_some_and(|v| ZERO_CLIP_RECT.is_match(v.trim()))
    {
        return false;
    }

    if style
        .get("clip-path")
        .is_some_and(|v| v.replace(' ', "") == "inset(50%)")
    {
        return false;
    }

    let offscreen_positioned = style
        .get("position")
        .is_some_and(|v| matches!(v.trim(), "absolute" | "fixed"));
    if offscreen_positioned
        && (bounds.right() < -OFFSCREEN_LIMIT || bounds.bottom() < -OFFSCREEN_LIMIT)
    {
        return false;
    }

    true
}

// ============================================================================
// Tests
// ============================================================================
