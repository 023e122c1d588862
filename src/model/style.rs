//! Style snapshots and color normalization.
//!
//! A [`StyleSnapshot`] maps resolved style-property names to their values as
//! captured from the page. Colors normalize to [`Rgba`] with components in
//! `[0, 1]`; numeric lengths normalize to device pixels.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// Rgba
// ============================================================================

/// A normalized RGBA color.
///
/// Each component is a real number in `[0, 1]`; alpha `0` is fully
/// transparent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red component.
    pub r: f64,
    /// Green component.
    pub g: f64,
    /// Blue component.
    pub b: f64,
    /// Alpha component.
    pub a: f64,
}

/// Matches `rgb(...)` / `rgba(...)` and captures the argument list.
static COLOR_FN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rgba?\(\s*(.+?)\s*\)$").unwrap());

impl Rgba {
    /// Creates a color, clamping every component into `[0, 1]`.
    #[must_use]
    pub fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: a.clamp(0.0, 1.0),
        }
    }

    /// Fully transparent black.
    #[inline]
    #[must_use]
    pub const fn transparent() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 0.0,
        }
    }

    /// Returns `true` if the alpha component is exactly zero.
    #[inline]
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }

    /// Parses a CSS color value into a normalized color.
    ///
    /// Supported forms: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`,
    /// `rgb(...)`/`rgba(...)` (comma or slash alpha), `transparent`, and the
    /// basic keyword colors. Returns `None` for anything else.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        if let Some(caps) = COLOR_FN.captures(value) {
            return Self::parse_components(&caps[1]);
        }
        Self::parse_keyword(value)
    }

    /// Parses the hex digits after `#`.
    fn parse_hex(hex: &str) -> Option<Self> {
        let digit = |c: u8| -> Option<u32> { (c as char).to_digit(16) };
        let bytes = hex.as_bytes();

        let (r, g, b, a) = match bytes.len() {
            // Shorthand digits expand by repetition: #f40 -> #ff4400.
            3 | 4 => {
                let c = |i: usize| digit(bytes[i]).map(|d| (d * 17) as f64 / 255.0);
                (
                    c(0)?,
                    c(1)?,
                    c(2)?,
                    if bytes.len() == 4 { c(3)? } else { 1.0 },
                )
            }
            6 | 8 => {
                let c =
                    |i: usize| Some((digit(bytes[i])? * 16 + digit(bytes[i + 1])?) as f64 / 255.0);
                (
                    c(0)?,
                    c(2)?,
                    c(4)?,
                    if bytes.len() == 8 { c(6)? } else { 1.0 },
                )
            }
            _ => return None,
        };

        Some(Self::new(r, g, b, a))
    }

    /// Parses the argument list of `rgb()`/`rgba()`.
    fn parse_components(args: &str) -> Option<Self> {
        let parts: Vec<&str> = args
            .split(|c| c == ',' || c == '/' || char::is_whitespace(c))
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }

        let channel = |s: &str| -> Option<f64> {
            if let Some(pct) = s.strip_suffix('%') {
                pct.trim().parse::<f64>().ok().map(|v| v / 100.0)
            } else {
                s.trim().parse::<f64>().ok().map(|v| v / 255.0)
            }
        };
        let alpha = |s: &str| -> Option<f64> {
            if let Some(pct) = s.strip_suffix('%') {
                pct.trim().parse::<f64>().ok().map(|v| v / 100.0)
            } else {
                s.trim().parse::<f64>().ok()
            }
        };

        Some(Self::new(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            if parts.len() == 4 { alpha(parts[3])? } else { 1.0 },
        ))
    }

    /// Parses the basic CSS keyword colors.
    fn parse_keyword(value: &str) -> Option<Self> {
        let rgb = |r: u8, g: u8, b: u8| {
            Some(Self::new(
                r as f64 / 255.0,
                g as f64 / 255.0,
                b as f64 / 255.0,
                1.0,
            ))
        };
        match value.to_ascii_lowercase().as_str() {
            "transparent" => Some(Self::transparent()),
            "black" => rgb(0, 0, 0),
            "white" => rgb(255, 255, 255),
            "red" => rgb(255, 0, 0),
            "green" => rgb(0, 128, 0),
            "blue" => rgb(0, 0, 255),
            "yellow" => rgb(255, 255, 0),
            "cyan" => rgb(0, 255, 255),
            "magenta" => rgb(255, 0, 255),
            "gray" | "grey" => rgb(128, 128, 128),
            _ => None,
        }
    }
}

// ============================================================================
// StyleSnapshot
// ============================================================================

/// Resolved style-property snapshot for one captured node.
///
/// The map is ordered so serialized snapshots are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct StyleSnapshot(BTreeMap<String, String>);

impl StyleSnapshot {
    /// Creates an empty snapshot.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property value.
    pub fn set(&mut self, property: impl Into<String>, value: impl Into<String>) {
        self.0.insert(property.into(), value.into());
    }

    /// Builder-style property setter.
    #[must_use]
    pub fn with(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(property, value);
        self
    }

    /// Gets a raw property value.
    #[inline]
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0.get(property).map(String::as_str)
    }

    /// Returns the number of captured properties.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no properties were captured.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolved opacity; absent or unparseable values read as fully opaque.
    #[must_use]
    pub fn opacity(&self) -> f64 {
        self.get("opacity")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .map_or(1.0, |v| v.clamp(0.0, 1.0))
    }

    /// Parses a property as a normalized color.
    #[inline]
    #[must_use]
    pub fn color(&self, property: &str) -> Option<Rgba> {
        self.get(property).and_then(Rgba::parse)
    }

    /// Parses a property as a device-pixel length.
    ///
    /// Accepts `"12px"` or a bare number; other units are not resolved here
    /// (the capture side computes styles to pixel values).
    #[must_use]
    pub fn px(&self, property: &str) -> Option<f64> {
        let raw = self.get(property)?.trim();
        let raw = raw.strip_suffix("px").unwrap_or(raw).trim();
        raw.parse::<f64>().ok()
    }
}

impl FromIterator<(String, String)> for StyleSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_long_form() {
        let c = Rgba::parse("#ff0080").expect("parse");
        assert_eq!(c.r, 1.0);
        assert_eq!(c.g, 0.0);
        assert!((c.b - 128.0 / 255.0).abs() < 1e-9);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_hex_short_form() {
        let c = Rgba::parse("#f40").expect("parse");
        assert_eq!(c.r, 1.0);
        assert!((c.g - 68.0 / 255.0).abs() < 1e-9);
        assert_eq!(c.b, 0.0);
    }

    #[test]
    fn test_hex_with_alpha() {
        let c = Rgba::parse("#00000000").expect("parse");
        assert!(c.is_transparent());

        let c = Rgba::parse("#000f").expect("parse");
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn test_rgb_function() {
        let c = Rgba::parse("rgb(255, 0, 0)").expect("parse");
        assert_eq!(c, Rgba::new(1.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_rgba_function() {
        let c = Rgba::parse("rgba(0, 0, 0, 0)").expect("parse");
        assert!(c.is_transparent());

        let c = Rgba::parse("rgba(255, 255, 255, 0.5)").expect("parse");
        assert_eq!(c.a, 0.5);
    }

    #[test]
    fn test_rgb_slash_alpha() {
        let c = Rgba::parse("rgb(255 0 0 / 0.25)").expect("parse");
        assert_eq!(c.r, 1.0);
        assert_eq!(c.a, 0.25);
    }

    #[test]
    fn test_rgb_percent_channels() {
        let c = Rgba::parse("rgb(100%, 0%, 50%)").expect("parse");
        assert_eq!(c.r, 1.0);
        assert_eq!(c.b, 0.5);
    }

    #[test]
    fn test_keywords() {
        assert!(Rgba::parse("transparent").expect("parse").is_transparent());
        assert_eq!(Rgba::parse("white"), Some(Rgba::new(1.0, 1.0, 1.0, 1.0)));
        assert_eq!(
            Rgba::parse("GREEN"),
            Some(Rgba::new(0.0, 128.0 / 255.0, 0.0, 1.0))
        );
    }

    #[test]
    fn test_unparseable_color() {
        assert_eq!(Rgba::parse("conic-gradient(red, blue)"), None);
        assert_eq!(Rgba::parse("#12"), None);
        assert_eq!(Rgba::parse("rgb(1,2)"), None);
    }

    #[test]
    fn test_components_clamped() {
        let c = Rgba::new(2.0, -1.0, 0.5, 7.0);
        assert_eq!(c, Rgba::new(1.0, 0.0, 0.5, 1.0));
    }

    #[test]
    fn test_snapshot_accessors() {
        let style = StyleSnapshot::new()
            .with("opacity", "0.5")
            .with("margin-left", "12px")
            .with("background-color", "rgb(0, 0, 255)");

        assert_eq!(style.opacity(), 0.5);
        assert_eq!(style.px("margin-left"), Some(12.0));
        assert_eq!(
            style.color("background-color"),
            Some(Rgba::new(0.0, 0.0, 1.0, 1.0))
        );
        assert_eq!(style.px("margin-top"), None);
    }

    #[test]
    fn test_opacity_defaults_opaque() {
        assert_eq!(StyleSnapshot::new().opacity(), 1.0);
        assert_eq!(StyleSnapshot::new().with("opacity", "bogus").opacity(), 1.0);
    }

    #[test]
    fn test_snapshot_deterministic_serialization() {
        let a = StyleSnapshot::new().with("b", "2").with("a", "1");
        let b = StyleSnapshot::new().with("a", "1").with("b", "2");
        let ja = serde_json::to_string(&a).expect("serialize");
        let jb = serde_json::to_string(&b).expect("serialize");
        assert_eq!(ja, jb);
    }
}
