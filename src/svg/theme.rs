//! Theme system - CSS custom property-based theming for SVG diagrams.
//!
//! Architecture:
//!   - Two required variables: --bg (background) and --fg (foreground)
//!   - Optional enrichment variables: --line, --accent, --muted, --surface, --border
//!   - Unset optionals fall back to color-mix() derivations from bg + fg
//!
//! Built-in themes live in a fixed table; the registry over it is built on
//! first use and never changes afterwards.

use crate::error::{RenderError, Result};
use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::HashMap;

/// A named colour scheme plus the font used for labels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Theme {
    pub name: &'static str,
    /// Background color → CSS variable --bg
    pub bg: &'static str,
    /// Foreground / primary text color → CSS variable --fg
    pub fg: &'static str,
    /// Edge/connector color → CSS variable --line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<&'static str>,
    /// Arrow heads, highlights → CSS variable --accent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<&'static str>,
    /// Secondary text, edge labels → CSS variable --muted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<&'static str>,
    /// Node/box fill tint → CSS variable --surface
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface: Option<&'static str>,
    /// Node stroke color → CSS variable --border
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<&'static str>,
    pub font_family: &'static str,
    pub font_size: f64,
}

const FONT: &str = "Inter";
const FONT_SIZE: f64 = 13.0;

const fn theme(
    name: &'static str,
    bg: &'static str,
    fg: &'static str,
    line: Option<&'static str>,
    accent: Option<&'static str>,
    muted: Option<&'static str>,
) -> Theme {
    Theme {
        name,
        bg,
        fg,
        line,
        accent,
        muted,
        surface: None,
        border: None,
        font_family: FONT,
        font_size: FONT_SIZE,
    }
}

/// Built-in themes in listing order.
pub const THEMES: &[Theme] = &[
    // Mermaid default: background = 'white', textColor = '#333',
    // lineColor = '#333333', mainBkg = '#ECECFF', border1 = '#9370DB'
    Theme {
        name: "default",
        bg: "#FFFFFF",
        fg: "#333333",
        line: Some("#333333"),
        accent: Some("#333333"),
        muted: Some("#666666"),
        surface: Some("#ECECFF"),
        border: Some("#9370DB"),
        font_family: FONT,
        font_size: FONT_SIZE,
    },
    // Mermaid dark: background = '#333', textColor = '#ccc',
    // lineColor = 'lightgrey', mainBkg = '#1f2020', border1 = '#ccc'
    Theme {
        name: "dark",
        bg: "#333333",
        fg: "#CCCCCC",
        line: Some("#AAAAAA"),
        accent: Some("#CCCCCC"),
        muted: Some("#888888"),
        surface: Some("#1F2020"),
        border: Some("#CCCCCC"),
        font_family: FONT,
        font_size: FONT_SIZE,
    },
    theme("zinc-light", "#FFFFFF", "#27272A", None, None, None),
    theme("zinc-dark", "#18181B", "#FAFAFA", None, None, None),
    theme("tokyo-night", "#1A1B26", "#A9B1D6", Some("#3D59A1"), Some("#7AA2F7"), Some("#565F89")),
    theme("tokyo-night-storm", "#24283B", "#A9B1D6", Some("#3D59A1"), Some("#7AA2F7"), Some("#565F89")),
    theme("tokyo-night-light", "#D5D6DB", "#343B58", Some("#34548A"), Some("#34548A"), Some("#9699A3")),
    theme("catppuccin-mocha", "#1E1E2E", "#CDD6F4", Some("#585B70"), Some("#CBA6F7"), Some("#6C7086")),
    theme("catppuccin-latte", "#EFF1F5", "#4C4F69", Some("#9CA0B0"), Some("#8839EF"), Some("#9CA0B0")),
    theme("nord", "#2E3440", "#D8DEE9", Some("#4C566A"), Some("#88C0D0"), Some("#616E88")),
    theme("nord-light", "#ECEFF4", "#2E3440", Some("#AAB1C0"), Some("#5E81AC"), Some("#7B88A1")),
    theme("dracula", "#282A36", "#F8F8F2", Some("#6272A4"), Some("#BD93F9"), Some("#6272A4")),
    theme("github-light", "#FFFFFF", "#1F2328", Some("#D1D9E0"), Some("#0969DA"), Some("#59636E")),
    theme("github-dark", "#0D1117", "#E6EDF3", Some("#3D444D"), Some("#4493F8"), Some("#9198A1")),
    theme("solarized-light", "#FDF6E3", "#657B83", Some("#93A1A1"), Some("#268BD2"), Some("#93A1A1")),
    theme("solarized-dark", "#002B36", "#839496", Some("#586E75"), Some("#268BD2"), Some("#586E75")),
    theme("one-dark", "#282C34", "#ABB2BF", Some("#4B5263"), Some("#C678DD"), Some("#5C6370")),
];

lazy_static! {
    static ref REGISTRY: HashMap<&'static str, &'static Theme> =
        THEMES.iter().map(|t| (t.name, t)).collect();
}

/// The theme used when none is named.
pub fn default_theme() -> &'static Theme {
    &THEMES[0]
}

/// Look up a built-in theme by name.
pub fn lookup(name: &str) -> Option<&'static Theme> {
    REGISTRY.get(name).copied()
}

/// Names of all built-in themes, in table order.
pub fn names() -> impl Iterator<Item = &'static str> {
    THEMES.iter().map(|t| t.name)
}

/// The named theme, or the default one when no name is given.
pub fn resolve(name: Option<&str>) -> Result<&'static Theme> {
    match name {
        None => Ok(default_theme()),
        Some(name) => lookup(name).ok_or_else(|| RenderError::Theme(name.to_string())),
    }
}

/// color-mix() weights for derived CSS variables
pub struct Mix;

impl Mix {
    pub const TEXT_SEC: u8 = 60;
    pub const TEXT_MUTED: u8 = 40;
    pub const LINE: u8 = 30;
    pub const ARROW: u8 = 50;
    pub const NODE_FILL: u8 = 3;
    pub const NODE_STROKE: u8 = 20;
    pub const INNER_STROKE: u8 = 12;
}

/// Build the <style> block with font imports and derived CSS variables.
pub fn build_style_block(font: &str) -> String {
    let font_encoded = font.replace(' ', "%20");

    let derived_vars = format!(
        r#"
    /* Derived from --bg and --fg (overridable via --line, --accent, etc.) */
    --_text:          var(--fg);
    --_text-sec:      var(--muted, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_text-muted:    var(--muted, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_line:          var(--line, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_arrow:         var(--accent, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_node-fill:     var(--surface, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_node-stroke:   var(--border, color-mix(in srgb, var(--fg) {}%, var(--bg)));
    --_inner-stroke:  color-mix(in srgb, var(--fg) {}%, var(--bg));"#,
        Mix::TEXT_SEC,
        Mix::TEXT_MUTED,
        Mix::LINE,
        Mix::ARROW,
        Mix::NODE_FILL,
        Mix::NODE_STROKE,
        Mix::INNER_STROKE,
    );

    format!(
        r#"<style>
  @import url('https://fonts.googleapis.com/css2?family={}:wght@400;500;600;700&amp;display=swap');
  text {{ font-family: '{}', system-ui, sans-serif; }}
  svg {{{}
  }}
</style>"#,
        font_encoded, font, derived_vars
    )
}

/// Build the SVG opening tag with CSS variables set as inline styles.
pub fn svg_open_tag(width: f64, height: f64, theme: &Theme, transparent: bool) -> String {
    let mut vars = vec![format!("--bg:{}", theme.bg), format!("--fg:{}", theme.fg)];

    let optional = [
        ("line", theme.line),
        ("accent", theme.accent),
        ("muted", theme.muted),
        ("surface", theme.surface),
        ("border", theme.border),
    ];
    for (var, value) in optional {
        if let Some(value) = value {
            vars.push(format!("--{}:{}", var, value));
        }
    }

    let vars_str = vars.join(";");
    let bg_style = if transparent {
        ""
    } else {
        ";background:var(--bg)"
    };

    let w_str = super::renderer::fmt_num(width);
    let h_str = super::renderer::fmt_num(height);

    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" width="{}" height="{}" style="{}{}">"#,
        w_str, h_str, w_str, h_str, vars_str, bg_style
    )
}
