//! mermaid-render - Render Mermaid flowcharts as ASCII/Unicode art and SVG
//!
//! This library parses Mermaid flowchart syntax, lays the graph out on a
//! layered grid and renders it either as box-drawing text or as an SVG
//! document.
//!
//! # Example
//!
//! ```rust
//! use mermaid_render::{render_mermaid, render_mermaid_ascii, AsciiRenderOptions};
//!
//! let ascii = render_mermaid_ascii("graph LR\n  A --> B", &AsciiRenderOptions::default()).unwrap();
//! assert!(ascii.contains('►'));
//!
//! let svg = render_mermaid("graph LR\n  A --> B", None).unwrap();
//! assert!(svg.starts_with("<svg"));
//! ```
//!
//! # Pipeline
//!
//! source → [`parse`] → [`Graph`] → [`layout()`] → [`PositionedGraph`] →
//! [`render_ascii`] | [`render_svg`]

pub mod ascii;
pub mod cli;
pub mod error;
pub mod layout;
pub mod parser;
pub mod svg;
pub mod types;

pub use ascii::render_ascii;
pub use error::{RenderError, Result};
pub use layout::{layout, PositionedGraph};
pub use parser::parse;
pub use svg::{render_svg, render_svg_with_options, SvgRenderOptions, Theme};
pub use types::*;

/// Configuration options for ASCII rendering
#[derive(Debug, Clone)]
pub struct AsciiRenderOptions {
    /// true = ASCII chars (+,-,|,>), false = Unicode box-drawing (┌,─,│,►). Default: false
    pub use_ascii: bool,
    /// Horizontal spacing between nodes. Default: 5
    pub padding_x: usize,
    /// Vertical spacing between nodes. Default: 5
    pub padding_y: usize,
    /// Padding between a label and the left/right box border. Default: 1
    pub box_padding: usize,
}

impl Default for AsciiRenderOptions {
    fn default() -> Self {
        Self {
            use_ascii: false,
            padding_x: 5,
            padding_y: 5,
            box_padding: 1,
        }
    }
}

/// Parse, lay out and render a diagram as text.
///
/// # Example
/// ```rust
/// let opts = mermaid_render::AsciiRenderOptions { use_ascii: true, ..Default::default() };
/// let out = mermaid_render::render_mermaid_ascii("graph TD\n  A --> B", &opts).unwrap();
/// assert!(out.contains('v'));
/// ```
pub fn render_mermaid_ascii(source: &str, options: &AsciiRenderOptions) -> Result<String> {
    let graph = parse(source)?;
    let positioned = layout(&graph)?;
    Ok(render_ascii(&positioned, options))
}

/// Parse, lay out and render a diagram as an SVG document.
///
/// `None` selects the default theme.
pub fn render_mermaid(source: &str, theme: Option<&Theme>) -> Result<String> {
    let graph = parse(source)?;
    let positioned = layout(&graph)?;
    Ok(render_svg(&positioned, theme))
}
