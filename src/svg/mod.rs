//! SVG renderer - converts positioned flowcharts into SVG strings.
//!
//! Pure string building, no DOM manipulation. Text is measured with a
//! width estimate, so rendering is a plain synchronous call.

mod geometry;
mod renderer;
mod styles;
pub mod theme;
mod types;

pub use renderer::{escape_xml, render_svg, render_svg_with_options, SvgRenderOptions};
pub use theme::Theme;
