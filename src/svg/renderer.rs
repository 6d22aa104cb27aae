//! SVG renderer - converts a PositionedGraph into an SVG string.
//!
//! Pure string building, no DOM manipulation.
//! Renders back-to-front: edges → edge labels → nodes → node labels.

use super::geometry::{label_size, place};
use super::styles::{ArrowHead, FontSizes, FontWeights, StrokeWidths, TEXT_BASELINE_SHIFT};
use super::theme::{build_style_block, default_theme, svg_open_tag, Theme};
use super::types::{EdgeGeometry, EdgePath, NodeBox, Point};
use crate::layout::PositionedGraph;
use crate::types::{EdgeStyle, NodeShape, StyleProps};

/// Options for SVG output.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgRenderOptions<'a> {
    /// Colour theme; `None` uses the default theme
    pub theme: Option<&'a Theme>,
    /// Leave the background unpainted
    pub transparent: bool,
}

/// Render a positioned graph as an SVG string.
pub fn render_svg(graph: &PositionedGraph, theme: Option<&Theme>) -> String {
    render_svg_with_options(
        graph,
        &SvgRenderOptions {
            theme,
            transparent: false,
        },
    )
}

/// Render a positioned graph as an SVG string with explicit options.
pub fn render_svg_with_options(graph: &PositionedGraph, options: &SvgRenderOptions) -> String {
    let theme = options.theme.unwrap_or(default_theme());
    let placement = place(graph, theme);
    let mut parts: Vec<String> = Vec::new();

    // SVG root with CSS variables + style block + defs
    parts.push(svg_open_tag(placement.width, placement.height, theme, options.transparent));
    parts.push(build_style_block(theme.font_family));
    parts.push("<defs>".to_string());
    parts.push(arrow_marker_defs());
    parts.push("</defs>".to_string());

    // 1. Edges (rendered behind nodes)
    for edge in &placement.edges {
        parts.push(render_edge(edge));
    }

    // 2. Edge labels
    for edge in &placement.edges {
        if let Some((label, at)) = edge.label {
            parts.push(render_edge_label(label, at, theme));
        }
    }

    // 3. Node shapes and labels; inline styles override the theme
    let no_style = StyleProps::new();
    for (node, decl) in placement.nodes.iter().zip(&graph.graph.nodes) {
        let style = graph.graph.styles.get(&decl.id).unwrap_or(&no_style);
        parts.push(render_node_shape(node, style));
    }
    for (node, decl) in placement.nodes.iter().zip(&graph.graph.nodes) {
        let style = graph.graph.styles.get(&decl.id).unwrap_or(&no_style);
        parts.push(render_node_label(node, style, theme));
    }

    parts.push("</svg>".to_string());

    log::debug!(
        "svg: {}x{} canvas, theme {}",
        fmt_num(placement.width),
        fmt_num(placement.height),
        theme.name
    );

    parts.join("\n")
}

// ============================================================================
// Arrow marker definitions
// ============================================================================

fn arrow_marker_defs() -> String {
    let w = ArrowHead::WIDTH;
    let h = ArrowHead::HEIGHT;
    format!(
        r#"  <marker id="arrowhead" markerWidth="{w}" markerHeight="{h}" refX="{w}" refY="{half_h}" orient="auto">
    <polygon points="0 0, {w} {half_h}, 0 {h}" fill="var(--_arrow)" />
  </marker>
  <marker id="arrowhead-start" markerWidth="{w}" markerHeight="{h}" refX="0" refY="{half_h}" orient="auto">
    <polygon points="{w} 0, 0 {half_h}, {w} {h}" fill="var(--_arrow)" />
  </marker>"#,
        w = w,
        h = h,
        half_h = h / 2.0
    )
}

// ============================================================================
// Edge rendering
// ============================================================================

fn render_edge(edge: &EdgePath) -> String {
    let path_data = match &edge.geometry {
        EdgeGeometry::Orthogonal(points) => polyline_path(points),
        EdgeGeometry::Curve(points) => smooth_path(points),
        EdgeGeometry::Loop([start, c1, c2, end]) => format!(
            "M {} C {} {} {}",
            fmt_point(*start),
            fmt_point(*c1),
            fmt_point(*c2),
            fmt_point(*end)
        ),
    };

    let dash_array = if edge.style == EdgeStyle::Dotted {
        " stroke-dasharray=\"4 4\""
    } else {
        ""
    };
    let stroke_width = if edge.style == EdgeStyle::Thick {
        StrokeWidths::CONNECTOR * 2.0
    } else {
        StrokeWidths::CONNECTOR
    };

    // Build marker attributes based on arrow direction flags
    let mut markers = String::new();
    if edge.has_arrow_end {
        markers.push_str(" marker-end=\"url(#arrowhead)\"");
    }
    if edge.has_arrow_start {
        markers.push_str(" marker-start=\"url(#arrowhead-start)\"");
    }

    format!(
        r#"<path d="{}" fill="none" stroke="var(--_line)" stroke-width="{}"{}{} />"#,
        path_data,
        fmt_num(stroke_width),
        dash_array,
        markers
    )
}

fn fmt_point(p: Point) -> String {
    format!("{} {}", fmt_num(p.x), fmt_num(p.y))
}

/// `M x y L x y ...` through the points
fn polyline_path(points: &[Point]) -> String {
    let mut d = String::new();
    for (i, p) in points.iter().enumerate() {
        d.push_str(if i == 0 { "M " } else { " L " });
        d.push_str(&fmt_point(*p));
    }
    d
}

/// Catmull-Rom spline through the points as cubic Bézier segments
fn smooth_path(points: &[Point]) -> String {
    let Some(first) = points.first() else {
        return String::new();
    };
    let mut d = format!("M {}", fmt_point(*first));
    let n = points.len();
    for i in 0..n.saturating_sub(1) {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(n - 1)];
        let c1 = Point::new(p1.x + (p2.x - p0.x) / 6.0, p1.y + (p2.y - p0.y) / 6.0);
        let c2 = Point::new(p2.x - (p3.x - p1.x) / 6.0, p2.y - (p3.y - p1.y) / 6.0);
        d.push_str(&format!(
            " C {} {} {}",
            fmt_point(c1),
            fmt_point(c2),
            fmt_point(p2)
        ));
    }
    d
}

fn render_edge_label(label: &str, at: Point, theme: &Theme) -> String {
    let (bg_width, bg_height) = label_size(label, theme);

    // Background pill behind text for readability
    format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="4" ry="4" fill="var(--bg)" stroke="var(--_inner-stroke)" stroke-width="0.5" />
<text x="{}" y="{}" text-anchor="middle" dy="{}" font-size="{}" font-weight="{}" fill="var(--_text-muted)">{}</text>"#,
        fmt_num(at.x - bg_width / 2.0),
        fmt_num(at.y - bg_height / 2.0),
        fmt_num(bg_width),
        fmt_num(bg_height),
        fmt_num(at.x),
        fmt_num(at.y),
        TEXT_BASELINE_SHIFT,
        fmt_num(theme.font_size - FontSizes::EDGE_LABEL_DELTA),
        FontWeights::EDGE_LABEL,
        escape_xml(label)
    )
}

// ============================================================================
// Node rendering
// ============================================================================

/// Fill, stroke and stroke width for a node, each overridable inline.
struct Paint {
    fill: String,
    stroke: String,
    sw: String,
}

fn node_paint(style: &StyleProps) -> Paint {
    let pick = |key: &str, default: &str| {
        style
            .get(key)
            .map(|v| escape_xml(v))
            .unwrap_or_else(|| default.to_string())
    };
    Paint {
        fill: pick("fill", "var(--_node-fill)"),
        stroke: pick("stroke", "var(--_node-stroke)"),
        sw: pick("stroke-width", &fmt_num(StrokeWidths::INNER_BOX)),
    }
}

fn render_node_shape(node: &NodeBox, style: &StyleProps) -> String {
    let paint = node_paint(style);
    let (x, y, w, h) = (node.x, node.y, node.width, node.height);

    match node.shape {
        NodeShape::Diamond => render_diamond(x, y, w, h, &paint),
        NodeShape::Rounded => render_rounded_rect(x, y, w, h, &paint),
        NodeShape::Stadium => render_stadium(x, y, w, h, &paint),
        NodeShape::Circle => render_circle(x, y, w, h, &paint),
        NodeShape::Subroutine => render_subroutine(x, y, w, h, &paint),
        NodeShape::DoubleCircle => render_double_circle(x, y, w, h, &paint),
        NodeShape::Hexagon => render_hexagon(x, y, w, h, &paint),
        NodeShape::Cylinder => render_cylinder(x, y, w, h, &paint),
        NodeShape::Asymmetric => render_asymmetric(x, y, w, h, &paint),
        NodeShape::Trapezoid => render_trapezoid(x, y, w, h, &paint),
        NodeShape::TrapezoidAlt => render_trapezoid_alt(x, y, w, h, &paint),
        NodeShape::Rectangle => render_rect(x, y, w, h, &paint),
    }
}

fn polygon(points: &[(f64, f64)], paint: &Paint) -> String {
    let points = points
        .iter()
        .map(|(x, y)| format!("{},{}", fmt_num(*x), fmt_num(*y)))
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        r#"<polygon points="{}" fill="{}" stroke="{}" stroke-width="{}" />"#,
        points, paint.fill, paint.stroke, paint.sw
    )
}

fn rect(x: f64, y: f64, w: f64, h: f64, r: f64, paint: &Paint) -> String {
    format!(
        r#"<rect x="{}" y="{}" width="{}" height="{}" rx="{}" ry="{}" fill="{}" stroke="{}" stroke-width="{}" />"#,
        fmt_num(x),
        fmt_num(y),
        fmt_num(w),
        fmt_num(h),
        fmt_num(r),
        fmt_num(r),
        paint.fill,
        paint.stroke,
        paint.sw
    )
}

fn circle(cx: f64, cy: f64, r: f64, paint: &Paint) -> String {
    format!(
        r#"<circle cx="{}" cy="{}" r="{}" fill="{}" stroke="{}" stroke-width="{}" />"#,
        fmt_num(cx),
        fmt_num(cy),
        fmt_num(r),
        paint.fill,
        paint.stroke,
        paint.sw
    )
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64, paint: &Paint) -> String {
    format!(
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}" />"#,
        fmt_num(x1),
        fmt_num(y1),
        fmt_num(x2),
        fmt_num(y2),
        paint.stroke,
        paint.sw
    )
}

// --- Basic shapes ---

fn render_rect(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    rect(x, y, w, h, 0.0, paint)
}

fn render_rounded_rect(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    rect(x, y, w, h, 6.0, paint)
}

fn render_stadium(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    rect(x, y, w, h, h / 2.0, paint)
}

fn render_circle(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    circle(x + w / 2.0, y + h / 2.0, w.min(h) / 2.0, paint)
}

fn render_diamond(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    let cx = x + w / 2.0;
    let cy = y + h / 2.0;
    polygon(
        &[
            (cx, y),     // top
            (x + w, cy), // right
            (cx, y + h), // bottom
            (x, cy),     // left
        ],
        paint,
    )
}

// --- Multi-part and polygon shapes ---

fn render_subroutine(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    let inset = 8.0;
    [
        rect(x, y, w, h, 0.0, paint),
        line(x + inset, y, x + inset, y + h, paint),
        line(x + w - inset, y, x + w - inset, y + h, paint),
    ]
    .join("\n")
}

fn render_double_circle(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    let cx = x + w / 2.0;
    let cy = y + h / 2.0;
    let outer_r = w.min(h) / 2.0;
    [circle(cx, cy, outer_r, paint), circle(cx, cy, outer_r - 5.0, paint)].join("\n")
}

fn render_hexagon(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    let inset = h / 4.0;
    polygon(
        &[
            (x + inset, y),
            (x + w - inset, y),
            (x + w, y + h / 2.0),
            (x + w - inset, y + h),
            (x + inset, y + h),
            (x, y + h / 2.0),
        ],
        paint,
    )
}

fn render_cylinder(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    let ry = 7.0;
    let cx = x + w / 2.0;
    let body_top = y + ry;
    let body_h = h - 2.0 * ry;
    let ellipse = |cy: f64| {
        format!(
            r#"<ellipse cx="{}" cy="{}" rx="{}" ry="{}" fill="{}" stroke="{}" stroke-width="{}" />"#,
            fmt_num(cx),
            fmt_num(cy),
            fmt_num(w / 2.0),
            fmt_num(ry),
            paint.fill,
            paint.stroke,
            paint.sw
        )
    };

    [
        format!(
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="none" />"#,
            fmt_num(x),
            fmt_num(body_top),
            fmt_num(w),
            fmt_num(body_h),
            paint.fill
        ),
        line(x, body_top, x, body_top + body_h, paint),
        line(x + w, body_top, x + w, body_top + body_h, paint),
        ellipse(y + h - ry),
        ellipse(body_top),
    ]
    .join("\n")
}

fn render_asymmetric(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    let indent = 12.0;
    polygon(
        &[
            (x + indent, y),
            (x + w, y),
            (x + w, y + h),
            (x + indent, y + h),
            (x, y + h / 2.0),
        ],
        paint,
    )
}

fn render_trapezoid(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    let inset = w * 0.15;
    polygon(&[(x + inset, y), (x + w - inset, y), (x + w, y + h), (x, y + h)], paint)
}

fn render_trapezoid_alt(x: f64, y: f64, w: f64, h: f64, paint: &Paint) -> String {
    let inset = w * 0.15;
    polygon(&[(x, y), (x + w, y), (x + w - inset, y + h), (x + inset, y + h)], paint)
}

// ============================================================================
// Node label rendering
// ============================================================================

fn render_node_label(node: &NodeBox, style: &StyleProps, theme: &Theme) -> String {
    let c = node.centre();

    // Inline styles can override the CSS variable default
    let text_color = style
        .get("color")
        .map(|v| escape_xml(v))
        .unwrap_or_else(|| "var(--_text)".to_string());

    format!(
        r#"<text x="{}" y="{}" text-anchor="middle" dy="{}" font-size="{}" font-weight="{}" fill="{}">{}</text>"#,
        fmt_num(c.x),
        fmt_num(c.y),
        TEXT_BASELINE_SHIFT,
        fmt_num(theme.font_size),
        FontWeights::NODE_LABEL,
        text_color,
        escape_xml(node.label)
    )
}

// ============================================================================
// Utilities
// ============================================================================

/// Escape special XML characters in text content
pub fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Format a coordinate with at most two decimals and no trailing zeros.
pub fn fmt_num(n: f64) -> String {
    let rounded = (n * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{}", rounded as i64)
    } else {
        format!("{}", rounded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout;
    use crate::parser::parse;

    fn svg(src: &str) -> String {
        render_svg(&layout(&parse(src).unwrap()).unwrap(), None)
    }

    #[test]
    fn numbers_drop_trailing_zeros() {
        assert_eq!(fmt_num(40.0), "40");
        assert_eq!(fmt_num(12.5), "12.5");
        assert_eq!(fmt_num(1.0 / 3.0), "0.33");
        assert_eq!(fmt_num(-0.001), "0");
    }

    #[test]
    fn xml_specials_are_escaped() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn forward_edges_are_orthogonal_paths() {
        let out = svg("graph TD\nA --> B");
        assert!(out.contains("<path d=\"M 70 76 L 70 126\""));
        assert!(out.contains("marker-end=\"url(#arrowhead)\""));
        assert!(!out.contains("marker-start"));
    }

    #[test]
    fn edge_styles_change_stroke() {
        let out = svg("graph LR\nA -.-> B\nB ==> C\nC <--> D");
        assert!(out.contains("stroke-dasharray=\"4 4\""));
        assert!(out.contains("stroke-width=\"1.5\""));
        assert!(out.contains("marker-start=\"url(#arrowhead-start)\""));
    }

    #[test]
    fn back_edges_and_loops_use_curves() {
        let out = svg("graph TD\nA --> B --> A\nB --> B");
        let curved = out
            .lines()
            .filter(|l| l.starts_with("<path") && l.contains(" C "))
            .count();
        assert_eq!(curved, 2);
    }

    #[test]
    fn shapes_emit_their_elements() {
        let out = svg("graph TD\nA((one)) --> B{two} --> C[(three)]");
        assert!(out.contains("<circle"));
        assert!(out.contains("<polygon points=\""));
        assert_eq!(out.matches("<ellipse").count(), 2);
    }

    #[test]
    fn inline_styles_override_theme() {
        let out = svg("graph TD\nA --> B\nstyle A fill:#f9f,color:red");
        assert!(out.contains("fill=\"#f9f\""));
        assert!(out.contains("fill=\"red\""));
    }

    #[test]
    fn labels_get_a_background() {
        let out = svg("graph LR\nA -->|a & b| B");
        assert!(out.contains("rx=\"4\""));
        assert!(out.contains(">a &amp; b</text>"));
    }

    #[test]
    fn theme_font_and_colours_apply() {
        let pg = layout(&parse("graph TD\nA").unwrap()).unwrap();
        let theme = crate::svg::theme::lookup("dracula").unwrap();
        let out = render_svg(&pg, Some(theme));
        assert!(out.contains("--bg:#282A36"));
        assert!(out.contains("font-size=\"13\""));
        assert!(out.contains("family=Inter"));
    }
}
