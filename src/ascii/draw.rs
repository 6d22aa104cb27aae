//! Drawing operations for ASCII rendering

use super::canvas::{draw_text, set_char};
use super::types::{BoxRect, Canvas, DrawingCoord, Heading};
use crate::layout::Side;
use crate::types::{EdgeStyle, NodeShape};

/// Corner characters (top-left, top-right, bottom-left, bottom-right)
fn box_corners(shape: NodeShape, use_ascii: bool) -> (char, char, char, char) {
    if use_ascii {
        return ('+', '+', '+', '+');
    }
    match shape {
        NodeShape::Rounded | NodeShape::Stadium | NodeShape::Circle | NodeShape::DoubleCircle => {
            ('╭', '╮', '╰', '╯')
        }
        NodeShape::Diamond | NodeShape::Hexagon => ('╱', '╲', '╲', '╱'),
        _ => ('┌', '┐', '└', '┘'),
    }
}

/// Draw a node box with centered label text
pub fn draw_box(canvas: &mut Canvas, rect: BoxRect, label: &str, shape: NodeShape, use_ascii: bool) {
    let (h_line, v_line) = if use_ascii { ('-', '|') } else { ('─', '│') };
    let (tl, tr, bl, br) = box_corners(shape, use_ascii);
    let right = rect.x + rect.width - 1;
    let bottom = rect.y + rect.height - 1;

    // Draw horizontal lines
    for x in (rect.x + 1)..right {
        set_char(canvas, x, rect.y, h_line);
        set_char(canvas, x, bottom, h_line);
    }
    // Draw vertical lines
    for y in (rect.y + 1)..bottom {
        set_char(canvas, rect.x, y, v_line);
        set_char(canvas, right, y, v_line);
    }
    // Draw corners
    set_char(canvas, rect.x, rect.y, tl);
    set_char(canvas, right, rect.y, tr);
    set_char(canvas, rect.x, bottom, bl);
    set_char(canvas, right, bottom, br);

    let inner = rect.width - 2;
    let len = label.chars().count() as i32;
    let text_x = rect.x + 1 + (inner - len) / 2;
    draw_text(canvas, text_x, rect.y + rect.height / 2, label);
}

/// Horizontal and vertical line glyphs for an edge style
pub fn line_glyphs(style: EdgeStyle, use_ascii: bool) -> (char, char) {
    match (style, use_ascii) {
        (EdgeStyle::Solid, false) => ('─', '│'),
        (EdgeStyle::Solid, true) => ('-', '|'),
        (EdgeStyle::Dotted, false) => ('┄', '┆'),
        (EdgeStyle::Dotted, true) => ('.', ':'),
        (EdgeStyle::Thick, false) => ('━', '┃'),
        (EdgeStyle::Thick, true) => ('=', '|'),
    }
}

/// Draw a straight line between two coordinates, both ends included
pub fn draw_line(canvas: &mut Canvas, from: DrawingCoord, to: DrawingCoord, glyphs: (char, char)) {
    let (h_char, v_char) = glyphs;
    if from.x == to.x {
        for y in from.y.min(to.y)..=from.y.max(to.y) {
            set_char(canvas, from.x, y, v_char);
        }
    } else {
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            set_char(canvas, x, from.y, h_char);
        }
    }
}

/// Determine the correct corner character for a path bend
fn determine_corner(from_dir: Heading, to_dir: Heading) -> char {
    // from_dir: direction of travel BEFORE the corner
    // to_dir: direction of travel AFTER the corner
    match (from_dir, to_dir) {
        (Heading::Up, Heading::Right) | (Heading::Left, Heading::Down) => '┌',
        (Heading::Up, Heading::Left) | (Heading::Right, Heading::Down) => '┐',
        (Heading::Down, Heading::Right) | (Heading::Left, Heading::Up) => '└',
        (Heading::Down, Heading::Left) | (Heading::Right, Heading::Up) => '┘',
        _ => '┼',
    }
}

/// Draw an orthogonal polyline with corners at its bends
pub fn draw_path(canvas: &mut Canvas, points: &[DrawingCoord], style: EdgeStyle, use_ascii: bool) {
    let glyphs = line_glyphs(style, use_ascii);
    for pair in points.windows(2) {
        draw_line(canvas, pair[0], pair[1], glyphs);
    }
    for bend in points.windows(3) {
        let corner = if use_ascii {
            '+'
        } else {
            determine_corner(Heading::between(bend[0], bend[1]), Heading::between(bend[1], bend[2]))
        };
        set_char(canvas, bend[1].x, bend[1].y, corner);
    }
}

/// Arrowhead pointing along `heading`
pub fn arrow_head(heading: Heading, use_ascii: bool) -> char {
    match (heading, use_ascii) {
        (Heading::Up, false) => '▲',
        (Heading::Down, false) => '▼',
        (Heading::Left, false) => '◄',
        (Heading::Right, false) => '►',
        (Heading::Up, true) => '^',
        (Heading::Down, true) => 'v',
        (Heading::Left, true) => '<',
        (Heading::Right, true) => '>',
    }
}

/// Draw the arrowheads of a path: at its end, and at its start for
/// bidirectional edges
pub fn draw_arrow_heads(
    canvas: &mut Canvas,
    points: &[DrawingCoord],
    at_start: bool,
    at_end: bool,
    use_ascii: bool,
) {
    if points.len() < 2 {
        return;
    }
    if at_end {
        let n = points.len();
        let last = points[n - 1];
        set_char(canvas, last.x, last.y, arrow_head(Heading::between(points[n - 2], last), use_ascii));
    }
    if at_start {
        let first = points[0];
        let heading = Heading::between(first, points[1]).reverse();
        set_char(canvas, first.x, first.y, arrow_head(heading, use_ascii));
    }
}

/// Junction drawn on the border where an edge leaves its box
pub fn box_start_junction(side: Side) -> char {
    match side {
        Side::Bottom => '┬',
        Side::Top => '┴',
        Side::Right => '├',
        Side::Left => '┤',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::canvas::{canvas_to_string, mk_canvas};

    #[test]
    fn rectangle_box_with_centred_label() {
        let mut canvas = mk_canvas(0, 0);
        let rect = BoxRect { x: 0, y: 0, width: 7, height: 3 };
        draw_box(&mut canvas, rect, "ab", NodeShape::Rectangle, false);
        assert_eq!(canvas_to_string(&canvas), "┌─────┐\n│ ab  │\n└─────┘");
    }

    #[test]
    fn shapes_pick_their_corners() {
        let mut canvas = mk_canvas(0, 0);
        let rect = BoxRect { x: 0, y: 0, width: 5, height: 3 };
        draw_box(&mut canvas, rect, "x", NodeShape::Rounded, false);
        assert!(canvas_to_string(&canvas).starts_with("╭───╮"));
        let mut canvas = mk_canvas(0, 0);
        draw_box(&mut canvas, rect, "x", NodeShape::Diamond, true);
        assert_eq!(canvas_to_string(&canvas), "+---+\n| x |\n+---+");
    }

    #[test]
    fn paths_bend_with_corners() {
        let mut canvas = mk_canvas(0, 0);
        let points = [
            DrawingCoord::new(0, 0),
            DrawingCoord::new(0, 2),
            DrawingCoord::new(3, 2),
            DrawingCoord::new(3, 4),
        ];
        draw_path(&mut canvas, &points, EdgeStyle::Solid, false);
        draw_arrow_heads(&mut canvas, &points, false, true, false);
        assert_eq!(canvas_to_string(&canvas), "│\n│\n└──┐\n   │\n   ▼");
    }

    #[test]
    fn bidirectional_paths_get_two_heads() {
        let mut canvas = mk_canvas(0, 0);
        let points = [DrawingCoord::new(0, 0), DrawingCoord::new(4, 0)];
        draw_path(&mut canvas, &points, EdgeStyle::Dotted, true);
        draw_arrow_heads(&mut canvas, &points, true, true, true);
        assert_eq!(canvas_to_string(&canvas), "<...>");
    }

    #[test]
    fn thick_lines_use_heavy_glyphs() {
        assert_eq!(line_glyphs(EdgeStyle::Thick, false), ('━', '┃'));
        assert_eq!(line_glyphs(EdgeStyle::Thick, true), ('=', '|'));
    }
}
