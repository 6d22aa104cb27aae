//! ASCII rendering module
//!
//! Draws a [`PositionedGraph`] onto a character canvas. Boxes go down
//! first, then every edge path on its own overlay so crossings and bends
//! merge into junction glyphs, then arrowheads, border junctions and
//! labels on top.

pub mod canvas;
pub mod draw;
pub mod grid;
pub mod types;

use crate::layout::{PositionedGraph, RouteKind};
use crate::types::EdgeStyle;
use crate::AsciiRenderOptions;
use canvas::{canvas_to_string, copy_canvas, draw_text, merge_canvases, mk_canvas, set_char};
use grid::AsciiGrid;
use types::DrawingCoord;

/// Everything needed to draw one edge, in canvas coordinates.
struct EdgePlan {
    points: Vec<DrawingCoord>,
    style: EdgeStyle,
    arrow_start: bool,
    arrow_end: bool,
    junction: Option<(DrawingCoord, char)>,
    label: Option<(DrawingCoord, String)>,
}

/// Render a positioned graph to a multi-line string.
///
/// Lines are joined with `\n` without trailing whitespace; an empty graph
/// renders to an empty string.
pub fn render_ascii(pg: &PositionedGraph, options: &AsciiRenderOptions) -> String {
    if pg.graph.is_empty() {
        return String::new();
    }
    let use_ascii = options.use_ascii;

    let mut grid = AsciiGrid::new(pg, options);
    let mut plans = plan_edges(pg, &grid, use_ascii);

    // Labels centred on lines near the left or top edge can start before 0
    let (min_x, min_y) = plans
        .iter()
        .filter_map(|plan| plan.label.as_ref().map(|(at, _)| *at))
        .fold((0, 0), |(x, y), at| (x.min(at.x), y.min(at.y)));
    if min_x < 0 || min_y < 0 {
        grid.shift(-min_x, -min_y);
        plans = plan_edges(pg, &grid, use_ascii);
    }

    let mut canvas = mk_canvas(0, 0);
    for (i, node) in pg.graph.nodes.iter().enumerate() {
        draw::draw_box(&mut canvas, grid.box_rect(i), &node.label, node.shape, use_ascii);
    }

    for plan in &plans {
        let mut overlay = copy_canvas(&canvas);
        draw::draw_path(&mut overlay, &plan.points, plan.style, use_ascii);
        merge_canvases(&mut canvas, &overlay, use_ascii);
    }
    for plan in &plans {
        draw::draw_arrow_heads(&mut canvas, &plan.points, plan.arrow_start, plan.arrow_end, use_ascii);
    }
    for plan in &plans {
        if let Some((at, junction)) = plan.junction {
            set_char(&mut canvas, at.x, at.y, junction);
        }
    }
    for plan in &plans {
        if let Some((at, text)) = &plan.label {
            draw_text(&mut canvas, at.x, at.y, text);
        }
    }

    log::debug!(
        "ascii: {} boxes, {} edges, {} labels",
        pg.nodes.len(),
        plans.len(),
        plans.iter().filter(|p| p.label.is_some()).count()
    );

    canvas_to_string(&canvas)
}

fn plan_edges(pg: &PositionedGraph, grid: &AsciiGrid, use_ascii: bool) -> Vec<EdgePlan> {
    pg.edges
        .iter()
        .zip(&pg.graph.edges)
        .enumerate()
        .map(|(i, (route, edge))| {
            let points = grid.edge_path(i, route);
            let junction = if !use_ascii && !edge.has_arrow_start {
                Some((
                    grid.source_border(route),
                    draw::box_start_junction(route.source_port.side),
                ))
            } else {
                None
            };
            let label = edge.label.as_ref().and_then(|text| {
                let at = if route.kind == RouteKind::SelfLoop {
                    Some(grid.loop_label_at(route, text.chars().count() as i32))
                } else {
                    grid.label_at(i)
                };
                at.map(|at| (at, text.clone()))
            });
            EdgePlan {
                points,
                style: edge.style,
                arrow_start: edge.has_arrow_start,
                arrow_end: edge.has_arrow_end,
                junction,
                label,
            }
        })
        .collect()
}
