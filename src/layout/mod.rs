//! Layered (Sugiyama-style) layout for flowcharts
//!
//! The pipeline runs leaf-first through the submodules:
//!
//! 1. [`rank`]: back-edge reversal and longest-path layering
//! 2. [`order`]: virtual waypoints and barycenter crossing reduction
//! 3. [`position`]: cross-axis coordinates and the mapping onto grid cells
//! 4. [`route`]: ports, channel tracks and per-edge waypoint lists
//!
//! [`channel`] is shared with the renderers: once they know where hops
//! meet the sides of a gap, it orders the tracks so no two hops overlap.
//!
//! The result is a [`PositionedGraph`] on an integer grid. Renderers decide
//! how large a grid cell is; the layout only guarantees that cells are
//! disjoint and that every edge has an orthogonal route.

pub mod channel;
mod order;
mod position;
mod rank;
mod route;

use crate::error::{RenderError, Result};
use crate::types::{Direction, Graph};
use serde::Serialize;
use std::collections::HashSet;

/// A cell on the layout grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Index along the flow axis (row for vertical flows, column otherwise).
    pub fn flow(self, direction: Direction) -> usize {
        if direction.is_vertical() {
            self.row
        } else {
            self.col
        }
    }

    /// Index across the flow axis.
    pub fn cross(self, direction: Direction) -> usize {
        if direction.is_vertical() {
            self.col
        } else {
            self.row
        }
    }
}

/// Side of a node box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Side {
    Top,
    Bottom,
    Left,
    Right,
}

/// Where an edge attaches to a node: `slot` of `slots` evenly spaced
/// attachment points on `side`, ordered left to right or top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Port {
    pub side: Side,
    pub slot: usize,
    pub slots: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteKind {
    Forward,
    /// A back-edge: laid out along the reversed direction, drawn against the flow
    Reversed,
    SelfLoop,
}

/// The route of one edge through the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeRoute {
    /// Node indices of the endpoints
    pub source: usize,
    pub target: usize,
    /// Source cell, virtual waypoint cells, target cell
    pub points: Vec<GridPos>,
    /// Channel track per hop (`points.len() - 1` entries); `None` runs straight
    pub tracks: Vec<Option<usize>>,
    pub source_port: Port,
    pub target_port: Port,
    pub kind: RouteKind,
}

impl EdgeRoute {
    /// Number of hops between consecutive points.
    pub fn hops(&self) -> usize {
        self.points.len().saturating_sub(1)
    }
}

/// Number of ports on each side of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SideSlots {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl SideSlots {
    pub fn get(&self, side: Side) -> usize {
        match side {
            Side::Top => self.top,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    fn set(&mut self, side: Side, count: usize) {
        match side {
            Side::Top => self.top = count,
            Side::Bottom => self.bottom = count,
            Side::Left => self.left = count,
            Side::Right => self.right = count,
        }
    }
}

/// A real node placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedNode {
    pub id: String,
    pub layer: usize,
    pub pos: GridPos,
    pub slots: SideSlots,
    /// Number of self-loops on this node
    pub loops: usize,
}

/// A graph with every node on a grid cell and every edge routed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedGraph {
    pub graph: Graph,
    /// One entry per graph node, same order
    pub nodes: Vec<PlacedNode>,
    /// One entry per graph edge, same order
    pub edges: Vec<EdgeRoute>,
    pub layer_count: usize,
    pub rows: usize,
    pub cols: usize,
    /// Tracks in the gap after each flow-axis grid index
    pub gap_tracks: Vec<usize>,
}

impl PositionedGraph {
    pub fn direction(&self) -> Direction {
        self.graph.direction
    }

    pub fn node(&self, id: &str) -> Option<&PlacedNode> {
        self.graph.node_index(id).map(|i| &self.nodes[i])
    }

    pub fn position(&self, id: &str) -> Option<GridPos> {
        self.node(id).map(|n| n.pos)
    }

    /// Grid extent along the flow axis.
    pub fn flow_len(&self) -> usize {
        if self.direction().is_vertical() {
            self.rows
        } else {
            self.cols
        }
    }

    /// Grid extent across the flow axis.
    pub fn cross_len(&self) -> usize {
        if self.direction().is_vertical() {
            self.cols
        } else {
            self.rows
        }
    }

    /// Virtual waypoint cells of every edge.
    pub fn waypoints(&self) -> impl Iterator<Item = GridPos> + '_ {
        self.edges.iter().flat_map(|route| {
            let inner = route.points.len().saturating_sub(2);
            route.points.iter().skip(1).take(inner).copied()
        })
    }
}

/// Lay out a graph on the grid.
///
/// Fails with [`RenderError::Layout`] when an edge references an unknown
/// node or cells still overlap after the retry with index spacing.
pub fn layout(graph: &Graph) -> Result<PositionedGraph> {
    graph.validate().map_err(RenderError::Layout)?;

    let ends: Vec<(usize, usize)> = graph
        .edges
        .iter()
        .map(|e| {
            let source = graph.node_index(&e.source);
            let target = graph.node_index(&e.target);
            source
                .zip(target)
                .ok_or_else(|| RenderError::Layout(format!("edge {} -> {} is dangling", e.source, e.target)))
        })
        .collect::<Result<_>>()?;

    let ranking = rank::rank(graph.nodes.len(), &ends);
    let mut layered = order::build(graph.nodes.len(), &ends, &ranking);
    let crossings = order::minimize_crossings(&mut layered);

    let mut cross = position::assign_cross(&layered);
    let mut cells = position::to_grid(graph.direction, &layered, &cross);
    if let Some(cell) = first_overlap(&cells) {
        log::warn!(
            "layout cells overlap at ({}, {}); retrying with index spacing",
            cell.row,
            cell.col
        );
        cross = position::index_spacing(&layered);
        cells = position::to_grid(graph.direction, &layered, &cross);
        if let Some(cell) = first_overlap(&cells) {
            return Err(RenderError::Layout(format!(
                "nodes overlap at row {}, column {}",
                cell.row, cell.col
            )));
        }
    }

    let routed = route::route(graph, &ends, &ranking, &layered, &cells);

    let rows = cells.iter().map(|c| c.row + 1).max().unwrap_or(0);
    let cols = cells.iter().map(|c| c.col + 1).max().unwrap_or(0);

    let nodes = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, node)| PlacedNode {
            id: node.id.clone(),
            layer: ranking.layer[i],
            pos: cells[i],
            slots: routed.slots[i],
            loops: routed.loops[i],
        })
        .collect();

    log::debug!(
        "layout: {} layers, {}x{} grid, {} virtual waypoints, {} self-loops, {} crossings",
        layered.layers.len(),
        rows,
        cols,
        layered.vertices.iter().filter(|v| v.edge.is_some()).count(),
        graph.edges.iter().filter(|e| e.is_self_loop()).count(),
        crossings
    );

    Ok(PositionedGraph {
        graph: graph.clone(),
        nodes,
        edges: routed.edges,
        layer_count: layered.layers.len(),
        rows,
        cols,
        gap_tracks: routed.gap_tracks,
    })
}

fn first_overlap(cells: &[GridPos]) -> Option<GridPos> {
    let mut seen = HashSet::new();
    cells.iter().copied().find(|&cell| !seen.insert(cell))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn laid_out(src: &str) -> PositionedGraph {
        layout(&parse(src).unwrap()).unwrap()
    }

    #[test]
    fn chain_left_to_right() {
        let pg = laid_out("graph LR\nA --> B --> C");
        assert_eq!(pg.position("A"), Some(GridPos::new(0, 0)));
        assert_eq!(pg.position("B"), Some(GridPos::new(0, 1)));
        assert_eq!(pg.position("C"), Some(GridPos::new(0, 2)));
        assert_eq!(pg.gap_tracks, vec![0, 0]);
        assert!(pg.edges.iter().all(|e| e.kind == RouteKind::Forward));
    }

    #[test]
    fn fan_out_keeps_parent_above_first_child() {
        let pg = laid_out("graph TD\nA --> B\nA --> C");
        assert_eq!(pg.position("A"), Some(GridPos::new(0, 0)));
        assert_eq!(pg.position("B"), Some(GridPos::new(1, 0)));
        assert_eq!(pg.position("C"), Some(GridPos::new(1, 1)));
        let a = pg.node("A").unwrap();
        assert_eq!(a.slots.bottom, 2);
        assert_eq!(pg.edges[0].source_port.slot, 0);
        assert_eq!(pg.edges[1].source_port.slot, 1);
    }

    #[test]
    fn bottom_to_top_flips_rows() {
        let pg = laid_out("graph BT\nA --> B");
        assert_eq!(pg.position("A"), Some(GridPos::new(1, 0)));
        assert_eq!(pg.position("B"), Some(GridPos::new(0, 0)));
        assert_eq!(pg.edges[0].source_port.side, Side::Top);
        assert_eq!(pg.edges[0].target_port.side, Side::Bottom);
    }

    #[test]
    fn right_to_left_flips_columns() {
        let pg = laid_out("graph RL\nA --> B --> C");
        assert_eq!(pg.position("A"), Some(GridPos::new(0, 2)));
        assert_eq!(pg.position("C"), Some(GridPos::new(0, 0)));
        assert_eq!(pg.edges[0].source_port.side, Side::Left);
    }

    #[test]
    fn long_edges_get_waypoints() {
        let pg = laid_out("graph TD\nA --> B --> C\nA --> C");
        let long = &pg.edges[2];
        assert_eq!(long.points.len(), 3);
        assert_eq!(long.tracks.len(), 2);
        let waypoint = long.points[1];
        assert_eq!(waypoint.row, 1);
        assert_ne!(Some(waypoint), pg.position("B"));
    }

    #[test]
    fn cycles_are_reversed() {
        let pg = laid_out("graph TD\nA --> B --> C --> A");
        assert_eq!(pg.node("A").unwrap().layer, 0);
        assert_eq!(pg.node("C").unwrap().layer, 2);
        let back = &pg.edges[2];
        assert_eq!(back.kind, RouteKind::Reversed);
        assert_eq!(back.points.first(), pg.position("C").as_ref());
        assert_eq!(back.points.last(), pg.position("A").as_ref());
    }

    #[test]
    fn self_loops_use_trailing_sides() {
        let pg = laid_out("graph TD\nA --> A\nA --> B");
        let lp = &pg.edges[0];
        assert_eq!(lp.kind, RouteKind::SelfLoop);
        assert_eq!(lp.source_port.side, Side::Right);
        assert_eq!(lp.target_port.side, Side::Bottom);
        assert_eq!(lp.target_port.slot, 1);
        assert_eq!(pg.edges[1].source_port.slot, 0);
        assert_eq!(pg.node("A").unwrap().loops, 1);
    }

    #[test]
    fn disconnected_nodes_do_not_collide() {
        let pg = laid_out("graph LR\nA\nB\nC --> D");
        let cells: HashSet<_> = pg.nodes.iter().map(|n| n.pos).collect();
        assert_eq!(cells.len(), 4);
    }

    #[test]
    fn dangling_edges_fail() {
        let mut g = Graph::new(Direction::TD);
        g.add_node(crate::types::Node::bare("A"));
        g.add_edge(crate::types::Edge::new("A", "Q"));
        assert!(matches!(layout(&g), Err(RenderError::Layout(_))));
    }

    #[test]
    fn empty_graph_lays_out_to_nothing() {
        let pg = layout(&Graph::new(Direction::LR)).unwrap();
        assert_eq!((pg.rows, pg.cols), (0, 0));
        assert!(pg.gap_tracks.is_empty());
    }
}
