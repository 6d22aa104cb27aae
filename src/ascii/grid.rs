//! Grid geometry: layout cells to character coordinates
//!
//! Everything is computed in flow/cross coordinates (`f` along the layer
//! axis, `c` across it) and converted to canvas x/y at the end, so the four
//! directions share one code path.

use super::types::{BoxRect, DrawingCoord};
use crate::layout::channel::{self, Channel, Run};
use crate::layout::{EdgeRoute, GridPos, Port, PositionedGraph, RouteKind, Side, SideSlots};
use crate::types::Direction;
use crate::AsciiRenderOptions;

/// A character position in flow/cross coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowPoint {
    pub f: i32,
    pub c: i32,
}

impl FlowPoint {
    fn new(f: i32, c: i32) -> Self {
        Self { f, c }
    }
}

/// Which face of a box a side maps to, relative to the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    FlowBefore,
    FlowAfter,
    CrossBefore,
    CrossAfter,
}

fn face(direction: Direction, side: Side) -> Face {
    match (direction.is_vertical(), side) {
        (true, Side::Top) | (false, Side::Left) => Face::FlowBefore,
        (true, Side::Bottom) | (false, Side::Right) => Face::FlowAfter,
        (true, Side::Left) | (false, Side::Top) => Face::CrossBefore,
        (true, Side::Right) | (false, Side::Bottom) => Face::CrossAfter,
    }
}

/// Box extent in flow/cross coordinates, borders included.
#[derive(Debug, Clone, Copy)]
struct Extent {
    f0: i32,
    f_len: i32,
    c0: i32,
    c_len: i32,
}

impl Extent {
    fn f_end(&self) -> i32 {
        self.f0 + self.f_len - 1
    }

    fn c_end(&self) -> i32 {
        self.c0 + self.c_len - 1
    }
}

/// Offset of `slot` among `slots` evenly spread over `inner` cells.
pub fn slot_offset(slot: usize, slots: usize, inner: i32) -> i32 {
    let slots = slots.max(1) as i32;
    ((2 * slot as i32 + 1) * inner) / (2 * slots)
}

/// Offsets of ports on one face whose edges carry labels of `lens`
/// characters (0 for none), so each label written across its own line
/// stops short of the neighbouring lines.
fn label_spread(lens: &[i32]) -> Vec<i32> {
    let mut offsets = vec![0];
    let mut at = 0;
    for pair in lens.windows(2) {
        let right = pair[0] - 1 - pair[0] / 2;
        let left = pair[1] / 2;
        at += (right.max(left) + 2).max(2);
        offsets.push(at);
    }
    offsets
}

/// Box width and height for a label and its port counts.
pub fn box_size(label: &str, slots: &SideSlots, box_padding: usize) -> (i32, i32) {
    let label_len = label.chars().count() as i32;
    let across = slots.top.max(slots.bottom) as i32;
    let down = slots.left.max(slots.right) as i32;
    let inner_w = (label_len + 2 * box_padding as i32).max(2 * across - 1).max(1);
    let inner_h = (2 * down - 1).max(1);
    (inner_w + 2, inner_h + 2)
}

/// How one hop crosses its gap, in flow coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Crossing {
    Straight,
    Track(i32),
    /// Two tracks joined by a run along `lane`, a free cross coordinate
    Jog { near: i32, far: i32, lane: i32 },
}

/// Whether a hop moves forward along the flow.
fn ahead(route: &EdgeRoute, hop: usize, direction: Direction) -> bool {
    route.points[hop + 1].flow(direction) > route.points[hop].flow(direction)
}

/// The gap a hop crosses, by the flow index before it.
fn gap_of(route: &EdgeRoute, hop: usize, direction: Direction) -> usize {
    route.points[hop]
        .flow(direction)
        .min(route.points[hop + 1].flow(direction))
}

/// The hop an edge label is drawn on.
fn label_hop(route: &EdgeRoute) -> usize {
    (route.hops() - 1) / 2
}

/// The node port on the far side of a hop's gap, if it ends on a node.
fn far_port(route: &EdgeRoute, hop: usize, direction: Direction) -> Option<(usize, Port)> {
    let last = route.hops() - 1;
    match (ahead(route, hop, direction), hop) {
        (true, h) if h == last => Some((route.target, route.target_port)),
        (false, 0) => Some((route.source, route.source_port)),
        _ => None,
    }
}

/// The free cross coordinate closest to the middle of a jog.
fn free_lane(near: i32, far: i32, taken: &[i32]) -> i32 {
    let mid = (near + far) / 2;
    (0..)
        .flat_map(|d| [mid + d, mid - d])
        .find(|&c| c >= 0 && !taken.contains(&c))
        .unwrap_or(mid)
}

/// Hops that need a track in one gap, with their near and far cross
/// coordinates.
#[derive(Default, Clone)]
struct GapHops {
    hops: Vec<(usize, usize)>,
    ends: Vec<(i32, i32)>,
    /// Every cross coordinate a hop meets either side at
    taken: Vec<i32>,
}

pub struct AsciiGrid {
    direction: Direction,
    flow_start: Vec<i32>,
    flow_size: Vec<i32>,
    cross_start: Vec<i32>,
    cross_size: Vec<i32>,
    /// Deepest self-loop nesting per flow index
    loop_depth: Vec<i32>,
    boxes: Vec<Extent>,
    /// Port offsets on a node's flow-before face when its labels need
    /// room; empty means evenly spread
    spaced: Vec<Vec<i32>>,
    /// Per edge and hop
    crossings: Vec<Vec<Crossing>>,
    /// Where each edge's label starts, self-loops excepted
    labels: Vec<Option<FlowPoint>>,
    origin: DrawingCoord,
}

impl AsciiGrid {
    pub fn new(pg: &PositionedGraph, options: &AsciiRenderOptions) -> Self {
        let (pad_flow, pad_cross) = if pg.direction().is_vertical() {
            (options.padding_y as i32, options.padding_x as i32)
        } else {
            (options.padding_x as i32, options.padding_y as i32)
        };
        let label_lens: Vec<i32> = pg
            .graph
            .edges
            .iter()
            .map(|edge| edge.label.as_deref().map_or(0, |l| l.chars().count() as i32))
            .collect();

        let mut grid = Self::across(pg, options, &label_lens, pad_cross);
        grid.along(pg, &label_lens, pad_flow);
        grid
    }

    /// Cell sizes and box extents, and positions across the flow.
    fn across(
        pg: &PositionedGraph,
        options: &AsciiRenderOptions,
        label_lens: &[i32],
        pad_cross: i32,
    ) -> Self {
        let direction = pg.direction();
        let vertical = direction.is_vertical();
        let flow_len = pg.flow_len();
        let cross_len = pg.cross_len();

        // Vertical flows write a label across the line into its far end
        let mut face_lens: Vec<Vec<i32>> = pg
            .nodes
            .iter()
            .map(|placed| vec![0; placed.slots.top])
            .collect();
        if vertical {
            for (route, &len) in pg.edges.iter().zip(label_lens) {
                if len == 0 || route.kind == RouteKind::SelfLoop {
                    continue;
                }
                if let Some((node, port)) = far_port(route, label_hop(route), direction) {
                    if let Some(slot) = face_lens[node].get_mut(port.slot) {
                        *slot = len;
                    }
                }
            }
        }
        let spaced: Vec<Vec<i32>> = face_lens
            .iter()
            .map(|lens| {
                if lens.len() > 1 && lens.iter().any(|&len| len > 0) {
                    label_spread(lens)
                } else {
                    Vec::new()
                }
            })
            .collect();

        let mut flow_size = vec![0i32; flow_len];
        let mut cross_size = vec![0i32; cross_len];
        let mut loop_depth = vec![0i32; flow_len];
        let mut cross_reach = vec![0i32; cross_len];
        let mut lens = Vec::with_capacity(pg.nodes.len());

        for ((placed, node), spread) in pg.nodes.iter().zip(&pg.graph.nodes).zip(&spaced) {
            let (w, h) = box_size(&node.label, &placed.slots, options.box_padding);
            let (f_len, mut c_len) = if vertical { (h, w) } else { (w, h) };
            if let Some(&span) = spread.last() {
                c_len = c_len.max(span + 3);
            }
            let f = placed.pos.flow(direction);
            let c = placed.pos.cross(direction);
            flow_size[f] = flow_size[f].max(f_len);
            cross_size[c] = cross_size[c].max(c_len);
            let loops = placed.loops as i32;
            loop_depth[f] = loop_depth[f].max(loops);
            if loops > 0 {
                cross_reach[c] = cross_reach[c].max(loops + 2);
            }
            lens.push((f_len, c_len));
        }

        for cell in pg.waypoints() {
            let f = cell.flow(direction);
            let c = cell.cross(direction);
            flow_size[f] = flow_size[f].max(1);
            cross_size[c] = cross_size[c].max(1);
        }

        for (route, &len) in pg.edges.iter().zip(label_lens) {
            if len > 0 && route.kind == RouteKind::SelfLoop {
                let c = pg.nodes[route.source].pos.cross(direction);
                let loops = pg.nodes[route.source].loops as i32;
                let need = if vertical { loops + len + 4 } else { loops + 3 };
                cross_reach[c] = cross_reach[c].max(need);
            }
        }

        // Boxes relative to their cell until the cells are placed
        let boxes = pg
            .nodes
            .iter()
            .zip(lens)
            .map(|(placed, (f_len, c_len))| Extent {
                f0: 0,
                f_len,
                c0: cross_size[placed.pos.cross(direction)] / 2 - c_len / 2,
                c_len,
            })
            .collect();

        let mut grid = Self {
            direction,
            flow_start: vec![0; flow_len],
            flow_size,
            cross_start: vec![0; cross_len],
            cross_size,
            loop_depth,
            boxes,
            spaced,
            crossings: Vec::new(),
            labels: vec![None; pg.edges.len()],
            origin: DrawingCoord::new(0, 0),
        };

        // How far labels stick out of their cell on either side
        let mut left_reach = vec![0i32; cross_len];
        let mut right_reach = vec![0i32; cross_len];
        if vertical {
            for (route, &len) in pg.edges.iter().zip(label_lens) {
                if len == 0 || route.kind == RouteKind::SelfLoop {
                    continue;
                }
                let (cell, at) = grid.far_end(route, label_hop(route));
                let c = cell.cross(direction);
                left_reach[c] = left_reach[c].max(len / 2 - at);
                right_reach[c] =
                    right_reach[c].max(at + (len - 1 - len / 2) - (grid.cross_size[c] - 1));
            }
        }

        let mut at = 0;
        for c in 0..cross_len {
            grid.cross_start[c] = at;
            at += grid.cross_size[c];
            if c + 1 < cross_len && grid.cross_size[c] > 0 {
                let next_reach = (c + 1..cross_len)
                    .find(|&d| grid.cross_size[d] > 0)
                    .map_or(0, |d| left_reach[d]);
                let reach = right_reach[c].max(next_reach);
                let mut gap = pad_cross.max(cross_reach[c]).max(1);
                if reach > 0 {
                    gap = gap.max(reach + 2);
                }
                at += gap;
            }
        }
        for (e, placed) in grid.boxes.iter_mut().zip(&pg.nodes) {
            e.c0 += grid.cross_start[placed.pos.cross(direction)];
        }
        grid
    }

    /// Tracks, jogs and label bands per gap, and positions along the flow.
    fn along(&mut self, pg: &PositionedGraph, label_lens: &[i32], pad_flow: i32) {
        let direction = self.direction;
        let vertical = direction.is_vertical();
        let flow_len = self.flow_size.len();
        let gaps = flow_len.saturating_sub(1);

        let mut gap_hops = vec![GapHops::default(); gaps];
        self.crossings = pg
            .edges
            .iter()
            .map(|route| match route.kind {
                RouteKind::SelfLoop => Vec::new(),
                _ => vec![Crossing::Straight; route.hops()],
            })
            .collect();
        for (edge, route) in pg.edges.iter().enumerate() {
            if route.kind == RouteKind::SelfLoop {
                continue;
            }
            for hop in 0..route.hops() {
                let (start, end) = self.hop_ends(route, hop);
                let (near, far) = if ahead(route, hop, direction) {
                    (start.c, end.c)
                } else {
                    (end.c, start.c)
                };
                let gap = &mut gap_hops[gap_of(route, hop, direction)];
                gap.taken.extend([near, far]);
                if route.tracks[hop].is_some() || near != far {
                    gap.hops.push((edge, hop));
                    gap.ends.push((near, far));
                }
            }
        }

        let channels: Vec<Channel> = gap_hops
            .iter()
            .map(|gap| channel::plan(&gap.ends, |a, b| a == b))
            .collect();

        let mut gap_labels: Vec<Vec<usize>> = vec![Vec::new(); gaps];
        for (edge, route) in pg.edges.iter().enumerate() {
            if label_lens[edge] > 0 && route.kind != RouteKind::SelfLoop {
                gap_labels[gap_of(route, label_hop(route), direction)].push(edge);
            }
        }
        // One row per label across a vertical flow, the widest label plus a
        // stroke either side along a horizontal one
        let band: Vec<i32> = gap_labels
            .iter()
            .map(|edges| {
                if vertical {
                    edges.len() as i32
                } else {
                    edges
                        .iter()
                        .map(|&edge| label_lens[edge] + 2)
                        .max()
                        .unwrap_or(0)
                }
            })
            .collect();

        let needed =
            |g: usize, loops: i32| loops + channels[g].tracks as i32 + band[g] + 3;
        let mut at = 0;
        for f in 0..flow_len {
            self.flow_start[f] = at;
            at += self.flow_size[f];
            if f < gaps {
                at += pad_flow.max(needed(f, self.loop_depth[f]));
            }
        }
        for (e, placed) in self.boxes.iter_mut().zip(&pg.nodes) {
            let f = placed.pos.flow(direction);
            e.f0 = self.flow_start[f] + self.flow_size[f] / 2 - e.f_len / 2;
        }

        for (g, (gap, channel)) in gap_hops.iter().zip(&channels).enumerate() {
            let base = self.track_base(g);
            let mut taken = gap.taken.clone();
            for (&(edge, hop), (&(near, far), run)) in
                gap.hops.iter().zip(gap.ends.iter().zip(&channel.runs))
            {
                self.crossings[edge][hop] = match *run {
                    Run::Track(t) => Crossing::Track(base + t as i32),
                    Run::Jog { near: t1, far: t2 } => {
                        let lane = free_lane(near, far, &taken);
                        taken.push(lane);
                        Crossing::Jog {
                            near: base + t1 as i32,
                            far: base + t2 as i32,
                            lane,
                        }
                    }
                };
            }

            let size = self.flow_start[g + 1] - self.flow_start[g] - self.flow_size[g];
            let spare = size - needed(g, self.loop_depth[g]);
            let band_start = base + channel.tracks as i32 + (spare + 1) / 2;
            for (row, &edge) in (0..).zip(&gap_labels[g]) {
                let route = &pg.edges[edge];
                let len = label_lens[edge];
                let (_, at) = self.far_end(route, label_hop(route));
                self.labels[edge] = Some(if vertical {
                    FlowPoint::new(band_start + row, at - len / 2)
                } else {
                    FlowPoint::new(band_start + (band[g] - len) / 2, at)
                });
            }
        }
    }

    /// Move everything right by `dx` and down by `dy`.
    pub fn shift(&mut self, dx: i32, dy: i32) {
        self.origin.x += dx;
        self.origin.y += dy;
    }

    pub fn to_drawing(&self, p: FlowPoint) -> DrawingCoord {
        let (x, y) = if self.direction.is_vertical() {
            (p.c, p.f)
        } else {
            (p.f, p.c)
        };
        DrawingCoord::new(x + self.origin.x, y + self.origin.y)
    }

    pub fn box_rect(&self, node: usize) -> BoxRect {
        let e = self.boxes[node];
        let top_left = self.to_drawing(FlowPoint::new(e.f0, e.c0));
        let (width, height) = if self.direction.is_vertical() {
            (e.c_len, e.f_len)
        } else {
            (e.f_len, e.c_len)
        };
        BoxRect {
            x: top_left.x,
            y: top_left.y,
            width,
            height,
        }
    }

    fn centre(&self, cell: GridPos) -> FlowPoint {
        let f = cell.flow(self.direction);
        let c = cell.cross(self.direction);
        FlowPoint::new(
            self.flow_start[f] + self.flow_size[f] / 2,
            self.cross_start[c] + self.cross_size[c] / 2,
        )
    }

    /// Offset of a port along a face that runs across the flow.
    fn across_offset(&self, node: usize, port: Port, face: Face) -> i32 {
        let inner = self.boxes[node].c_len - 2;
        let spaced = &self.spaced[node];
        match (face, spaced.get(port.slot), spaced.last()) {
            (Face::FlowBefore, Some(&at), Some(&span)) => (inner - 1 - span) / 2 + at,
            _ => slot_offset(port.slot, port.slots, inner),
        }
    }

    /// Border cell of a port and the cell just outside it.
    fn port_points(&self, node: usize, port: Port) -> (FlowPoint, FlowPoint) {
        let e = self.boxes[node];
        match face(self.direction, port.side) {
            side @ (Face::FlowBefore | Face::FlowAfter) => {
                let c = e.c0 + 1 + self.across_offset(node, port, side);
                if side == Face::FlowBefore {
                    (FlowPoint::new(e.f0, c), FlowPoint::new(e.f0 - 1, c))
                } else {
                    (FlowPoint::new(e.f_end(), c), FlowPoint::new(e.f_end() + 1, c))
                }
            }
            side => {
                let f = e.f0 + 1 + slot_offset(port.slot, port.slots, e.f_len - 2);
                if side == Face::CrossBefore {
                    (FlowPoint::new(f, e.c0), FlowPoint::new(f, e.c0 - 1))
                } else {
                    (FlowPoint::new(f, e.c_end()), FlowPoint::new(f, e.c_end() + 1))
                }
            }
        }
    }

    /// Border cell the edge leaves its source box through.
    pub fn source_border(&self, route: &EdgeRoute) -> DrawingCoord {
        self.to_drawing(self.port_points(route.source, route.source_port).0)
    }

    /// First flow coordinate free for tracks in the gap after flow index `gap`.
    fn track_base(&self, gap: usize) -> i32 {
        self.flow_start[gap] + self.flow_size[gap] + self.loop_depth[gap] + 1
    }

    /// Where a hop leaves and where it arrives: just outside a port, or at
    /// a waypoint's centre.
    fn hop_ends(&self, route: &EdgeRoute, hop: usize) -> (FlowPoint, FlowPoint) {
        let last = route.hops() - 1;
        let start = if hop == 0 {
            self.port_points(route.source, route.source_port).1
        } else {
            self.centre(route.points[hop])
        };
        let end = if hop == last {
            self.port_points(route.target, route.target_port).1
        } else {
            self.centre(route.points[hop + 1])
        };
        (start, end)
    }

    /// The cell on the far side of a hop's gap and the cross coordinate the
    /// hop meets it at.
    fn far_end(&self, route: &EdgeRoute, hop: usize) -> (GridPos, i32) {
        let (start, end) = self.hop_ends(route, hop);
        if ahead(route, hop, self.direction) {
            (route.points[hop + 1], end.c)
        } else {
            (route.points[hop], start.c)
        }
    }

    /// Flow/cross points of one hop of edge `edge`: out of the start, along
    /// its tracks, into the end.
    fn hop_path(&self, edge: usize, route: &EdgeRoute, hop: usize) -> Vec<FlowPoint> {
        let (start, end) = self.hop_ends(route, hop);
        let crossing = self
            .crossings
            .get(edge)
            .and_then(|hops| hops.get(hop))
            .copied()
            .unwrap_or(Crossing::Straight);

        let points = match crossing {
            Crossing::Straight => vec![start, end],
            Crossing::Track(f) => {
                vec![start, FlowPoint::new(f, start.c), FlowPoint::new(f, end.c), end]
            }
            Crossing::Jog { near, far, lane } => {
                let (first, second) = if ahead(route, hop, self.direction) {
                    (near, far)
                } else {
                    (far, near)
                };
                vec![
                    start,
                    FlowPoint::new(first, start.c),
                    FlowPoint::new(first, lane),
                    FlowPoint::new(second, lane),
                    FlowPoint::new(second, end.c),
                    end,
                ]
            }
        };
        simplify(points)
    }

    /// The path of a self-loop, nested outside any loops declared after it.
    pub fn loop_path(&self, route: &EdgeRoute) -> Vec<FlowPoint> {
        let e = self.boxes[route.source];
        let loops = route.source_port.slots as i32;
        let k = route.source_port.slot as i32;
        let reach = 2 + (loops - 1 - k);

        let exit = self.port_points(route.source, route.source_port).1;
        let entry = self.port_points(route.target, route.target_port).1;
        let far_c = e.c_end() + reach;
        let far_f = e.f_end() + reach;

        vec![
            exit,
            FlowPoint::new(exit.f, far_c),
            FlowPoint::new(far_f, far_c),
            FlowPoint::new(far_f, entry.c),
            entry,
        ]
    }

    /// The full path of edge `edge` in canvas coordinates.
    pub fn edge_path(&self, edge: usize, route: &EdgeRoute) -> Vec<DrawingCoord> {
        let points = if route.kind == RouteKind::SelfLoop {
            self.loop_path(route)
        } else {
            let mut points = Vec::new();
            for hop in 0..route.hops() {
                points.extend(self.hop_path(edge, route, hop));
            }
            simplify(points)
        };
        points.into_iter().map(|p| self.to_drawing(p)).collect()
    }

    /// Where the label of edge `edge` starts. Labels sit on the middle
    /// hop's run into the far side of its gap, in a band past the tracks.
    pub fn label_at(&self, edge: usize) -> Option<DrawingCoord> {
        self.labels
            .get(edge)
            .copied()
            .flatten()
            .map(|p| self.to_drawing(p))
    }

    /// Where a self-loop's label starts: beside the loop across the flow
    /// for vertical flows, under it otherwise.
    pub fn loop_label_at(&self, route: &EdgeRoute, len: i32) -> DrawingCoord {
        let path = self.loop_path(route);
        let exit = path[0];
        let far = path[2];
        if self.direction.is_vertical() {
            self.to_drawing(FlowPoint::new((exit.f + far.f) / 2, far.c + 2))
        } else {
            self.to_drawing(FlowPoint::new((exit.f + far.f) / 2 - len / 2, far.c + 1))
        }
    }
}

/// Drop repeated points and points in the middle of a straight run.
fn simplify(points: Vec<FlowPoint>) -> Vec<FlowPoint> {
    let mut out: Vec<FlowPoint> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() == Some(&p) {
            continue;
        }
        if let [.., a, b] = out.as_slice() {
            if (a.f == b.f && b.f == p.f) || (a.c == b.c && b.c == p.c) {
                out.pop();
            }
        }
        out.push(p);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout;
    use crate::parser::parse;
    use std::collections::HashMap;

    fn grid(src: &str) -> (PositionedGraph, AsciiGrid) {
        let pg = layout(&parse(src).unwrap()).unwrap();
        let grid = AsciiGrid::new(&pg, &AsciiRenderOptions::default());
        (pg, grid)
    }

    #[test]
    fn slots_spread_evenly() {
        assert_eq!(slot_offset(0, 1, 3), 1);
        assert_eq!(slot_offset(0, 2, 3), 0);
        assert_eq!(slot_offset(1, 2, 3), 2);
        assert_eq!(slot_offset(2, 3, 5), 4);
    }

    #[test]
    fn boxes_grow_for_ports() {
        let mut slots = SideSlots::default();
        assert_eq!(box_size("A", &slots, 1), (5, 3));
        slots.bottom = 4;
        assert_eq!(box_size("A", &slots, 1), (9, 3));
        slots.right = 2;
        assert_eq!(box_size("A", &slots, 1), (9, 5));
    }

    #[test]
    fn chain_boxes_sit_padding_apart() {
        let (_, grid) = grid("graph LR\nA --> B");
        let a = grid.box_rect(0);
        let b = grid.box_rect(1);
        assert_eq!((a.x, a.y, a.width, a.height), (0, 0, 5, 3));
        assert_eq!(b.x, a.x + a.width + 5);
        assert_eq!(b.y, 0);
    }

    #[test]
    fn straight_edges_run_between_ports() {
        let (pg, grid) = grid("graph TD\nA --> B");
        let path = grid.edge_path(0, &pg.edges[0]);
        assert_eq!(path, vec![DrawingCoord::new(2, 3), DrawingCoord::new(2, 7)]);
    }

    #[test]
    fn bending_edges_turn_on_their_track() {
        let (pg, grid) = grid("graph TD\nA --> B\nA --> C");
        let path = grid.edge_path(1, &pg.edges[1]);
        assert_eq!(path.len(), 4);
        assert_eq!(path[1].y, path[2].y);
        assert!(path[1].y > 3 && path[1].y < path[3].y);
    }

    #[test]
    fn loops_leave_and_return_outside_the_box() {
        let (pg, grid) = grid("graph TD\nA --> A");
        let rect = grid.box_rect(0);
        let path = grid.edge_path(0, &pg.edges[0]);
        assert_eq!(path.len(), 5);
        assert_eq!(path[0].x, rect.x + rect.width);
        assert_eq!(path[4].y, rect.y + rect.height);
        assert!(path[2].x > path[0].x && path[2].y > path[4].y);
    }

    #[test]
    fn labelled_faces_spread_their_ports() {
        assert_eq!(label_spread(&[0, 0]), vec![0, 2]);
        assert_eq!(label_spread(&[5, 0]), vec![0, 4]);
        assert_eq!(label_spread(&[0, 6, 0]), vec![0, 5, 9]);
    }

    const HORIZONTAL: u8 = 1;
    const VERTICAL: u8 = 2;

    /// Every cell a path covers, with the directions it runs through it.
    fn covered(path: &[DrawingCoord]) -> HashMap<(i32, i32), u8> {
        let mut cells = HashMap::new();
        for pair in path.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let run = if a.y == b.y { HORIZONTAL } else { VERTICAL };
            for x in a.x.min(b.x)..=a.x.max(b.x) {
                for y in a.y.min(b.y)..=a.y.max(b.y) {
                    *cells.entry((x, y)).or_insert(0) |= run;
                }
            }
        }
        cells
    }

    #[test]
    fn edges_only_meet_at_crossings() {
        let sources = [
            "graph TD\nA & B --> C & D",
            "graph LR\nA & B --> C & D",
            "graph TD\nA & B & C --> D & E & F",
            "graph TD\nA --> B\nA --> C\nB --> D\nC --> D",
            "graph BT\nA --> B --> C\nA --> C",
            "graph TD\nA --> B --> C --> D\nD --> A",
            "graph RL\nA & B --> C & D\nD ==> A",
        ];
        for src in sources {
            let (pg, grid) = grid(src);
            let paths: Vec<_> = pg
                .edges
                .iter()
                .enumerate()
                .map(|(i, route)| covered(&grid.edge_path(i, route)))
                .collect();
            for (i, a) in paths.iter().enumerate() {
                for b in &paths[i + 1..] {
                    for (cell, runs) in a {
                        let shared = b.get(cell).copied().unwrap_or(0) & runs;
                        assert_eq!(shared, 0, "{src}: two edges run through {cell:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn crossing_fan_jogs_around_the_shared_column() {
        let (pg, grid) = grid("graph TD\nA & B --> C & D");
        let jogs = pg
            .edges
            .iter()
            .enumerate()
            .filter(|(i, route)| grid.edge_path(*i, route).len() == 6)
            .count();
        assert_eq!(jogs, 1);
    }

    #[test]
    fn vertical_labels_clear_other_lines() {
        let (pg, grid) = grid("graph TD\nA -->|a very long edge label| B\nA --> C");
        let at = grid.label_at(0).unwrap();
        let other = covered(&grid.edge_path(1, &pg.edges[1]));
        for x in at.x..at.x + 22 {
            assert!(!other.contains_key(&(x, at.y)), "label covers ({x}, {})", at.y);
        }
        let own = covered(&grid.edge_path(0, &pg.edges[0]));
        assert!((at.x..at.x + 22).any(|x| own.contains_key(&(x, at.y))));
    }

    #[test]
    fn labels_on_one_face_get_their_own_rows() {
        let (pg, grid) = grid("graph TD\nA -->|first label| C\nB -->|second label| C");
        let a = grid.label_at(0).unwrap();
        let b = grid.label_at(1).unwrap();
        assert_ne!(a.y, b.y);
        let first = covered(&grid.edge_path(0, &pg.edges[0]));
        let second = covered(&grid.edge_path(1, &pg.edges[1]));
        for x in a.x..a.x + 11 {
            assert!(!second.contains_key(&(x, a.y)));
        }
        for x in b.x..b.x + 12 {
            assert!(!first.contains_key(&(x, b.y)));
        }
    }

    #[test]
    fn horizontal_labels_sit_past_the_tracks() {
        let (pg, grid) = grid("graph LR\nA -->|yes| B\nA --> C");
        let at = grid.label_at(0).unwrap();
        let path = grid.edge_path(0, &pg.edges[0]);
        let last = path[path.len() - 1];
        assert_eq!(at.y, last.y);
        assert!(at.x > path[path.len() - 2].x && at.x + 3 <= last.x);
    }

    #[test]
    fn simplify_drops_straight_run_midpoints() {
        let points = vec![
            FlowPoint::new(0, 0),
            FlowPoint::new(2, 0),
            FlowPoint::new(2, 0),
            FlowPoint::new(4, 0),
            FlowPoint::new(4, 3),
        ];
        assert_eq!(
            simplify(points),
            vec![FlowPoint::new(0, 0), FlowPoint::new(4, 0), FlowPoint::new(4, 3)]
        );
    }
}
