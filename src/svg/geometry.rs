//! Pixel placement: grid cells to SVG user units
//!
//! Mirrors the character grid of the ASCII renderer: cells are sized to
//! their largest node, gaps along the flow widen with channel tracks and
//! self-loops, and every length is in px instead of characters. Tracks are
//! ordered per gap by [`channel::plan`] so no two hops share a line.

use super::styles::{estimate_text_width, FontSizes, FontWeights, Spacing};
use super::theme::Theme;
use super::types::{EdgeGeometry, EdgePath, NodeBox, Point};
use crate::layout::channel::{self, Run};
use crate::layout::{EdgeRoute, GridPos, Port, PositionedGraph, RouteKind, Side, SideSlots};
use crate::types::{Direction, NodeShape};

/// Nodes and edges in pixel space plus the canvas size.
pub struct Placement<'a> {
    pub nodes: Vec<NodeBox<'a>>,
    pub edges: Vec<EdgePath<'a>>,
    pub width: f64,
    pub height: f64,
}

/// Node size for a label, grown so each port has room and the label fits
/// inside the shape.
pub fn node_size(label: &str, shape: NodeShape, slots: &SideSlots, font_size: f64) -> (f64, f64) {
    let text = estimate_text_width(label, font_size, FontWeights::NODE_LABEL);
    let across = slots.top.max(slots.bottom) as f64;
    let down = slots.left.max(slots.right) as f64;
    let w = (text + 2.0 * Spacing::NODE_PAD_X)
        .max(Spacing::MIN_NODE_WIDTH)
        .max((across + 1.0) * Spacing::PORT_GAP);
    let h = Spacing::NODE_HEIGHT.max((down + 1.0) * Spacing::PORT_GAP);

    match shape {
        NodeShape::Diamond => (w + h, w + h),
        NodeShape::Circle => (w.max(h), w.max(h)),
        NodeShape::DoubleCircle => (w.max(h) + 10.0, w.max(h) + 10.0),
        NodeShape::Hexagon | NodeShape::Stadium => (w + h / 2.0, h),
        NodeShape::Cylinder => (w, h + 14.0),
        NodeShape::Asymmetric => (w + 12.0, h),
        NodeShape::Trapezoid | NodeShape::TrapezoidAlt => (w / 0.7, h),
        _ => (w, h),
    }
}

/// Extra room a node's self-loops take beyond its border.
fn loop_allowance(loops: usize) -> f64 {
    if loops == 0 {
        0.0
    } else {
        Spacing::LOOP_REACH + Spacing::LOOP_STEP * (loops - 1) as f64 + Spacing::LABEL_PAD
    }
}

/// Ports closer than this across the flow count as the same line.
fn same_cross(a: f64, b: f64) -> bool {
    (a - b).abs() < Spacing::PORT_GAP / 4.0
}

/// The free cross coordinate closest to the middle of a jog.
fn free_lane(near: f64, far: f64, taken: &[f64]) -> f64 {
    let mid = (near + far) / 2.0;
    (0..64)
        .flat_map(|k| {
            let d = Spacing::TRACK * k as f64;
            [mid + d, mid - d]
        })
        .find(|&c| taken.iter().all(|&t| (t - c).abs() >= Spacing::TRACK / 2.0))
        .unwrap_or(mid)
}

/// How one hop crosses its gap. Tracks count from the gap's first track.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Crossing {
    Straight,
    Track(usize),
    /// Two tracks joined along `lane`, a free cross coordinate
    Jog { near: usize, far: usize, lane: f64 },
}

struct Frame {
    direction: Direction,
    flow_start: Vec<f64>,
    flow_size: Vec<f64>,
    cross_start: Vec<f64>,
    cross_size: Vec<f64>,
    loop_depth: Vec<usize>,
    /// Node boxes as (f0, f_len, c0, c_len)
    boxes: Vec<(f64, f64, f64, f64)>,
    /// Per edge and hop
    crossings: Vec<Vec<Crossing>>,
}

impl Frame {
    fn point(&self, f: f64, c: f64) -> Point {
        if self.direction.is_vertical() {
            Point::new(c, f)
        } else {
            Point::new(f, c)
        }
    }

    fn centre(&self, cell: GridPos) -> (f64, f64) {
        let f = cell.flow(self.direction);
        let c = cell.cross(self.direction);
        (
            self.flow_start[f] + self.flow_size[f] / 2.0,
            self.cross_start[c] + self.cross_size[c] / 2.0,
        )
    }

    /// Attachment point of a port on the node border, in (f, c).
    fn port(&self, node: usize, port: Port) -> (f64, f64) {
        let (f0, f_len, c0, c_len) = self.boxes[node];
        let t = (port.slot as f64 + 1.0) / (port.slots as f64 + 1.0);
        let vertical = self.direction.is_vertical();
        match (vertical, port.side) {
            (true, Side::Top) | (false, Side::Left) => (f0, c0 + t * c_len),
            (true, Side::Bottom) | (false, Side::Right) => (f0 + f_len, c0 + t * c_len),
            (true, Side::Left) | (false, Side::Top) => (f0 + t * f_len, c0),
            (true, Side::Right) | (false, Side::Bottom) => (f0 + t * f_len, c0 + c_len),
        }
    }

    fn track_base(&self, gap: usize) -> f64 {
        self.flow_start[gap]
            + self.flow_size[gap]
            + loop_allowance(self.loop_depth[gap])
            + (Spacing::FLOW_GAP - Spacing::TRACK) / 2.0
    }

    fn ahead(&self, route: &EdgeRoute, hop: usize) -> bool {
        route.points[hop + 1].flow(self.direction) > route.points[hop].flow(self.direction)
    }

    fn gap_of(&self, route: &EdgeRoute, hop: usize) -> usize {
        route.points[hop]
            .flow(self.direction)
            .min(route.points[hop + 1].flow(self.direction))
    }

    /// Where a hop leaves and arrives, in (f, c).
    fn hop_ends(&self, route: &EdgeRoute, hop: usize) -> ((f64, f64), (f64, f64)) {
        let last = route.hops() - 1;
        let start = if hop == 0 {
            self.port(route.source, route.source_port)
        } else {
            self.centre(route.points[hop])
        };
        let end = if hop == last {
            self.port(route.target, route.target_port)
        } else {
            self.centre(route.points[hop + 1])
        };
        (start, end)
    }

    /// Order the tracks of every gap and return how many each gap needs.
    /// Only cross coordinates are read, so this runs before the flow
    /// positions are known.
    fn plan_channels(&mut self, pg: &PositionedGraph) -> Vec<usize> {
        let gaps = self.flow_size.len().saturating_sub(1);
        let mut hops: Vec<Vec<(usize, usize)>> = vec![Vec::new(); gaps];
        let mut ends: Vec<Vec<(f64, f64)>> = vec![Vec::new(); gaps];
        let mut taken: Vec<Vec<f64>> = vec![Vec::new(); gaps];

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
                let (near, far) = if self.ahead(route, hop) {
                    (start.1, end.1)
                } else {
                    (end.1, start.1)
                };
                let gap = self.gap_of(route, hop);
                taken[gap].extend([near, far]);
                if route.tracks[hop].is_some() || !same_cross(near, far) {
                    hops[gap].push((edge, hop));
                    ends[gap].push((near, far));
                }
            }
        }

        let mut counts = Vec::with_capacity(gaps);
        for gap in 0..gaps {
            let planned = channel::plan(&ends[gap], same_cross);
            for (&(edge, hop), (&(near, far), run)) in
                hops[gap].iter().zip(ends[gap].iter().zip(&planned.runs))
            {
                self.crossings[edge][hop] = match *run {
                    Run::Track(t) => Crossing::Track(t),
                    Run::Jog { near: first, far: second } => {
                        let lane = free_lane(near, far, &taken[gap]);
                        taken[gap].push(lane);
                        Crossing::Jog {
                            near: first,
                            far: second,
                            lane,
                        }
                    }
                };
            }
            counts.push(planned.tracks);
        }
        counts
    }

    fn hop_path(&self, edge: usize, route: &EdgeRoute, hop: usize) -> Vec<(f64, f64)> {
        let (start, end) = self.hop_ends(route, hop);
        let base = self.track_base(self.gap_of(route, hop));
        let track = |t: usize| base + Spacing::TRACK * t as f64;
        let crossing = self
            .crossings
            .get(edge)
            .and_then(|hops| hops.get(hop))
            .copied()
            .unwrap_or(Crossing::Straight);

        match crossing {
            Crossing::Straight => vec![start, end],
            Crossing::Track(t) => {
                let f = track(t);
                vec![start, (f, start.1), (f, end.1), end]
            }
            Crossing::Jog { near, far, lane } => {
                let (first, second) = if self.ahead(route, hop) {
                    (track(near), track(far))
                } else {
                    (track(far), track(near))
                };
                vec![
                    start,
                    (first, start.1),
                    (first, lane),
                    (second, lane),
                    (second, end.1),
                    end,
                ]
            }
        }
    }

    fn edge_points(&self, edge: usize, route: &EdgeRoute) -> Vec<(f64, f64)> {
        let mut points: Vec<(f64, f64)> = Vec::new();
        for hop in 0..route.hops() {
            for p in self.hop_path(edge, route, hop) {
                if points.last() != Some(&p) {
                    points.push(p);
                }
            }
        }
        drop_collinear(points)
    }

    /// Start, control points and end of a self-loop; loops declared first
    /// reach furthest.
    fn loop_points(&self, route: &EdgeRoute) -> [(f64, f64); 4] {
        let loops = route.source_port.slots;
        let k = route.source_port.slot;
        let reach = Spacing::LOOP_REACH + Spacing::LOOP_STEP * (loops - 1 - k) as f64;
        let exit = self.port(route.source, route.source_port);
        let entry = self.port(route.target, route.target_port);
        [
            exit,
            (exit.0, exit.1 + reach * 1.6),
            (entry.0 + reach * 1.6, entry.1),
            entry,
        ]
    }
}

fn drop_collinear(points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    let mut out: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    for p in points {
        if let [.., a, b] = out.as_slice() {
            if (a.0 == b.0 && b.0 == p.0) || (a.1 == b.1 && b.1 == p.1) {
                out.pop();
            }
        }
        out.push(p);
    }
    out
}

/// Midpoint of the longest segment.
fn longest_midpoint(points: &[Point]) -> Point {
    let mut best = (points[0], points[points.len() - 1]);
    let mut best_len = -1.0;
    for pair in points.windows(2) {
        let len = (pair[1].x - pair[0].x).abs() + (pair[1].y - pair[0].y).abs();
        if len > best_len {
            best_len = len;
            best = (pair[0], pair[1]);
        }
    }
    Point::new((best.0.x + best.1.x) / 2.0, (best.0.y + best.1.y) / 2.0)
}

/// Width and height of an edge label's background.
pub fn label_size(label: &str, theme: &Theme) -> (f64, f64) {
    let size = theme.font_size - FontSizes::EDGE_LABEL_DELTA;
    (
        estimate_text_width(label, size, FontWeights::EDGE_LABEL) + 2.0 * Spacing::LABEL_PAD,
        size + 2.0 * Spacing::LABEL_PAD,
    )
}

pub fn place<'a>(pg: &'a PositionedGraph, theme: &Theme) -> Placement<'a> {
    let direction = pg.direction();
    let vertical = direction.is_vertical();
    let flow_len = pg.flow_len();
    let cross_len = pg.cross_len();

    let mut flow_size = vec![0.0f64; flow_len];
    let mut cross_size = vec![0.0f64; cross_len];
    let mut cross_used = vec![false; cross_len];
    let mut loop_depth = vec![0usize; flow_len];
    let mut cross_loops = vec![0usize; cross_len];
    let mut sizes = Vec::with_capacity(pg.nodes.len());

    for (placed, node) in pg.nodes.iter().zip(&pg.graph.nodes) {
        let (w, h) = node_size(&node.label, node.shape, &placed.slots, theme.font_size);
        let (f_len, c_len) = if vertical { (h, w) } else { (w, h) };
        let f = placed.pos.flow(direction);
        let c = placed.pos.cross(direction);
        flow_size[f] = flow_size[f].max(f_len);
        cross_size[c] = cross_size[c].max(c_len);
        cross_used[c] = true;
        loop_depth[f] = loop_depth[f].max(placed.loops);
        cross_loops[c] = cross_loops[c].max(placed.loops);
        sizes.push((f_len, c_len));
    }
    for cell in pg.waypoints() {
        cross_used[cell.cross(direction)] = true;
    }

    // Horizontal flows carry edge labels inside the flow gaps
    let mut label_reach = vec![0.0f64; flow_len];
    if !vertical {
        for (route, edge) in pg.edges.iter().zip(&pg.graph.edges) {
            let Some(label) = &edge.label else { continue };
            if route.kind == RouteKind::SelfLoop {
                continue;
            }
            let hop = (route.hops() - 1) / 2;
            let gap = route.points[hop]
                .flow(direction)
                .min(route.points[hop + 1].flow(direction));
            let (w, _) = label_size(label, theme);
            label_reach[gap] = label_reach[gap].max(w + 2.0 * Spacing::TRACK);
        }
    }

    let mut cross_start = Vec::with_capacity(cross_len);
    let mut at = Spacing::MARGIN;
    for c in 0..cross_len {
        cross_start.push(at);
        at += cross_size[c];
        if c + 1 < cross_len && cross_used[c] {
            at += Spacing::CROSS_GAP + loop_allowance(cross_loops[c]);
        }
    }

    // Boxes sit at flow 0 until the channels say how wide each gap is
    let boxes: Vec<(f64, f64, f64, f64)> = pg
        .nodes
        .iter()
        .zip(&sizes)
        .map(|(placed, &(f_len, c_len))| {
            let c = placed.pos.cross(direction);
            (0.0, f_len, cross_start[c] + (cross_size[c] - c_len) / 2.0, c_len)
        })
        .collect();

    let mut frame = Frame {
        direction,
        flow_start: vec![0.0; flow_len],
        flow_size,
        cross_start,
        cross_size,
        loop_depth,
        boxes,
        crossings: Vec::new(),
    };
    let gap_tracks = frame.plan_channels(pg);

    let mut at = Spacing::MARGIN;
    for f in 0..flow_len {
        frame.flow_start[f] = at;
        at += frame.flow_size[f];
        if let Some(&tracks) = gap_tracks.get(f) {
            at += Spacing::FLOW_GAP.max(label_reach[f])
                + loop_allowance(frame.loop_depth[f])
                + Spacing::TRACK * tracks as f64;
        }
    }
    for (b, placed) in frame.boxes.iter_mut().zip(&pg.nodes) {
        let f = placed.pos.flow(direction);
        b.0 = frame.flow_start[f] + (frame.flow_size[f] - b.1) / 2.0;
    }

    let nodes: Vec<NodeBox<'a>> = pg
        .graph
        .nodes
        .iter()
        .zip(&frame.boxes)
        .map(|(node, &(f0, f_len, c0, c_len))| {
            let corner = frame.point(f0, c0);
            let (width, height) = if vertical { (c_len, f_len) } else { (f_len, c_len) };
            NodeBox {
                label: &node.label,
                shape: node.shape,
                x: corner.x,
                y: corner.y,
                width,
                height,
            }
        })
        .collect();

    let edges: Vec<EdgePath<'a>> = pg
        .edges
        .iter()
        .zip(&pg.graph.edges)
        .enumerate()
        .map(|(i, (route, edge))| {
            let to_px = |p: &(f64, f64)| frame.point(p.0, p.1);
            let (geometry, label_at) = match route.kind {
                RouteKind::SelfLoop => {
                    let [a, b, c, d] = frame.loop_points(route).map(|p| to_px(&p));
                    // Point at t = 0.5 on the cubic
                    let mid = Point::new(
                        (a.x + 3.0 * b.x + 3.0 * c.x + d.x) / 8.0,
                        (a.y + 3.0 * b.y + 3.0 * c.y + d.y) / 8.0,
                    );
                    (EdgeGeometry::Loop([a, b, c, d]), mid)
                }
                kind => {
                    let points: Vec<Point> = frame.edge_points(i, route).iter().map(to_px).collect();
                    let hop = (route.hops() - 1) / 2;
                    let middle: Vec<Point> = frame.hop_path(i, route, hop).iter().map(to_px).collect();
                    let mid = longest_midpoint(&middle);
                    if kind == RouteKind::Reversed {
                        (EdgeGeometry::Curve(points), mid)
                    } else {
                        (EdgeGeometry::Orthogonal(points), mid)
                    }
                }
            };
            EdgePath {
                geometry,
                style: edge.style,
                has_arrow_start: edge.has_arrow_start,
                has_arrow_end: edge.has_arrow_end,
                label: edge.label.as_deref().map(|l| (l, label_at)),
            }
        })
        .collect();

    fit(nodes, edges, theme)
}

/// Translate everything so the drawing keeps a full margin on every side,
/// and size the canvas to match.
fn fit<'a>(mut nodes: Vec<NodeBox<'a>>, mut edges: Vec<EdgePath<'a>>, theme: &Theme) -> Placement<'a> {
    let mut min = Point::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    let mut include = |p: Point| {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    };

    for node in &nodes {
        include(Point::new(node.x, node.y));
        include(Point::new(node.x + node.width, node.y + node.height));
    }
    for edge in &edges {
        match &edge.geometry {
            EdgeGeometry::Orthogonal(points) | EdgeGeometry::Curve(points) => {
                points.iter().copied().for_each(&mut include)
            }
            EdgeGeometry::Loop(points) => points.iter().copied().for_each(&mut include),
        }
        if let Some((label, at)) = edge.label {
            let (w, h) = label_size(label, theme);
            include(Point::new(at.x - w / 2.0, at.y - h / 2.0));
            include(Point::new(at.x + w / 2.0, at.y + h / 2.0));
        }
    }

    if nodes.is_empty() {
        return Placement {
            nodes,
            edges,
            width: 2.0 * Spacing::MARGIN,
            height: 2.0 * Spacing::MARGIN,
        };
    }

    let dx = Spacing::MARGIN - min.x;
    let dy = Spacing::MARGIN - min.y;
    let shift = |p: &mut Point| {
        p.x += dx;
        p.y += dy;
    };
    for node in &mut nodes {
        node.x += dx;
        node.y += dy;
    }
    for edge in &mut edges {
        match &mut edge.geometry {
            EdgeGeometry::Orthogonal(points) | EdgeGeometry::Curve(points) => {
                points.iter_mut().for_each(shift)
            }
            EdgeGeometry::Loop(points) => points.iter_mut().for_each(shift),
        }
        if let Some((_, at)) = &mut edge.label {
            shift(at);
        }
    }

    Placement {
        nodes,
        edges,
        width: max.x - min.x + 2.0 * Spacing::MARGIN,
        height: max.y - min.y + 2.0 * Spacing::MARGIN,
    }
}
