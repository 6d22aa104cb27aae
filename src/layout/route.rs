//! Edge routing: ports on node sides and channel tracks between layers

use super::order::LayeredGraph;
use super::rank::Ranking;
use super::{EdgeRoute, GridPos, Port, RouteKind, Side, SideSlots};
use crate::types::{Direction, Graph};
use std::collections::BTreeMap;

/// Routes plus the per-node and per-gap totals renderers size against.
pub(crate) struct Routed {
    pub edges: Vec<EdgeRoute>,
    pub slots: Vec<SideSlots>,
    pub loops: Vec<usize>,
    pub gap_tracks: Vec<usize>,
}

#[derive(Clone, Copy)]
enum End {
    Source,
    Target,
}

/// Ports on one side sort by (self-loop last, cross coordinate of the far
/// end, declaration order).
type PortKey = (bool, usize, usize);

/// Side of `from` that faces the neighbouring cell `toward`.
fn facing(direction: Direction, from: GridPos, toward: GridPos) -> Side {
    let ahead = toward.flow(direction) > from.flow(direction);
    match (direction.is_vertical(), ahead) {
        (true, true) => Side::Bottom,
        (true, false) => Side::Top,
        (false, true) => Side::Right,
        (false, false) => Side::Left,
    }
}

/// Self-loops leave on the trailing cross side...
fn loop_exit_side(direction: Direction) -> Side {
    if direction.is_vertical() {
        Side::Right
    } else {
        Side::Bottom
    }
}

/// ...and come back on the other trailing side.
fn loop_return_side(direction: Direction) -> Side {
    if direction.is_vertical() {
        Side::Bottom
    } else {
        Side::Right
    }
}

pub(crate) fn route(
    graph: &Graph,
    ends: &[(usize, usize)],
    ranking: &Ranking,
    lg: &LayeredGraph,
    cells: &[GridPos],
) -> Routed {
    let direction = graph.direction;
    let node_count = graph.nodes.len();

    // Vertices from source to target
    let paths: Vec<Vec<usize>> = ends
        .iter()
        .enumerate()
        .map(|(edge, &(source, target))| {
            if source == target {
                return vec![source, source];
            }
            let mut chain = lg.chains[edge].clone();
            if ranking.reversed[edge] {
                chain.reverse();
            }
            chain
        })
        .collect();

    let mut source_ports = Vec::with_capacity(ends.len());
    let mut target_ports = Vec::with_capacity(ends.len());
    let mut groups: BTreeMap<(usize, Side), Vec<(PortKey, usize, End)>> = BTreeMap::new();
    let mut loops = vec![0; node_count];

    for (edge, path) in paths.iter().enumerate() {
        let (source, target) = ends[edge];
        let (source_side, source_key, target_side, target_key) = if source == target {
            loops[source] += 1;
            (
                loop_exit_side(direction),
                (true, 0, edge),
                loop_return_side(direction),
                (true, 0, edge),
            )
        } else {
            let first = cells[path[0]];
            let second = cells[path[1]];
            let last = cells[path[path.len() - 1]];
            let before = cells[path[path.len() - 2]];
            (
                facing(direction, first, second),
                (false, second.cross(direction), edge),
                facing(direction, last, before),
                (false, before.cross(direction), edge),
            )
        };

        source_ports.push(Port {
            side: source_side,
            slot: 0,
            slots: 1,
        });
        target_ports.push(Port {
            side: target_side,
            slot: 0,
            slots: 1,
        });
        groups
            .entry((source, source_side))
            .or_default()
            .push((source_key, edge, End::Source));
        groups
            .entry((target, target_side))
            .or_default()
            .push((target_key, edge, End::Target));
    }

    let mut slots = vec![SideSlots::default(); node_count];
    for ((node, side), mut requests) in groups {
        requests.sort_by_key(|&(key, _, _)| key);
        let count = requests.len();
        slots[node].set(side, count);
        for (slot, &(_, edge, end)) in requests.iter().enumerate() {
            let port = match end {
                End::Source => &mut source_ports[edge],
                End::Target => &mut target_ports[edge],
            };
            port.slot = slot;
            port.slots = count;
        }
    }

    // One distinct track per bending hop, numbered per gap in declaration order
    let mut gap_tracks = vec![0usize; lg.layers.len().saturating_sub(1)];
    let mut edges = Vec::with_capacity(ends.len());

    for (edge, path) in paths.iter().enumerate() {
        let (source, target) = ends[edge];
        let points: Vec<GridPos> = path.iter().map(|&v| cells[v]).collect();
        let last_hop = points.len() - 2;

        let kind = if source == target {
            RouteKind::SelfLoop
        } else if ranking.reversed[edge] {
            RouteKind::Reversed
        } else {
            RouteKind::Forward
        };

        let tracks = points
            .windows(2)
            .enumerate()
            .map(|(hop, pair)| {
                if kind == RouteKind::SelfLoop {
                    return None;
                }
                let (a, b) = (pair[0], pair[1]);
                let spread = (hop == 0 && source_ports[edge].slots > 1)
                    || (hop == last_hop && target_ports[edge].slots > 1);
                if a.cross(direction) == b.cross(direction) && !spread {
                    return None;
                }
                let gap = a.flow(direction).min(b.flow(direction));
                let track = gap_tracks[gap];
                gap_tracks[gap] += 1;
                Some(track)
            })
            .collect();

        edges.push(EdgeRoute {
            source,
            target,
            points,
            tracks,
            source_port: source_ports[edge],
            target_port: target_ports[edge],
            kind,
        });
    }

    Routed {
        edges,
        slots,
        loops,
        gap_tracks,
    }
}
