//! Virtual waypoints and crossing reduction within layers

use super::rank::Ranking;
use std::cmp::Ordering;
use std::collections::VecDeque;

/// Alternating down/up barycenter sweeps.
const ORDER_PASSES: usize = 8;

/// A vertex of the proper layered graph: a real node or a virtual waypoint.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Vertex {
    pub layer: usize,
    /// Owning edge of a virtual waypoint
    pub edge: Option<usize>,
}

/// The graph with every edge cut into single-layer segments.
///
/// Vertices `0..node_count` are the real nodes in declaration order; virtual
/// waypoints follow.
#[derive(Debug, Clone)]
pub(crate) struct LayeredGraph {
    pub vertices: Vec<Vertex>,
    /// Vertex chain per edge from the lower layer to the higher; empty for self-loops
    pub chains: Vec<Vec<usize>>,
    /// Vertex order within each layer
    pub layers: Vec<Vec<usize>>,
    /// Neighbours in the layer above, one entry per segment
    pub upper: Vec<Vec<usize>>,
    /// Neighbours in the layer below, one entry per segment
    pub lower: Vec<Vec<usize>>,
}

/// Insert virtual waypoints and place vertices in layers by discovery order.
pub(crate) fn build(node_count: usize, ends: &[(usize, usize)], ranking: &Ranking) -> LayeredGraph {
    let mut vertices: Vec<Vertex> = ranking
        .layer
        .iter()
        .map(|&layer| Vertex { layer, edge: None })
        .collect();
    let mut chains = Vec::with_capacity(ends.len());

    for (edge, &pair) in ends.iter().enumerate() {
        let (u, v) = ranking.effective(edge, pair);
        if u == v {
            chains.push(Vec::new());
            continue;
        }
        let mut chain = vec![u];
        for layer in ranking.layer[u] + 1..ranking.layer[v] {
            chain.push(vertices.len());
            vertices.push(Vertex {
                layer,
                edge: Some(edge),
            });
        }
        chain.push(v);
        chains.push(chain);
    }

    let mut upper = vec![Vec::new(); vertices.len()];
    let mut lower = vec![Vec::new(); vertices.len()];
    for chain in &chains {
        for pair in chain.windows(2) {
            lower[pair[0]].push(pair[1]);
            upper[pair[1]].push(pair[0]);
        }
    }

    let layer_count = ranking.layer.iter().map(|&l| l + 1).max().unwrap_or(0);
    let layers = discovery_order(node_count, &vertices, &lower, layer_count);

    LayeredGraph {
        vertices,
        chains,
        layers,
        upper,
        lower,
    }
}

/// Breadth-first from the sources in declaration order.
fn discovery_order(
    node_count: usize,
    vertices: &[Vertex],
    lower: &[Vec<usize>],
    layer_count: usize,
) -> Vec<Vec<usize>> {
    let mut layers = vec![Vec::new(); layer_count];
    let mut seen = vec![false; vertices.len()];
    let mut queue: VecDeque<usize> = VecDeque::new();

    let sources = (0..node_count).filter(|&v| vertices[v].layer == 0);
    // Anything unreachable from a source still needs a slot
    let rest = 0..vertices.len();
    for start in sources.chain(rest) {
        if seen[start] {
            continue;
        }
        seen[start] = true;
        queue.push_back(start);

        while let Some(v) = queue.pop_front() {
            layers[vertices[v].layer].push(v);
            for &w in &lower[v] {
                if !seen[w] {
                    seen[w] = true;
                    queue.push_back(w);
                }
            }
        }
    }

    layers
}

/// Reorder layers with barycenter sweeps, keeping the ordering with the
/// fewest crossings (earlier orderings win ties). Returns that count.
pub(crate) fn minimize_crossings(lg: &mut LayeredGraph) -> usize {
    let mut pos = positions(&lg.layers, lg.vertices.len());
    let mut best = lg.layers.clone();
    let mut best_crossings = count_crossings(&lg.layers, &lg.lower, &pos);

    for pass in 0..ORDER_PASSES {
        if best_crossings == 0 {
            break;
        }
        let LayeredGraph {
            layers,
            upper,
            lower,
            ..
        } = &mut *lg;

        if pass % 2 == 0 {
            for l in 1..layers.len() {
                sort_layer(&mut layers[l], upper, &mut pos);
            }
        } else {
            for l in (0..layers.len().saturating_sub(1)).rev() {
                sort_layer(&mut layers[l], lower, &mut pos);
            }
        }

        let crossings = count_crossings(layers, lower, &pos);
        log::trace!("ordering pass {}: {} crossings", pass, crossings);
        if crossings < best_crossings {
            best_crossings = crossings;
            best = layers.clone();
        }
    }

    lg.layers = best;
    best_crossings
}

/// Position of every vertex within its layer.
pub(crate) fn positions(layers: &[Vec<usize>], vertex_count: usize) -> Vec<usize> {
    let mut pos = vec![0; vertex_count];
    for layer in layers {
        for (i, &v) in layer.iter().enumerate() {
            pos[v] = i;
        }
    }
    pos
}

/// Stable sort by the average position of neighbours in the reference
/// layer. Vertices without neighbours are keyed by their own position.
fn sort_layer(layer: &mut Vec<usize>, neighbours: &[Vec<usize>], pos: &mut [usize]) {
    // (sum, count) compared as fractions
    let keys: Vec<(usize, usize)> = layer
        .iter()
        .enumerate()
        .map(|(i, &v)| match neighbours[v].as_slice() {
            [] => (i, 1),
            ns => (ns.iter().map(|&w| pos[w]).sum(), ns.len()),
        })
        .collect();

    let mut idx: Vec<usize> = (0..layer.len()).collect();
    idx.sort_by(|&a, &b| compare_fraction(keys[a], keys[b]));

    let sorted: Vec<usize> = idx.iter().map(|&i| layer[i]).collect();
    *layer = sorted;
    for (i, &v) in layer.iter().enumerate() {
        pos[v] = i;
    }
}

fn compare_fraction(a: (usize, usize), b: (usize, usize)) -> Ordering {
    (a.0 * b.1).cmp(&(b.0 * a.1))
}

/// Pairs of segments between adjacent layers whose ends are in opposite order.
pub(crate) fn count_crossings(layers: &[Vec<usize>], lower: &[Vec<usize>], pos: &[usize]) -> usize {
    let mut total = 0;
    for layer in layers {
        let segments: Vec<(usize, usize)> = layer
            .iter()
            .flat_map(|&v| lower[v].iter().map(move |&w| (pos[v], pos[w])))
            .collect();
        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if (a.0 < b.0 && a.1 > b.1) || (a.0 > b.0 && a.1 < b.1) {
                    total += 1;
                }
            }
        }
    }
    total
}
