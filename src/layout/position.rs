//! Cross-axis coordinates and grid mapping

use super::order::LayeredGraph;
use super::GridPos;
use crate::types::Direction;

/// Alternating down/up placement passes.
const POSITION_PASSES: usize = 4;

/// Cross-axis coordinate per vertex. Each vertex moves toward the rounded
/// average of its neighbours in the reference layer, then vertices are
/// packed left to right at least one cell apart.
pub(crate) fn assign_cross(lg: &LayeredGraph) -> Vec<usize> {
    let mut x = index_spacing(lg);

    for pass in 0..POSITION_PASSES {
        if pass % 2 == 0 {
            for layer in lg.layers.iter().skip(1) {
                place_layer(layer, &lg.upper, &mut x);
            }
        } else {
            for layer in lg.layers.iter().rev().skip(1) {
                place_layer(layer, &lg.lower, &mut x);
            }
        }
    }

    let min = x.iter().copied().min().unwrap_or(0);
    for v in x.iter_mut() {
        *v -= min;
    }
    x
}

/// Plain index-in-layer coordinates.
pub(crate) fn index_spacing(lg: &LayeredGraph) -> Vec<usize> {
    super::order::positions(&lg.layers, lg.vertices.len())
}

fn place_layer(layer: &[usize], neighbours: &[Vec<usize>], x: &mut [usize]) {
    let mut next_free = 0;
    for &v in layer {
        let wanted = match neighbours[v].as_slice() {
            [] => x[v],
            ns => round_half_down(ns.iter().map(|&w| x[w]).sum(), ns.len()),
        };
        let placed = wanted.max(next_free);
        x[v] = placed;
        next_free = placed + 1;
    }
}

/// `sum / count` rounded to nearest, halves rounding down.
fn round_half_down(sum: usize, count: usize) -> usize {
    (2 * sum + count - 1) / (2 * count)
}

/// Grid cell per vertex: the layer runs along the flow axis, reversed for
/// BT and RL.
pub(crate) fn to_grid(direction: Direction, lg: &LayeredGraph, cross: &[usize]) -> Vec<GridPos> {
    let last = lg.layers.len().saturating_sub(1);
    lg.vertices
        .iter()
        .zip(cross)
        .map(|(vertex, &c)| {
            let flow = if direction.is_reversed() {
                last - vertex.layer
            } else {
                vertex.layer
            };
            if direction.is_vertical() {
                GridPos::new(flow, c)
            } else {
                GridPos::new(c, flow)
            }
        })
        .collect()
}
