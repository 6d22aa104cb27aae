//! Cycle removal and layer assignment

use std::collections::VecDeque;

/// Layer per node and the back-edges reversed to make the graph acyclic.
#[derive(Debug, Clone)]
pub(crate) struct Ranking {
    pub layer: Vec<usize>,
    pub reversed: Vec<bool>,
}

impl Ranking {
    /// Edge endpoints as laid out: back-edges point the other way.
    pub fn effective(&self, edge: usize, ends: (usize, usize)) -> (usize, usize) {
        if self.reversed[edge] {
            (ends.1, ends.0)
        } else {
            ends
        }
    }
}

/// Reverse back-edges, then assign longest-path layers from the sources.
/// Self-loops take no part in either step.
pub(crate) fn rank(node_count: usize, ends: &[(usize, usize)]) -> Ranking {
    let reversed = find_back_edges(node_count, ends);
    let mut ranking = Ranking {
        layer: Vec::new(),
        reversed,
    };
    ranking.layer = longest_path_layers(node_count, ends, &ranking);
    ranking
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Active,
    Done,
}

/// Depth-first search in declaration order; an edge into a node still on
/// the stack closes a cycle.
fn find_back_edges(node_count: usize, ends: &[(usize, usize)]) -> Vec<bool> {
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (edge, &(source, target)) in ends.iter().enumerate() {
        if source != target {
            out[source].push(edge);
        }
    }

    let mut mark = vec![Mark::New; node_count];
    let mut back = vec![false; ends.len()];

    for root in 0..node_count {
        if mark[root] != Mark::New {
            continue;
        }
        mark[root] = Mark::Active;
        let mut stack = vec![(root, 0usize)];

        while let Some(top) = stack.last_mut() {
            let (node, next) = *top;
            match out[node].get(next) {
                Some(&edge) => {
                    top.1 += 1;
                    let target = ends[edge].1;
                    match mark[target] {
                        Mark::Active => back[edge] = true,
                        Mark::New => {
                            mark[target] = Mark::Active;
                            stack.push((target, 0));
                        }
                        Mark::Done => {}
                    }
                }
                None => {
                    mark[node] = Mark::Done;
                    stack.pop();
                }
            }
        }
    }

    back
}

/// `layer(v) = 0` without predecessors, else `max(layer(u) + 1)`.
fn longest_path_layers(node_count: usize, ends: &[(usize, usize)], ranking: &Ranking) -> Vec<usize> {
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut indegree = vec![0usize; node_count];
    for (edge, &pair) in ends.iter().enumerate() {
        let (u, v) = ranking.effective(edge, pair);
        if u != v {
            out[u].push(v);
            indegree[v] += 1;
        }
    }

    let mut queue: VecDeque<usize> = (0..node_count).filter(|&v| indegree[v] == 0).collect();
    let mut layer = vec![0usize; node_count];

    while let Some(u) = queue.pop_front() {
        for &v in &out[u] {
            layer[v] = layer[v].max(layer[u] + 1);
            indegree[v] -= 1;
            if indegree[v] == 0 {
                queue.push_back(v);
            }
        }
    }

    layer
}
