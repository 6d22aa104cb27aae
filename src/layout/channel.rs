//! Track order inside one gap between layers
//!
//! A renderer knows where each hop meets the two sides of a gap: its
//! `near` end (smaller flow coordinate) and its `far` end. Two hops may
//! meet the sides at the same cross coordinate, one arriving where the
//! other leaves. The one leaving must turn onto its track before the other
//! arrives, otherwise both run down the same stretch of line. [`plan`]
//! orders the tracks so that holds, and splits a hop into a [`Run::Jog`]
//! when the demands form a cycle.

/// How a hop crosses its gap. Tracks count from the near side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Run {
    /// Turn once, on this track.
    Track(usize),
    /// Turn onto `near`, cross to a free lane, and turn onto `far` to
    /// finish. `near < far`.
    Jog { near: usize, far: usize },
}

/// Tracks for every hop of a gap, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub runs: Vec<Run>,
    pub tracks: usize,
}

/// Order the hops given as `(near, far)` cross coordinates.
///
/// Hop `i` must take its near track before any hop `j` whose far end
/// `same`s its near end takes its far track. Ready hops keep their input
/// order; a blocked cycle is broken at its first hop.
pub fn plan<T: Copy>(ends: &[(T, T)], same: impl Fn(T, T) -> bool) -> Channel {
    let n = ends.len();
    let after: Vec<Vec<usize>> = (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| j != i && same(ends[i].0, ends[j].1))
                .collect()
        })
        .collect();
    let mut waiting = vec![0usize; n];
    for list in &after {
        for &j in list {
            waiting[j] += 1;
        }
    }

    let mut near: Vec<Option<usize>> = vec![None; n];
    let mut far: Vec<Option<usize>> = vec![None; n];
    let mut split = vec![false; n];
    let mut next = 0;

    while far.iter().any(Option::is_none) {
        let ready = (0..n).find(|&i| {
            far[i].is_none() && (waiting[i] == 0 || (split[i] && near[i].is_none()))
        });
        let Some(i) = ready else {
            match (0..n).find(|&i| far[i].is_none() && !split[i]) {
                Some(i) => split[i] = true,
                None => break,
            }
            continue;
        };

        if near[i].is_none() {
            near[i] = Some(next);
            for &j in &after[i] {
                waiting[j] -= 1;
            }
            if waiting[i] == 0 {
                far[i] = Some(next);
            }
        } else {
            far[i] = Some(next);
        }
        next += 1;
    }

    let runs = near
        .iter()
        .zip(&far)
        .map(|(a, b)| match (*a, *b) {
            (Some(a), Some(b)) if a != b => Run::Jog { near: a, far: b },
            (Some(a), _) => Run::Track(a),
            (None, _) => Run::Track(0),
        })
        .collect();
    Channel { runs, tracks: next }
}
