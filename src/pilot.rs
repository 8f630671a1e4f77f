// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cell-Free MIMO Simulation Suite - Pilot Assignment
//
// Sequential greedy over UE index order. Earlier UEs get first pick, so the
// result is a reproducible artifact of iteration order rather than a fair
// split of scarce pilots.

use tracing::debug;

use crate::types::Position;

/// Assign one of `num_pilots` pilots to each UE.
///
/// UE `k` takes the lowest pilot not held by any earlier UE closer than
/// `reuse_dist`. When every pilot conflicts it takes the least-used pilot so
/// far, lowest index on ties.
pub fn assign_pilots(ue_positions: &[Position], num_pilots: usize, reuse_dist: f64) -> Vec<usize> {
    let mut assigned: Vec<usize> = Vec::with_capacity(ue_positions.len());
    let mut usage = vec![0usize; num_pilots];

    for (k, pos) in ue_positions.iter().enumerate() {
        let free = (0..num_pilots).find(|&p| {
            !assigned
                .iter()
                .zip(ue_positions)
                .any(|(&q, other)| q == p && pos.distance_to(other) < reuse_dist)
        });
        let pilot = match free {
            Some(p) => p,
            None => {
                let p = least_used(&usage);
                debug!(ue = k, pilot = p, "no conflict-free pilot, reusing least-used");
                p
            }
        };
        usage[pilot] += 1;
        assigned.push(pilot);
    }
    assigned
}

/// Count pairs sharing a pilot while closer than `reuse_dist`.
pub fn reuse_violations(ue_positions: &[Position], pilots: &[usize], reuse_dist: f64) -> usize {
    let mut count = 0;
    for k in 0..pilots.len() {
        for j in 0..k {
            if pilots[j] == pilots[k] && ue_positions[k].distance_to(&ue_positions[j]) < reuse_dist {
                count += 1;
            }
        }
    }
    count
}

// First index of the minimum count.
fn least_used(usage: &[usize]) -> usize {
    let mut best = 0;
    for (p, &n) in usage.iter().enumerate() {
        if n < usage[best] {
            best = p;
        }
    }
    best
}
