// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cell-Free MIMO Simulation Suite - Large-Scale Channel Model

use crate::topology::Topology;

/// Reference distance in metres; shorter distances are clamped to it.
pub const REFERENCE_DISTANCE_M: f64 = 1.0;
/// Path loss at the reference distance, dB.
pub const PL0_DB: f64 = -30.0;
/// Path loss exponent.
pub const PATHLOSS_EXPONENT: f64 = 3.7;

/// Linear large-scale gain at `distance` metres.
///
/// `PL_dB = PL0_dB - 10 * alpha * log10(d / d0)`, with `d` clamped to `d0`.
pub fn pathloss(distance: f64) -> f64 {
    let d = distance.max(REFERENCE_DISTANCE_M);
    let pl_db = PL0_DB - 10.0 * PATHLOSS_EXPONENT * (d / REFERENCE_DISTANCE_M).log10();
    10f64.powf(pl_db / 10.0)
}

/// AP×UE gain matrix (`beta[ap][ue]`).
pub fn gain_matrix(topology: &Topology) -> Vec<Vec<f64>> {
    topology
        .distances()
        .into_iter()
        .map(|row| row.into_iter().map(pathloss).collect())
        .collect()
}
