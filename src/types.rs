// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cell-Free MIMO Simulation Suite - Type Definitions

use serde::{Serialize, Deserialize};
use std::collections::BTreeSet;

// ─── Geometry ────────────────────────────────────────────────────────────────

/// Point in the square deployment area, in metres.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance, evaluated as `sqrt(dx² + dy²)`.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// UE velocity in metres per second.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Velocity {
    pub vx: f64,
    pub vy: f64,
}

impl Velocity {
    pub fn new(vx: f64, vy: f64) -> Self {
        Self { vx, vy }
    }

    pub fn is_zero(&self) -> bool {
        self.vx == 0.0 && self.vy == 0.0
    }
}

// ─── Mobility ────────────────────────────────────────────────────────────────

/// Which UEs move on a step.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mobility {
    /// Every UE advances by its velocity.
    #[default]
    All,
    /// Only the given UE advances; the rest stay frozen.
    Single(usize),
}

// ─── Resource Occupancy ──────────────────────────────────────────────────────

/// Occupancy of one (AP, RB) cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RbOccupancy {
    pub ues: BTreeSet<usize>,
    pub pilots: BTreeSet<usize>,
}

impl RbOccupancy {
    pub fn load(&self) -> usize {
        self.ues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ues.is_empty()
    }
}

// ─── Per-step Statistics ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StepStats {
    pub served_ues: usize,
    pub dropped_ues: usize,
    /// UE pairs sharing a pilot while closer than the reuse distance.
    pub pilot_reuse_violations: usize,
    /// Number of (AP, RB) cells holding at least one UE.
    pub occupied_rbs: usize,
    /// Sum of UE-set sizes over all cells.
    pub occupied_slots: usize,
    /// Mean cluster size over served UEs (0 when nobody is served).
    pub mean_cluster_size: f64,
}

// ─── Reports ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UeReport {
    pub ue: usize,
    pub position: Position,
    pub pilot: usize,
    pub serving_aps: Vec<usize>,
    pub rb: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RbReport {
    pub rb: usize,
    pub ues: Vec<usize>,
    pub pilots: Vec<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApReport {
    pub ap: usize,
    pub position: Position,
    pub rbs: Vec<RbReport>,
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// Complete derived state of one step. Owned by value; the engine never
/// hands out aliases into its live state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub step: u64,
    /// Simulated seconds since the last reset.
    pub time: f64,
    pub ap_positions: Vec<Position>,
    pub ue_positions: Vec<Position>,
    pub pilot_assignments: Vec<usize>,
    pub ue_clusters: Vec<Vec<usize>>,
    pub ue_cluster_rb: Vec<Option<usize>>,
    /// Indexed `[ap][rb]`.
    pub ap_resources: Vec<Vec<RbOccupancy>>,
    pub stats: StepStats,
}

impl Snapshot {
    pub fn ap_count(&self) -> usize {
        self.ap_positions.len()
    }

    pub fn ue_count(&self) -> usize {
        self.ue_positions.len()
    }

    pub fn is_served(&self, ue: usize) -> bool {
        self.ue_clusters.get(ue).map_or(false, |c| !c.is_empty())
    }

    pub fn ue_report(&self, ue: usize) -> Option<UeReport> {
        let position = *self.ue_positions.get(ue)?;
        Some(UeReport {
            ue,
            position,
            pilot: *self.pilot_assignments.get(ue)?,
            serving_aps: self.ue_clusters.get(ue)?.clone(),
            rb: *self.ue_cluster_rb.get(ue)?,
        })
    }

    pub fn ap_report(&self, ap: usize) -> Option<ApReport> {
        let position = *self.ap_positions.get(ap)?;
        let rbs = self
            .ap_resources
            .get(ap)?
            .iter()
            .enumerate()
            .map(|(rb, cell)| RbReport {
                rb,
                ues: cell.ues.iter().copied().collect(),
                pilots: cell.pilots.iter().copied().collect(),
            })
            .collect();
        Some(ApReport { ap, position, rbs })
    }

    /// (UE, AP) links present here but absent from `previous`, in UE then
    /// cluster order.
    pub fn new_links(&self, previous: &Snapshot) -> Vec<(usize, usize)> {
        let mut links = Vec::new();
        for (ue, cluster) in self.ue_clusters.iter().enumerate() {
            let before = previous.ue_clusters.get(ue);
            for &ap in cluster {
                if !before.map_or(false, |c| c.contains(&ap)) {
                    links.push((ue, ap));
                }
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_clusters(clusters: Vec<Vec<usize>>) -> Snapshot {
        let k = clusters.len();
        Snapshot {
            step: 0,
            time: 0.0,
            ap_positions: vec![Position::default(); 4],
            ue_positions: vec![Position::default(); k],
            pilot_assignments: vec![0; k],
            ue_cluster_rb: clusters
                .iter()
                .map(|c| if c.is_empty() { None } else { Some(0) })
                .collect(),
            ue_clusters: clusters,
            ap_resources: vec![vec![RbOccupancy::default()]; 4],
            stats: StepStats::default(),
        }
    }

    #[test]
    fn distance_is_euclidean() {
        let a = Position::new(0.0, 0.0);
        let b = Position::new(3.0, 4.0);
        assert_eq!(a.distance_to(&b), 5.0);
        assert_eq!(b.distance_to(&a), 5.0);
    }

    #[test]
    fn new_links_only_reports_additions() {
        let prev = snapshot_with_clusters(vec![vec![0, 1], vec![]]);
        let next = snapshot_with_clusters(vec![vec![1, 2], vec![3, 0]]);
        assert_eq!(next.new_links(&prev), vec![(0, 2), (1, 3), (1, 0)]);
        assert!(prev.new_links(&prev).is_empty());
    }

    #[test]
    fn reports_out_of_range_are_none() {
        let snap = snapshot_with_clusters(vec![vec![0, 1]]);
        assert!(snap.ue_report(1).is_none());
        assert!(snap.ap_report(4).is_none());
        let ue = snap.ue_report(0).expect("test: UE 0 exists");
        assert_eq!(ue.serving_aps, vec![0, 1]);
        assert_eq!(ue.rb, Some(0));
    }

    #[test]
    fn reports_on_ragged_snapshot_are_none() {
        let mut snap = snapshot_with_clusters(vec![vec![0, 1], vec![2, 3]]);
        snap.pilot_assignments.truncate(1);
        snap.ue_clusters.truncate(1);
        snap.ap_resources.truncate(2);
        assert!(snap.ue_report(0).is_some());
        assert!(snap.ue_report(1).is_none());
        assert!(snap.ap_report(1).is_some());
        assert!(snap.ap_report(2).is_none());
    }

    #[test]
    fn mobility_defaults_to_all() {
        assert_eq!(Mobility::default(), Mobility::All);
    }
}
