// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cell-Free MIMO Simulation Suite - Cluster / Resource Allocation
//
// Greedy bipartite matching of UEs onto (AP, RB) cells. UEs claim in the
// configured order and earlier claims are never revisited, so a UE can be
// dropped while some AP still has spare capacity.

use tracing::trace;

use crate::config::{AllocationOrder, ClusteringStrategy, SimConfig};
use crate::types::RbOccupancy;

/// Smallest cluster that counts as cooperative service.
pub const MIN_CLUSTER_SIZE: usize = 2;

// ---------------------------------------------------------------------------
// ResourceTable
// ---------------------------------------------------------------------------

/// Occupancy of every (AP, RB) cell for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTable {
    cells: Vec<Vec<RbOccupancy>>,
    capacity: usize,
}

impl ResourceTable {
    pub fn new(num_aps: usize, rbs_per_ap: usize, capacity: usize) -> Self {
        Self {
            cells: vec![vec![RbOccupancy::default(); rbs_per_ap]; num_aps],
            capacity,
        }
    }

    pub fn cell(&self, ap: usize, rb: usize) -> &RbOccupancy {
        &self.cells[ap][rb]
    }

    /// Whether `(ap, rb)` can take one more UE using `pilot`.
    pub fn admits(&self, ap: usize, rb: usize, pilot: usize) -> bool {
        let cell = &self.cells[ap][rb];
        !cell.pilots.contains(&pilot) && cell.ues.len() < self.capacity
    }

    fn claim(&mut self, ap: usize, rb: usize, ue: usize, pilot: usize) {
        let cell = &mut self.cells[ap][rb];
        cell.ues.insert(ue);
        cell.pilots.insert(pilot);
    }

    fn release(&mut self, ap: usize, rb: usize, ue: usize, pilot: usize) {
        let cell = &mut self.cells[ap][rb];
        cell.ues.remove(&ue);
        cell.pilots.remove(&pilot);
    }

    pub fn into_cells(self) -> Vec<Vec<RbOccupancy>> {
        self.cells
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Outcome of one allocation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// Serving APs per UE, in the order they were chosen.
    pub clusters: Vec<Vec<usize>>,
    pub cluster_rb: Vec<Option<usize>>,
    pub resources: ResourceTable,
}

impl Allocation {
    pub fn served(&self) -> usize {
        self.clusters.iter().filter(|c| !c.is_empty()).count()
    }

    /// Panics if occupancy and clusters disagree. Such a mismatch can only
    /// come from a bug in this module.
    pub fn assert_consistent(&self, pilots: &[usize], max_cluster_size: usize) {
        for (ue, cluster) in self.clusters.iter().enumerate() {
            match self.cluster_rb[ue] {
                None => assert!(cluster.is_empty(), "UE {} has APs but no RB", ue),
                Some(rb) => {
                    assert!(
                        (MIN_CLUSTER_SIZE..=max_cluster_size).contains(&cluster.len()),
                        "UE {} cluster size {} outside [{}, {}]",
                        ue, cluster.len(), MIN_CLUSTER_SIZE, max_cluster_size
                    );
                    for &ap in cluster {
                        assert!(
                            self.resources.cell(ap, rb).ues.contains(&ue),
                            "UE {} missing from AP {} RB {}", ue, ap, rb
                        );
                    }
                }
            }
        }
        for (ap, row) in self.resources.cells.iter().enumerate() {
            for (rb, cell) in row.iter().enumerate() {
                assert!(cell.ues.len() <= self.resources.capacity, "AP {} RB {} over capacity", ap, rb);
                assert_eq!(cell.ues.len(), cell.pilots.len(), "AP {} RB {} pilot clash", ap, rb);
                for &ue in &cell.ues {
                    assert_eq!(self.cluster_rb[ue], Some(rb), "UE {} listed on AP {} RB {} it does not use", ue, ap, rb);
                    assert!(self.clusters[ue].contains(&ap), "UE {} listed on AP {} outside its cluster", ue, ap);
                    assert!(cell.pilots.contains(&pilots[ue]), "UE {} pilot absent from AP {} RB {}", ue, ap, rb);
                }
            }
        }
    }
}

/// APs sorted by descending gain to `ue`; equal gains keep AP index order.
pub fn rank_aps(beta: &[Vec<f64>], ue: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..beta.len()).collect();
    order.sort_by(|&a, &b| beta[b][ue].total_cmp(&beta[a][ue]));
    order
}

/// UE processing order for the configured policy.
pub fn processing_order(beta: &[Vec<f64>], num_ues: usize, order: AllocationOrder) -> Vec<usize> {
    let mut ues: Vec<usize> = (0..num_ues).collect();
    if order == AllocationOrder::WeakestFirst {
        let best: Vec<f64> = (0..num_ues)
            .map(|ue| beta.iter().map(|row| row[ue]).fold(f64::NEG_INFINITY, f64::max))
            .collect();
        ues.sort_by(|&a, &b| best[a].total_cmp(&best[b]));
    }
    ues
}

/// Form a serving cluster for every UE against a fresh resource table.
pub fn allocate(beta: &[Vec<f64>], pilots: &[usize], config: &SimConfig) -> Allocation {
    let num_ues = pilots.len();
    let mut table = ResourceTable::new(beta.len(), config.rbs_per_ap, config.max_ues_per_rb);
    let mut clusters = vec![Vec::new(); num_ues];
    let mut cluster_rb = vec![None; num_ues];

    for ue in processing_order(beta, num_ues, config.allocation_order) {
        let ranked = rank_aps(beta, ue);
        let picked = match config.clustering {
            ClusteringStrategy::SharedRb => shared_rb(&mut table, &ranked, ue, pilots[ue], config),
            ClusteringStrategy::ApFirst => ap_first(&mut table, &ranked, ue, pilots[ue], config),
        };
        match picked {
            Some((rb, aps)) => {
                cluster_rb[ue] = Some(rb);
                clusters[ue] = aps;
            }
            None => trace!(ue, "no RB with two admissible APs, UE dropped"),
        }
    }

    let allocation = Allocation { clusters, cluster_rb, resources: table };
    allocation.assert_consistent(pilots, config.max_cluster_size);
    allocation
}

// RBs in ascending order; on each, the first L admissible APs by gain. The
// first RB yielding at least two wins.
fn shared_rb(
    table: &mut ResourceTable,
    ranked: &[usize],
    ue: usize,
    pilot: usize,
    config: &SimConfig,
) -> Option<(usize, Vec<usize>)> {
    for rb in 0..config.rbs_per_ap {
        let candidates: Vec<usize> = ranked
            .iter()
            .copied()
            .filter(|&ap| table.admits(ap, rb, pilot))
            .take(config.max_cluster_size)
            .collect();
        if candidates.len() >= MIN_CLUSTER_SIZE {
            for &ap in &candidates {
                table.claim(ap, rb, ue, pilot);
            }
            return Some((rb, candidates));
        }
    }
    None
}

// APs in gain order; the first AP placed fixes the RB for the rest. Claims
// are committed as they go and rolled back if the cluster stays too small.
fn ap_first(
    table: &mut ResourceTable,
    ranked: &[usize],
    ue: usize,
    pilot: usize,
    config: &SimConfig,
) -> Option<(usize, Vec<usize>)> {
    let mut cluster = Vec::new();
    let mut chosen: Option<usize> = None;

    for &ap in ranked {
        let rb = match chosen {
            Some(rb) => table.admits(ap, rb, pilot).then_some(rb),
            None => (0..config.rbs_per_ap).find(|&rb| table.admits(ap, rb, pilot)),
        };
        if let Some(rb) = rb {
            table.claim(ap, rb, ue, pilot);
            cluster.push(ap);
            chosen = Some(rb);
            if cluster.len() >= config.max_cluster_size {
                break;
            }
        }
    }

    match chosen {
        Some(rb) if cluster.len() >= MIN_CLUSTER_SIZE => Some((rb, cluster)),
        Some(rb) => {
            for &ap in &cluster {
                table.release(ap, rb, ue, pilot);
            }
            None
        }
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(l: usize, rbs: usize, cap: usize) -> SimConfig {
        SimConfig {
            max_cluster_size: l,
            rbs_per_ap: rbs,
            max_ues_per_rb: cap,
            ..Default::default()
        }
    }

    // beta[ap][ue] built from per-UE gain columns.
    fn beta(columns: &[&[f64]]) -> Vec<Vec<f64>> {
        let m = columns[0].len();
        (0..m).map(|ap| columns.iter().map(|c| c[ap]).collect()).collect()
    }

    #[test]
    fn ranking_is_descending_and_stable() {
        let b = beta(&[&[0.1, 0.5, 0.5, 0.9]]);
        assert_eq!(rank_aps(&b, 0), vec![3, 1, 2, 0]);
    }

    #[test]
    fn single_ue_takes_best_l_aps() {
        let b = beta(&[&[0.1, 0.4, 0.3, 0.2, 0.05]]);
        let alloc = allocate(&b, &[0], &config(3, 1, 1));
        assert_eq!(alloc.clusters[0], vec![1, 2, 3]);
        assert_eq!(alloc.cluster_rb[0], Some(0));
        assert!(alloc.resources.cell(4, 0).is_empty());
    }

    #[test]
    fn single_ap_cannot_form_a_cluster() {
        let b = beta(&[&[0.9]]);
        let alloc = allocate(&b, &[0], &config(4, 3, 2));
        assert!(alloc.clusters[0].is_empty());
        assert_eq!(alloc.cluster_rb[0], None);
        assert_eq!(alloc.served(), 0);
    }

    #[test]
    fn same_pilot_moves_to_next_rb() {
        // Both UEs prefer the same APs and share pilot 0.
        let b = beta(&[&[0.9, 0.8, 0.1], &[0.9, 0.8, 0.1]]);
        let alloc = allocate(&b, &[0, 0], &config(2, 2, 4));
        assert_eq!(alloc.cluster_rb, vec![Some(0), Some(1)]);
        assert_eq!(alloc.clusters[1], vec![0, 1]);
    }

    #[test]
    fn distinct_pilots_share_an_rb_up_to_capacity() {
        let b = beta(&[&[0.9, 0.8, 0.1], &[0.9, 0.8, 0.1], &[0.9, 0.8, 0.1]]);
        let alloc = allocate(&b, &[0, 1, 2], &config(2, 1, 2));
        assert_eq!(alloc.cluster_rb, vec![Some(0), Some(0), None]);
        assert_eq!(alloc.resources.cell(0, 0).ues.len(), 2);
        // Third UE only finds AP 2 free on RB 0: dropped.
        assert!(alloc.clusters[2].is_empty());
    }

    #[test]
    fn skips_full_aps_in_gain_order() {
        let b = beta(&[&[0.9, 0.8, 0.1], &[0.9, 0.1, 0.8]]);
        let alloc = allocate(&b, &[0, 1], &config(2, 1, 1));
        assert_eq!(alloc.clusters[0], vec![0, 1]);
        // AP 0 and 1 are full; only AP 2 remains, so UE 1 is dropped.
        assert!(alloc.clusters[1].is_empty());
    }

    #[test]
    fn weakest_first_reverses_the_winner() {
        // Strong UE 0 and weak UE 1 compete for a single RB slot pair.
        let b = beta(&[&[0.9, 0.8, 0.01], &[0.5, 0.4, 0.01]]);
        let by_index = allocate(&b, &[0, 1], &config(2, 1, 1));
        assert_eq!(by_index.clusters, vec![vec![0, 1], vec![]]);

        let cfg = SimConfig { allocation_order: AllocationOrder::WeakestFirst, ..config(2, 1, 1) };
        let weakest = allocate(&b, &[0, 1], &cfg);
        assert_eq!(weakest.clusters, vec![vec![], vec![0, 1]]);
        assert_eq!(processing_order(&b, 2, AllocationOrder::WeakestFirst), vec![1, 0]);
    }

    #[test]
    fn ap_first_fixes_rb_from_best_ap() {
        // UE 0 fills AP 0 RB 0. UE 1 (same pilot) finds RB 1 on AP 0 and is
        // then bound to RB 1 for the remaining APs.
        let b = beta(&[&[0.9, 0.8, 0.7], &[0.9, 0.8, 0.7]]);
        let cfg = SimConfig { clustering: ClusteringStrategy::ApFirst, ..config(2, 2, 1) };
        let alloc = allocate(&b, &[0, 0], &cfg);
        assert_eq!(alloc.clusters[0], vec![0, 1]);
        assert_eq!(alloc.cluster_rb[0], Some(0));
        assert_eq!(alloc.clusters[1], vec![0, 1]);
        assert_eq!(alloc.cluster_rb[1], Some(1));
    }

    #[test]
    fn ap_first_rolls_back_short_clusters() {
        // UE 1 claims AP 2 first, then finds APs 1 and 0 full: the lone
        // claim must be undone.
        let b = beta(&[&[0.9, 0.8, 0.1], &[0.1, 0.2, 0.9]]);
        let cfg = SimConfig { clustering: ClusteringStrategy::ApFirst, ..config(2, 1, 1) };
        let alloc = allocate(&b, &[0, 1], &cfg);
        assert_eq!(alloc.clusters[0], vec![0, 1]);
        assert!(alloc.clusters[1].is_empty());
        assert_eq!(alloc.cluster_rb[1], None);
        assert!(alloc.resources.cell(2, 0).is_empty());
    }

    #[test]
    fn ap_first_differs_from_shared_rb() {
        // UE 0 holds AP 0 and AP 3 on RB 0. Shared-RB serves UE 1 on RB 0
        // with its next-best APs; AP-first follows its best AP to RB 1.
        let b = beta(&[&[0.9, 0.1, 0.1, 0.8], &[0.9, 0.8, 0.7, 0.05]]);
        let shared = allocate(&b, &[0, 1], &config(2, 2, 1));
        assert_eq!(shared.clusters[0], vec![0, 3]);
        assert_eq!(shared.clusters[1], vec![1, 2]);
        assert_eq!(shared.cluster_rb[1], Some(0));

        let cfg = SimConfig { clustering: ClusteringStrategy::ApFirst, ..config(2, 2, 1) };
        let apf = allocate(&b, &[0, 1], &cfg);
        assert_eq!(apf.clusters[0], vec![0, 3]);
        assert_eq!(apf.clusters[1], vec![0, 1]);
        assert_eq!(apf.cluster_rb[1], Some(1));
    }

    #[test]
    #[should_panic(expected = "missing from AP")]
    fn inconsistent_tables_panic() {
        let b = beta(&[&[0.9, 0.8]]);
        let mut alloc = allocate(&b, &[0], &config(2, 1, 1));
        alloc.resources.release(1, 0, 0, 0);
        alloc.assert_consistent(&[0], 2);
    }
}
