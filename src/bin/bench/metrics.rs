// Per-Step Metric Trackers: service and churn, plus a snapshot invariant audit

use cellfree_engine::*;

// ─── Service Tracker ────────────────────────────────────────────────────────

/// Fraction of UEs served per step.
pub struct ServiceTracker {
    pub ratios: Vec<f64>,
    pub reuse_violations: Vec<f64>,
    pub cluster_sizes: Vec<f64>,
}

impl ServiceTracker {
    pub fn new() -> Self {
        Self {
            ratios: Vec::new(),
            reuse_violations: Vec::new(),
            cluster_sizes: Vec::new(),
        }
    }

    pub fn record_step(&mut self, snap: &Snapshot) {
        let k = snap.ue_count().max(1) as f64;
        self.ratios.push(snap.stats.served_ues as f64 / k);
        self.reuse_violations.push(snap.stats.pilot_reuse_violations as f64);
        self.cluster_sizes.push(snap.stats.mean_cluster_size);
    }

    pub fn mean_ratio(&self) -> f64 {
        mean(&self.ratios)
    }

    pub fn min_ratio(&self) -> f64 {
        self.ratios.iter().cloned().fold(f64::INFINITY, f64::min)
    }

    pub fn mean_reuse_violations(&self) -> f64 {
        mean(&self.reuse_violations)
    }

    pub fn mean_cluster_size(&self) -> f64 {
        mean(&self.cluster_sizes)
    }
}

// ─── Link Churn Tracker ─────────────────────────────────────────────────────

/// Counts (UE, AP) links that appear between consecutive steps.
pub struct ChurnTracker {
    previous: Option<Snapshot>,
    pub new_links_per_step: Vec<f64>,
}

impl ChurnTracker {
    pub fn new() -> Self {
        Self { previous: None, new_links_per_step: Vec::new() }
    }

    /// Returns the number of new links relative to the last recorded step.
    pub fn record_step(&mut self, snap: &Snapshot) -> usize {
        let added = match &self.previous {
            Some(prev) => snap.new_links(prev).len(),
            None => 0,
        };
        if self.previous.is_some() {
            self.new_links_per_step.push(added as f64);
        }
        self.previous = Some(snap.clone());
        added
    }

    pub fn mean_new_links(&self) -> f64 {
        mean(&self.new_links_per_step)
    }
}

// ─── Invariant Audit ────────────────────────────────────────────────────────

/// Count occupancy/cluster invariant breaches in a snapshot.
pub fn invariant_breaches(snap: &Snapshot, config: &SimConfig) -> u32 {
    let mut breaches = 0;
    for row in &snap.ap_resources {
        for cell in row {
            if cell.ues.len() > config.max_ues_per_rb || cell.pilots.len() != cell.ues.len() {
                breaches += 1;
            }
        }
    }
    for (ue, cluster) in snap.ue_clusters.iter().enumerate() {
        if snap.pilot_assignments[ue] >= config.num_pilots {
            breaches += 1;
        }
        if cluster.is_empty() {
            continue;
        }
        if cluster.len() < 2 || cluster.len() > config.max_cluster_size {
            breaches += 1;
        }
        match snap.ue_cluster_rb[ue] {
            Some(rb) => {
                breaches += cluster
                    .iter()
                    .filter(|&&ap| !snap.ap_resources[ap][rb].ues.contains(&ue))
                    .count() as u32;
            }
            None => breaches += 1,
        }
    }
    breaches
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() { return 0.0; }
    xs.iter().sum::<f64>() / xs.len() as f64
}
