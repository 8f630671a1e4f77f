// Scenario Definitions: deployment regimes for the allocation engine
// Each scenario is a base config; the Monte Carlo runner varies only the seed

use cellfree_engine::{AllocationOrder, ClusteringStrategy, SimConfig};

// ─── Scenario Configuration ─────────────────────────────────────────────────

pub struct Scenario {
    pub name: &'static str,
    pub label: &'static str,
    pub category: &'static str,
    pub config: SimConfig,
    pub steps: u64,
    /// Probe mode: only this UE moves.
    pub probe: Option<usize>,
    pub criteria: PassCriteria,
}

pub struct PassCriteria {
    /// Minimum mean fraction of UEs served per step.
    pub min_served_ratio: Option<f64>,
    /// Upper bound on mean pilot-reuse violations per step.
    pub max_reuse_violations: Option<f64>,
}

impl Default for PassCriteria {
    fn default() -> Self {
        Self {
            min_served_ratio: None,
            max_reuse_violations: None,
        }
    }
}

// ─── Scenario Table ─────────────────────────────────────────────────────────

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "BASELINE_DASHBOARD",
            label: "Dashboard defaults (M=32, K=20)",
            category: "baseline",
            steps: 200,
            config: SimConfig::default(),
            probe: None,
            criteria: PassCriteria {
                min_served_ratio: Some(0.8),
                max_reuse_violations: Some(1.0),
            },
        },
        Scenario {
            name: "SCRIPT_PROTOTYPE",
            label: "Standalone script (3 UEs per RB)",
            category: "baseline",
            steps: 200,
            config: SimConfig { max_ues_per_rb: 3, ..Default::default() },
            probe: None,
            criteria: PassCriteria {
                min_served_ratio: Some(0.99),
                ..Default::default()
            },
        },
        Scenario {
            name: "PILOT_STARVED",
            label: "Two pilots, 250 m reuse",
            category: "pilots",
            steps: 200,
            config: SimConfig { num_pilots: 2, ..Default::default() },
            probe: None,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "RB_SCARCE",
            label: "One RB per AP, K=30",
            category: "resources",
            steps: 200,
            config: SimConfig { rbs_per_ap: 1, num_ues: 30, ..Default::default() },
            probe: None,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "DENSE_SMALL_AREA",
            label: "K=40 in 300 m square",
            category: "resources",
            steps: 200,
            config: SimConfig {
                num_ues: 40,
                area_size: 300.0,
                pilot_reuse_dist: 100.0,
                ..Default::default()
            },
            probe: None,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "HIGH_MOBILITY",
            label: "Vehicular speeds (30 m/s)",
            category: "mobility",
            steps: 200,
            config: SimConfig { max_speed: 30.0, ..Default::default() },
            probe: None,
            criteria: PassCriteria {
                min_served_ratio: Some(0.9),
                ..Default::default()
            },
        },
        Scenario {
            name: "PROBE_WALK",
            label: "Single probe UE moving",
            category: "mobility",
            steps: 200,
            config: SimConfig { max_speed: 10.0, ..Default::default() },
            probe: Some(0),
            criteria: PassCriteria {
                min_served_ratio: Some(0.9),
                ..Default::default()
            },
        },
        Scenario {
            name: "WEAKEST_FIRST",
            label: "Fairness order, one RB per AP",
            category: "policy",
            steps: 200,
            config: SimConfig {
                rbs_per_ap: 1,
                num_ues: 30,
                allocation_order: AllocationOrder::WeakestFirst,
                ..Default::default()
            },
            probe: None,
            criteria: PassCriteria::default(),
        },
        Scenario {
            name: "AP_FIRST_LEGACY",
            label: "AP-first clustering",
            category: "policy",
            steps: 200,
            config: SimConfig {
                clustering: ClusteringStrategy::ApFirst,
                ..Default::default()
            },
            probe: None,
            criteria: PassCriteria::default(),
        },
    ]
}
