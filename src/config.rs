// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cell-Free MIMO Simulation Suite - Configuration
//
// Every simulation owns its own SimConfig. Construction validates it once,
// so the stepping path never sees an unsatisfiable parameter set.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Rejected construction parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one AP is required")]
    NoAccessPoints,
    #[error("at least one UE is required")]
    NoUsers,
    #[error("max cluster size must be at least 2, got {0}")]
    ClusterTooSmall(usize),
    #[error("at least one pilot is required")]
    NoPilots,
    #[error("at least one resource block per AP is required")]
    NoResourceBlocks,
    #[error("resource block capacity must be at least one UE")]
    ZeroRbCapacity,
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("max speed must be non-negative and finite, got {0}")]
    InvalidSpeed(f64),
    #[error("UE {0} has a non-finite velocity")]
    InvalidVelocity(usize),
    #[error("topology holds {actual} {what}, config expects {expected}")]
    TopologyShape { what: &'static str, expected: usize, actual: usize },
    #[error("{what} {index} lies outside the {area} m deployment area")]
    OutOfArea { what: &'static str, index: usize, area: f64 },
    #[error("invalid config JSON: {0}")]
    Json(String),
}

// ---------------------------------------------------------------------------
// Strategy selectors
// ---------------------------------------------------------------------------

/// Order in which UEs claim resources during allocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationOrder {
    /// Ascending UE index. Reproduces existing traces.
    #[default]
    Index,
    /// Ascending best-AP gain, ties by index: weakest UEs claim first.
    WeakestFirst,
}

/// Cluster formation algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusteringStrategy {
    /// Scan RBs, then APs; one RB shared by the whole cluster.
    #[default]
    SharedRb,
    /// Scan APs, taking the first admissible RB per AP once the first AP
    /// fixes it; rolled back when fewer than two APs are found.
    ApFirst,
}

// ---------------------------------------------------------------------------
// SimConfig
// ---------------------------------------------------------------------------

/// Simulation parameters. Missing keys in serialized form take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of APs (M).
    pub num_aps: usize,
    /// Number of UEs (K).
    pub num_ues: usize,
    /// Max cluster size (L).
    pub max_cluster_size: usize,
    /// Orthogonal pilots available (tau_p).
    pub num_pilots: usize,
    /// Minimum distance for two UEs to share a pilot, metres.
    pub pilot_reuse_dist: f64,
    /// Side of the square deployment area, metres.
    pub area_size: f64,
    pub rbs_per_ap: usize,
    pub max_ues_per_rb: usize,
    /// Step duration, seconds.
    pub dt: f64,
    pub seed: u64,
    /// Velocity components are drawn from `[-max_speed, max_speed]` m/s.
    pub max_speed: f64,
    pub allocation_order: AllocationOrder,
    pub clustering: ClusteringStrategy,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_aps: 32,
            num_ues: 20,
            max_cluster_size: 4,
            num_pilots: 8,
            pilot_reuse_dist: 250.0,
            area_size: 1000.0,
            rbs_per_ap: 4,
            max_ues_per_rb: 1,
            dt: 1.0,
            seed: 1,
            max_speed: 1.5,
            allocation_order: AllocationOrder::Index,
            clustering: ClusteringStrategy::SharedRb,
        }
    }
}

impl SimConfig {
    /// Parse a (possibly partial) JSON object and validate it.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_aps == 0 {
            return Err(ConfigError::NoAccessPoints);
        }
        if self.num_ues == 0 {
            return Err(ConfigError::NoUsers);
        }
        if self.max_cluster_size < 2 {
            return Err(ConfigError::ClusterTooSmall(self.max_cluster_size));
        }
        if self.num_pilots == 0 {
            return Err(ConfigError::NoPilots);
        }
        if self.rbs_per_ap == 0 {
            return Err(ConfigError::NoResourceBlocks);
        }
        if self.max_ues_per_rb == 0 {
            return Err(ConfigError::ZeroRbCapacity);
        }
        positive("pilot_reuse_dist", self.pilot_reuse_dist)?;
        positive("area_size", self.area_size)?;
        positive("dt", self.dt)?;
        // Velocity draws span 2 * max_speed, which must stay finite.
        if !(2.0 * self.max_speed).is_finite() || self.max_speed < 0.0 {
            return Err(ConfigError::InvalidSpeed(self.max_speed));
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_unsatisfiable_parameters() {
        let cases = [
            (SimConfig { num_aps: 0, ..Default::default() }, ConfigError::NoAccessPoints),
            (SimConfig { num_ues: 0, ..Default::default() }, ConfigError::NoUsers),
            (SimConfig { max_cluster_size: 1, ..Default::default() }, ConfigError::ClusterTooSmall(1)),
            (SimConfig { num_pilots: 0, ..Default::default() }, ConfigError::NoPilots),
            (SimConfig { rbs_per_ap: 0, ..Default::default() }, ConfigError::NoResourceBlocks),
            (SimConfig { max_ues_per_rb: 0, ..Default::default() }, ConfigError::ZeroRbCapacity),
        ];
        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }

    #[test]
    fn rejects_non_positive_lengths() {
        let config = SimConfig { dt: 0.0, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { name: "dt", .. })
        ));
        let config = SimConfig { area_size: f64::NAN, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { name: "area_size", .. })
        ));
        let config = SimConfig { max_speed: -1.0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidSpeed(-1.0)));
    }

    #[test]
    fn rejects_speed_whose_draw_range_overflows() {
        let config = SimConfig { max_speed: f64::MAX, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidSpeed(f64::MAX)));
        let config = SimConfig { max_speed: f64::INFINITY, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidSpeed(f64::INFINITY)));
        let config = SimConfig { max_speed: f64::MAX / 4.0, ..Default::default() };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = SimConfig::from_json(r#"{"num_aps": 4, "seed": 7, "allocation_order": "WeakestFirst"}"#)
            .expect("test: partial config should parse");
        assert_eq!(config.num_aps, 4);
        assert_eq!(config.seed, 7);
        assert_eq!(config.allocation_order, AllocationOrder::WeakestFirst);
        assert_eq!(config.num_ues, SimConfig::default().num_ues);
    }

    #[test]
    fn invalid_json_is_reported() {
        assert!(matches!(SimConfig::from_json("{"), Err(ConfigError::Json(_))));
        assert_eq!(
            SimConfig::from_json(r#"{"num_pilots": 0}"#),
            Err(ConfigError::NoPilots)
        );
    }
}
