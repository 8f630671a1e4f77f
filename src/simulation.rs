// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cell-Free MIMO Simulation Suite - Simulation Core

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use wasm_bindgen::prelude::*;

use crate::channel;
use crate::cluster;
use crate::config::{ConfigError, SimConfig};
use crate::pilot;
use crate::topology::Topology;
use crate::types::*;

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("UE {ue} does not exist (simulation has {count} UEs)")]
    UnknownUe { ue: usize, count: usize },
}

// ─── CellFreeSimulation struct ───────────────────────────────────────────────

#[wasm_bindgen]
pub struct CellFreeSimulation {
    pub(crate) config: SimConfig,
    /// Caller-supplied layout restored on reset; `None` means seeded random.
    pub(crate) fixed_layout: Option<Topology>,
    pub(crate) topology: Topology,
    pub(crate) step_count: u64,
    pub(crate) trace: Vec<Snapshot>,
}

// ─── Internal Logic (Testable, pure Rust) ────────────────────────────────────

impl CellFreeSimulation {
    /// Validate `config`, draw a seeded random layout and compute the
    /// initial snapshot.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let topology = random_layout(&config);
        Ok(Self::start(config, None, topology))
    }

    /// Start from a fixed layout instead of a random one. `reset` restores
    /// this layout.
    pub fn with_topology(config: SimConfig, topology: Topology) -> Result<Self, SimError> {
        config.validate()?;
        topology.check(&config)?;
        Ok(Self::start(config, Some(topology.clone()), topology))
    }

    fn start(config: SimConfig, fixed_layout: Option<Topology>, topology: Topology) -> Self {
        let mut sim = Self {
            config,
            fixed_layout,
            topology,
            step_count: 0,
            trace: Vec::new(),
        };
        sim.recompute();
        sim
    }

    /// Recreate the topology from the seed (or the fixed layout), clear the
    /// trace and compute a fresh initial snapshot.
    pub fn reset(&mut self) {
        self.topology = match &self.fixed_layout {
            Some(layout) => layout.clone(),
            None => random_layout(&self.config),
        };
        self.step_count = 0;
        self.trace.clear();
        info!(
            seed = self.config.seed,
            aps = self.config.num_aps,
            ues = self.config.num_ues,
            "simulation reset"
        );
        self.recompute();
    }

    /// Move every UE by one time step and recompute.
    pub fn step(&mut self) -> &Snapshot {
        self.advance(Mobility::All)
    }

    /// Step with an explicit mobility mode. An unknown UE leaves the state
    /// untouched.
    pub fn step_with(&mut self, mobility: Mobility) -> Result<&Snapshot, SimError> {
        if let Mobility::Single(ue) = mobility {
            let count = self.config.num_ues;
            if ue >= count {
                return Err(SimError::UnknownUe { ue, count });
            }
        }
        Ok(self.advance(mobility))
    }

    /// Run `steps` all-UE steps.
    pub fn run_batch(&mut self, steps: u32) {
        for _ in 0..steps {
            self.advance(Mobility::All);
        }
    }

    /// Value copy of the latest snapshot.
    pub fn get_state(&self) -> Snapshot {
        self.current().clone()
    }

    /// Latest snapshot, borrowed.
    pub fn current(&self) -> &Snapshot {
        // The trace is never empty: construction and reset both recompute.
        &self.trace[self.trace.len() - 1]
    }

    pub fn trace(&self) -> &[Snapshot] {
        &self.trace
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    fn advance(&mut self, mobility: Mobility) -> &Snapshot {
        self.topology.advance(mobility, self.config.dt, self.config.area_size);
        self.step_count += 1;
        self.recompute();
        self.current()
    }

    /// Gains → pilots → clusters → snapshot, appended to the trace.
    fn recompute(&mut self) {
        let config = &self.config;
        let beta = channel::gain_matrix(&self.topology);
        let pilots = pilot::assign_pilots(
            &self.topology.ue_positions,
            config.num_pilots,
            config.pilot_reuse_dist,
        );
        let allocation = cluster::allocate(&beta, &pilots, config);

        let served = allocation.served();
        let cluster_total: usize = allocation.clusters.iter().map(Vec::len).sum();
        let ap_resources = allocation.resources.into_cells();
        let stats = StepStats {
            served_ues: served,
            dropped_ues: config.num_ues - served,
            pilot_reuse_violations: pilot::reuse_violations(
                &self.topology.ue_positions,
                &pilots,
                config.pilot_reuse_dist,
            ),
            occupied_rbs: ap_resources.iter().flatten().filter(|c| !c.is_empty()).count(),
            occupied_slots: ap_resources.iter().flatten().map(RbOccupancy::load).sum(),
            mean_cluster_size: if served > 0 {
                cluster_total as f64 / served as f64
            } else {
                0.0
            },
        };
        debug!(
            step = self.step_count,
            served = stats.served_ues,
            dropped = stats.dropped_ues,
            reuse_violations = stats.pilot_reuse_violations,
            "step recomputed"
        );

        self.trace.push(Snapshot {
            step: self.step_count,
            time: self.step_count as f64 * config.dt,
            ap_positions: self.topology.ap_positions.clone(),
            ue_positions: self.topology.ue_positions.clone(),
            pilot_assignments: pilots,
            ue_clusters: allocation.clusters,
            ue_cluster_rb: allocation.cluster_rb,
            ap_resources,
            stats,
        });
    }
}

fn random_layout(config: &SimConfig) -> Topology {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    Topology::random(config, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> SimConfig {
        SimConfig { num_aps: 8, num_ues: 6, area_size: 200.0, pilot_reuse_dist: 50.0, ..Default::default() }
    }

    #[test]
    fn construction_rejects_bad_config() {
        let err = CellFreeSimulation::new(SimConfig { num_aps: 0, ..Default::default() });
        assert!(matches!(err, Err(SimError::Config(ConfigError::NoAccessPoints))));
    }

    #[test]
    fn initial_snapshot_is_step_zero() {
        let sim = CellFreeSimulation::new(small()).expect("test: valid config");
        assert_eq!(sim.trace().len(), 1);
        let snap = sim.get_state();
        assert_eq!(snap.step, 0);
        assert_eq!(snap.time, 0.0);
        assert_eq!(snap.ue_count(), 6);
        assert_eq!(snap.ap_count(), 8);
        assert_eq!(snap.ap_resources.len(), 8);
        assert!(snap.ap_resources.iter().all(|row| row.len() == 4));
    }

    #[test]
    fn steps_extend_the_trace() {
        let mut sim = CellFreeSimulation::new(small()).expect("test: valid config");
        sim.step();
        sim.run_batch(3);
        assert_eq!(sim.trace().len(), 5);
        assert_eq!(sim.step_count(), 4);
        assert_eq!(sim.current().step, 4);
        assert_eq!(sim.current().time, 4.0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut sim = CellFreeSimulation::new(small()).expect("test: valid config");
        let first = sim.get_state();
        sim.run_batch(5);
        sim.reset();
        assert_eq!(sim.trace().len(), 1);
        assert_eq!(sim.get_state(), first);
    }

    #[test]
    fn reset_restores_fixed_layout() {
        let config = SimConfig { num_aps: 2, num_ues: 2, area_size: 100.0, ..Default::default() };
        let layout = Topology {
            ap_positions: vec![Position::new(10.0, 10.0), Position::new(90.0, 90.0)],
            ue_positions: vec![Position::new(40.0, 40.0), Position::new(60.0, 20.0)],
            ue_velocities: vec![Velocity::new(3.0, -1.0), Velocity::new(-2.0, 2.5)],
        };
        let mut sim = CellFreeSimulation::with_topology(config, layout.clone()).expect("test: valid layout");
        let first = sim.get_state();
        sim.run_batch(5);
        assert_ne!(sim.topology(), &layout);

        sim.reset();
        assert_eq!(sim.topology(), &layout);
        assert_eq!(sim.trace().len(), 1);
        assert_eq!(sim.step_count(), 0);
        assert_eq!(sim.get_state(), first);
    }

    #[test]
    fn unknown_probe_ue_is_rejected_without_side_effects() {
        let mut sim = CellFreeSimulation::new(small()).expect("test: valid config");
        let before = sim.get_state();
        let err = sim.step_with(Mobility::Single(6));
        assert_eq!(err.err(), Some(SimError::UnknownUe { ue: 6, count: 6 }));
        assert_eq!(sim.trace().len(), 1);
        assert_eq!(sim.get_state(), before);
    }

    #[test]
    fn probe_mode_moves_only_the_probe() {
        let mut sim = CellFreeSimulation::new(small()).expect("test: valid config");
        let before = sim.get_state();
        let snap = sim.step_with(Mobility::Single(2)).expect("test: UE 2 exists").clone();
        for ue in 0..6 {
            if ue != 2 {
                assert_eq!(snap.ue_positions[ue], before.ue_positions[ue]);
            }
        }
    }

    #[test]
    fn fixed_layout_must_match_config() {
        let topo = Topology {
            ap_positions: vec![Position::new(0.0, 0.0)],
            ue_positions: vec![Position::new(1.0, 1.0)],
            ue_velocities: vec![Velocity::default()],
        };
        let err = CellFreeSimulation::with_topology(small(), topo);
        assert!(matches!(err, Err(SimError::Config(ConfigError::TopologyShape { .. }))));
    }
}
