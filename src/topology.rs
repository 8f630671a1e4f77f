// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cell-Free MIMO Simulation Suite - Topology
//
// AP and UE placement plus UE kinematics. Random layouts draw, in order,
// UE positions, AP positions and UE velocities, each x before y.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SimConfig};
use crate::types::{Mobility, Position, Velocity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub ap_positions: Vec<Position>,
    pub ue_positions: Vec<Position>,
    pub ue_velocities: Vec<Velocity>,
}

impl Topology {
    /// Uniform placement over the area, uniform velocities in
    /// `[-max_speed, max_speed]`.
    pub fn random<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Self {
        let area = config.area_size;
        let ue_positions = (0..config.num_ues)
            .map(|_| {
                let x = rng.gen_range(0.0..area);
                let y = rng.gen_range(0.0..area);
                Position::new(x, y)
            })
            .collect();
        let ap_positions = (0..config.num_aps)
            .map(|_| {
                let x = rng.gen_range(0.0..area);
                let y = rng.gen_range(0.0..area);
                Position::new(x, y)
            })
            .collect();
        let v = config.max_speed;
        let ue_velocities = (0..config.num_ues)
            .map(|_| {
                if v > 0.0 {
                    let vx = rng.gen_range(-v..v);
                    let vy = rng.gen_range(-v..v);
                    Velocity::new(vx, vy)
                } else {
                    Velocity::default()
                }
            })
            .collect();
        Self { ap_positions, ue_positions, ue_velocities }
    }

    /// Check that a caller-supplied layout matches the config and lies
    /// inside the area.
    pub fn check(&self, config: &SimConfig) -> Result<(), ConfigError> {
        shape("APs", config.num_aps, self.ap_positions.len())?;
        shape("UEs", config.num_ues, self.ue_positions.len())?;
        shape("UE velocities", config.num_ues, self.ue_velocities.len())?;
        inside("AP", &self.ap_positions, config.area_size)?;
        inside("UE", &self.ue_positions, config.area_size)?;
        if let Some(index) = self
            .ue_velocities
            .iter()
            .position(|v| !v.vx.is_finite() || !v.vy.is_finite())
        {
            return Err(ConfigError::InvalidVelocity(index));
        }
        Ok(())
    }

    pub fn ap_count(&self) -> usize {
        self.ap_positions.len()
    }

    pub fn ue_count(&self) -> usize {
        self.ue_positions.len()
    }

    /// AP×UE distance matrix, row per AP.
    pub fn distances(&self) -> Vec<Vec<f64>> {
        self.ap_positions
            .iter()
            .map(|ap| self.ue_positions.iter().map(|ue| ap.distance_to(ue)).collect())
            .collect()
    }

    /// Move UEs by `velocity * dt`, clamping each coordinate to
    /// `[0, area_size]`. A UE pushed into a wall stays on it.
    ///
    /// Caller guarantees a `Single` index is in range.
    pub fn advance(&mut self, mobility: Mobility, dt: f64, area_size: f64) {
        match mobility {
            Mobility::All => {
                for ue in 0..self.ue_positions.len() {
                    self.advance_one(ue, dt, area_size);
                }
            }
            Mobility::Single(ue) => self.advance_one(ue, dt, area_size),
        }
    }

    fn advance_one(&mut self, ue: usize, dt: f64, area_size: f64) {
        let v = self.ue_velocities[ue];
        let p = &mut self.ue_positions[ue];
        p.x = (p.x + v.vx * dt).clamp(0.0, area_size);
        p.y = (p.y + v.vy * dt).clamp(0.0, area_size);
    }
}

fn shape(what: &'static str, expected: usize, actual: usize) -> Result<(), ConfigError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ConfigError::TopologyShape { what, expected, actual })
    }
}

fn inside(what: &'static str, points: &[Position], area: f64) -> Result<(), ConfigError> {
    let outside = |p: &Position| {
        !(0.0..=area).contains(&p.x) || !(0.0..=area).contains(&p.y)
    };
    match points.iter().position(outside) {
        Some(index) => Err(ConfigError::OutOfArea { what, index, area }),
        None => Ok(()),
    }
}
