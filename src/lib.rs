// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Cell-Free MIMO Simulation Suite

pub mod types;
pub mod config;
pub mod topology;
pub mod channel;
pub mod pilot;
pub mod cluster;
pub mod simulation;

pub use types::*;
pub use config::{AllocationOrder, ClusteringStrategy, ConfigError, SimConfig};
pub use topology::Topology;
pub use simulation::{CellFreeSimulation, SimError};

use wasm_bindgen::prelude::*;

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ─── WASM Interface ──────────────────────────────────────────────────────────

#[wasm_bindgen]
impl CellFreeSimulation {
    /// Build from a JS config object; absent keys take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn js_new(config: JsValue) -> Result<CellFreeSimulation, JsValue> {
        #[cfg(target_arch = "wasm32")]
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));

        let config: SimConfig = if config.is_undefined() || config.is_null() {
            SimConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js_error)?
        };
        CellFreeSimulation::new(config).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = step)]
    pub fn js_step(&mut self) -> JsValue {
        let snapshot = self.step();
        serde_wasm_bindgen::to_value(snapshot).unwrap_or(JsValue::NULL)
    }

    /// Probe mode: advance only `ue`, freeze the rest.
    #[wasm_bindgen(js_name = stepSingle)]
    pub fn js_step_single(&mut self, ue: u32) -> Result<JsValue, JsValue> {
        let snapshot = self
            .step_with(Mobility::Single(ue as usize))
            .map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(snapshot).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = reset)]
    pub fn js_reset(&mut self) {
        self.reset();
    }

    #[wasm_bindgen(js_name = getState)]
    pub fn js_get_state(&self) -> JsValue {
        serde_wasm_bindgen::to_value(self.current()).unwrap_or(JsValue::NULL)
    }

    /// Run N steps without returning snapshots.
    #[wasm_bindgen(js_name = runBatch)]
    pub fn js_run_batch(&mut self, steps: u32) {
        self.run_batch(steps);
    }

    #[wasm_bindgen(js_name = stepCount)]
    pub fn js_step_count(&self) -> u32 {
        u32::try_from(self.step_count()).unwrap_or(u32::MAX)
    }

    #[wasm_bindgen(js_name = ueReport)]
    pub fn js_ue_report(&self, ue: u32) -> JsValue {
        match self.current().ue_report(ue as usize) {
            Some(report) => serde_wasm_bindgen::to_value(&report).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    #[wasm_bindgen(js_name = apReport)]
    pub fn js_ap_report(&self, ap: u32) -> JsValue {
        match self.current().ap_report(ap as usize) {
            Some(report) => serde_wasm_bindgen::to_value(&report).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }
}
