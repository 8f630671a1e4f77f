// Per-Step JSONL Time Series Recorder
// One JSON line per step for independent analysis

use cellfree_engine::Snapshot;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
pub struct StepRecord {
    pub step: u64,
    pub time: f64,
    pub served_ues: usize,
    pub dropped_ues: usize,
    pub pilot_reuse_violations: usize,
    pub occupied_rbs: usize,
    pub occupied_slots: usize,
    pub mean_cluster_size: f64,
    pub new_links: usize,
    pub invariant_breaches: u32,
}

impl StepRecord {
    pub fn from_snapshot(snap: &Snapshot, new_links: usize, invariant_breaches: u32) -> Self {
        Self {
            step: snap.step,
            time: snap.time,
            served_ues: snap.stats.served_ues,
            dropped_ues: snap.stats.dropped_ues,
            pilot_reuse_violations: snap.stats.pilot_reuse_violations,
            occupied_rbs: snap.stats.occupied_rbs,
            occupied_slots: snap.stats.occupied_slots,
            mean_cluster_size: snap.stats.mean_cluster_size,
            new_links,
            invariant_breaches,
        }
    }
}

pub struct TimeSeriesRecorder {
    records: Vec<StepRecord>,
}

impl TimeSeriesRecorder {
    pub fn new() -> Self {
        Self { records: Vec::new() }
    }

    pub fn record(&mut self, record: StepRecord) {
        self.records.push(record);
    }

    /// Write all records to a JSONL file, creating parent directories.
    pub fn write_jsonl(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(path)?;
        for record in &self.records {
            let line = serde_json::to_string(record)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}
