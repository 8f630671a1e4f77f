// Monte Carlo Infrastructure: N runs per scenario with statistical aggregation
// Run i uses seed base_seed + i; everything else comes from the scenario config

use cellfree_engine::*;
use tracing::{debug, warn};

use crate::metrics::{invariant_breaches, ChurnTracker, ServiceTracker};
use crate::report::*;
use crate::scenarios::Scenario;
use crate::time_series::{StepRecord, TimeSeriesRecorder};

use std::time::Instant;

/// Run a single scenario iteration with a specific seed.
pub fn run_single(
    scenario: &Scenario,
    seed: u64,
    steps: u64,
    time_series_dir: Option<&std::path::Path>,
) -> Result<BenchResult, SimError> {
    let start = Instant::now();
    let config = SimConfig { seed, ..scenario.config.clone() };
    let mut sim = CellFreeSimulation::new(config.clone())?;

    let mut service = ServiceTracker::new();
    let mut churn = ChurnTracker::new();
    let mut time_series = time_series_dir.map(|_| TimeSeriesRecorder::new());
    let mut breaches: u32 = 0;
    let mut occupied_cells: usize = 0;

    let mut record = |snap: &Snapshot| {
        service.record_step(snap);
        let added = churn.record_step(snap);
        let step_breaches = invariant_breaches(snap, &config);
        breaches += step_breaches;
        occupied_cells += snap.stats.occupied_rbs;
        if let Some(ts) = time_series.as_mut() {
            ts.record(StepRecord::from_snapshot(snap, added, step_breaches));
        }
    };

    record(sim.current());
    for _ in 0..steps {
        let snap = match scenario.probe {
            Some(ue) => sim.step_with(Mobility::Single(ue))?,
            None => sim.step(),
        };
        record(snap);
    }

    if let (Some(ts), Some(dir)) = (&time_series, time_series_dir) {
        let path = dir.join(format!("seed-{}.jsonl", seed));
        if let Err(e) = ts.write_jsonl(&path) {
            warn!(path = %path.display(), error = %e, "failed to write time series");
        }
    }

    let elapsed = start.elapsed();
    let recorded = service.ratios.len().max(1) as f64;
    let cells = (config.num_aps * config.rbs_per_ap) as f64;
    let rb_utilization = occupied_cells as f64 / (cells * recorded);

    let mut pass = breaches == 0;
    if let Some(min_ratio) = scenario.criteria.min_served_ratio {
        if service.mean_ratio() < min_ratio {
            pass = false;
        }
    }
    if let Some(max_violations) = scenario.criteria.max_reuse_violations {
        if service.mean_reuse_violations() > max_violations {
            pass = false;
        }
    }
    debug!(scenario = scenario.name, seed, pass, breaches, "run finished");

    Ok(BenchResult {
        scenario: scenario.label.to_string(),
        name: scenario.name.to_string(),
        category: scenario.category.to_string(),
        seed,
        pass,
        steps,
        mean_served_ratio: service.mean_ratio(),
        min_served_ratio: service.min_ratio(),
        mean_reuse_violations: service.mean_reuse_violations(),
        mean_cluster_size: service.mean_cluster_size(),
        rb_utilization,
        mean_new_links: churn.mean_new_links(),
        invariant_breaches: breaches,
        elapsed_ms: elapsed.as_millis(),
        steps_per_sec: steps as f64 / elapsed.as_secs_f64().max(0.001),
    })
}

/// Run Monte Carlo: N runs of a scenario, aggregate stats.
pub fn run_monte_carlo(
    scenario: &Scenario,
    n_runs: usize,
    base_seed: u64,
    steps: u64,
    time_series_base: Option<&std::path::Path>,
) -> Result<MonteCarloReport, SimError> {
    let ts_dir = time_series_base.map(|base| base.join(scenario.name.to_lowercase()));

    let mut results = Vec::with_capacity(n_runs);
    for i in 0..n_runs {
        let seed = base_seed.wrapping_add(i as u64);
        results.push(run_single(scenario, seed, steps, ts_dir.as_deref())?);
    }

    Ok(aggregate(scenario, results))
}

fn stats_of(results: &[BenchResult], f: impl Fn(&BenchResult) -> f64) -> Stats {
    Stats::from_samples(&results.iter().map(f).collect::<Vec<_>>())
}

/// Aggregate individual runs into a MonteCarloReport.
fn aggregate(scenario: &Scenario, results: Vec<BenchResult>) -> MonteCarloReport {
    let n = results.len();
    let passed = results.iter().filter(|r| r.pass).count();

    MonteCarloReport {
        scenario_name: scenario.name.to_string(),
        label: scenario.label.to_string(),
        category: scenario.category.to_string(),
        n_runs: n,
        pass_rate: if n > 0 { passed as f64 / n as f64 } else { 0.0 },
        served_ratio: stats_of(&results, |r| r.mean_served_ratio),
        min_served_ratio: stats_of(&results, |r| r.min_served_ratio),
        reuse_violations: stats_of(&results, |r| r.mean_reuse_violations),
        cluster_size: stats_of(&results, |r| r.mean_cluster_size),
        rb_utilization: stats_of(&results, |r| r.rb_utilization),
        new_links: stats_of(&results, |r| r.mean_new_links),
        elapsed_ms: stats_of(&results, |r| r.elapsed_ms as f64),
        steps_per_sec: stats_of(&results, |r| r.steps_per_sec),
        individual_runs: results,
    }
}
