//! Scenario runner
//!
//! Runs one independent simulation per (entry period, speed limit) pair and
//! returns the results instead of accumulating them in shared state.

use anyhow::{Context, Result};
use log::{info, warn};

use crate::simulation::{HighwayWorld, ModelParams, RunReport, SimTime};

/// Seed every run starts from so speed limits are compared on equal footing
pub const DEFAULT_SEED: u64 = 42;

/// Speed limits compared in every scenario, km/h
pub const DEFAULT_SPEED_LIMITS: [f64; 3] = [100.0, 120.0, 140.0];

/// Entry periods of the default scenarios, seconds between vehicles
pub const DEFAULT_PERIODS: [f64; 3] = [4.0, 2.0, 1.0];

/// One entry rate compared across several speed limits
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub period: SimTime,
    pub speed_limits: Vec<f64>,
}

impl Scenario {
    pub fn new(period: SimTime) -> Self {
        Self {
            period,
            speed_limits: DEFAULT_SPEED_LIMITS.to_vec(),
        }
    }
}

/// Everything needed to run a batch of scenarios
#[derive(Debug, Clone)]
pub struct ExperimentPlan {
    pub scenarios: Vec<Scenario>,
    /// Speed limit in here is replaced per run
    pub base: ModelParams,
    pub seed: u64,
}

impl Default for ExperimentPlan {
    fn default() -> Self {
        Self {
            scenarios: DEFAULT_PERIODS.iter().copied().map(Scenario::new).collect(),
            base: ModelParams::default(),
            seed: DEFAULT_SEED,
        }
    }
}

/// Results of one scenario, one report per speed limit in plan order
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub period: SimTime,
    pub runs: Vec<RunReport>,
}

impl ScenarioReport {
    /// Most vehicles through and the speed limit that achieved it; the
    /// earliest limit wins a tie
    pub fn best_throughput(&self) -> Option<(u32, f64)> {
        self.runs.iter().fold(None, |best, run| match best {
            Some((exited, _)) if exited >= run.exited => best,
            _ => Some((run.exited, run.speed_limit)),
        })
    }

    /// Shortest tagged travel time and its speed limit, ignoring runs in
    /// which the tagged vehicle never made it off the road
    pub fn fastest_tagged(&self) -> Option<(SimTime, f64)> {
        self.runs
            .iter()
            .filter_map(|run| {
                run.tagged_travel_time
                    .filter(|&t| t > 0.0)
                    .map(|t| (t, run.speed_limit))
            })
            .fold(None, |best, (t, limit)| match best {
                Some((best_t, _)) if best_t <= t => best,
                _ => Some((t, limit)),
            })
    }
}

/// Run a single simulation with one generator
pub fn run_once(params: ModelParams, period: SimTime, seed: u64) -> Result<RunReport> {
    let speed_limit = params.speed_limit;
    let mut world = HighwayWorld::new(params, seed)
        .with_context(|| format!("invalid parameters for speed limit {}", speed_limit))?;
    world
        .start_generator(period)
        .with_context(|| format!("invalid entry period {}", period))?;
    Ok(world.run())
}

/// Run every speed limit of `scenario`
pub fn run_scenario(scenario: &Scenario, base: &ModelParams, seed: u64) -> Result<ScenarioReport> {
    let mut runs = Vec::with_capacity(scenario.speed_limits.len());
    for &limit in &scenario.speed_limits {
        let params = base.clone().with_speed_limit(limit);
        let report = run_once(params, scenario.period, seed)?;
        info!(
            "period {}s, limit {} km/h: {} exited, {} crashed",
            scenario.period, limit, report.exited, report.crashed
        );
        runs.push(report);
    }

    let report = ScenarioReport {
        period: scenario.period,
        runs,
    };
    if report.fastest_tagged().is_none() {
        warn!(
            "no tagged vehicle left the road for entry period {}s",
            scenario.period
        );
    }
    Ok(report)
}

/// Run every scenario of `plan` in order
pub fn run_experiment(plan: &ExperimentPlan) -> Result<Vec<ScenarioReport>> {
    plan.scenarios
        .iter()
        .map(|scenario| run_scenario(scenario, &plan.base, plan.seed))
        .collect()
}
