use anyhow::Result;
use clap::Parser;
use log::debug;

use highway_sim::scenario::{
    run_experiment, ExperimentPlan, Scenario, ScenarioReport, DEFAULT_PERIODS, DEFAULT_SEED,
    DEFAULT_SPEED_LIMITS,
};
use highway_sim::simulation::{
    ModelParams, DEFAULT_ROAD_LENGTH, DEFAULT_RUN_DURATION, DEFAULT_TICK_SIZE,
};

#[derive(Parser)]
#[command(name = "highway_sim")]
#[command(about = "Compare highway throughput across entry rates and speed limits")]
struct Cli {
    /// Seconds between vehicles entering the highway; one scenario per value
    #[arg(long = "period", value_name = "SECONDS")]
    periods: Vec<f64>,

    /// Speed limits compared in every scenario, km/h
    #[arg(long = "speed-limit", value_name = "KMH")]
    speed_limits: Vec<f64>,

    /// Road length in metres
    #[arg(long, default_value_t = DEFAULT_ROAD_LENGTH)]
    road_length: f64,

    /// Simulated seconds between vehicle updates
    #[arg(long, default_value_t = DEFAULT_TICK_SIZE)]
    tick: f64,

    /// Simulated seconds per run
    #[arg(long, default_value_t = DEFAULT_RUN_DURATION)]
    duration: f64,

    /// RNG seed used for every run
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,
}

impl Cli {
    fn plan(&self) -> ExperimentPlan {
        let periods = if self.periods.is_empty() {
            DEFAULT_PERIODS.to_vec()
        } else {
            self.periods.clone()
        };
        let speed_limits = if self.speed_limits.is_empty() {
            DEFAULT_SPEED_LIMITS.to_vec()
        } else {
            self.speed_limits.clone()
        };

        ExperimentPlan {
            scenarios: periods
                .into_iter()
                .map(|period| Scenario {
                    period,
                    speed_limits: speed_limits.clone(),
                })
                .collect(),
            base: ModelParams {
                road_length: self.road_length,
                tick_size: self.tick,
                run_duration: self.duration,
                ..ModelParams::default()
            },
            seed: self.seed,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,highway_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    let plan = cli.plan();
    debug!("running {} scenarios with seed {}", plan.scenarios.len(), plan.seed);

    let reports = run_experiment(&plan)?;
    println!();
    for (i, report) in reports.iter().enumerate() {
        print_scenario(i + 1, report);
    }
    Ok(())
}

/// Print the results of one scenario
fn print_scenario(number: usize, report: &ScenarioReport) {
    println!("Scenario {} (one vehicle every {}s):", number, report.period);
    println!("*************************************************************");
    for run in &report.runs {
        println!(
            "  {} km/h: {} exited the highway safely, {} crashed",
            run.speed_limit, run.exited, run.crashed
        );
    }

    if let Some((exited, limit)) = report.best_throughput() {
        println!(
            "The most vehicles that fully travel the highway is {} when the speed limit is {} km/h",
            exited, limit
        );
    }

    match report.fastest_tagged() {
        Some((time, limit)) => println!(
            "The fastest travel time for the vehicle entering at 49s is {:.1}s when the speed limit is {} km/h",
            time, limit
        ),
        None => println!("The vehicle entering at 49s never made it through the highway"),
    }
    println!();
}
