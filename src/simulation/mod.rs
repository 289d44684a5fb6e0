//! Discrete-event highway simulation
//!
//! This module contains the scheduling substrate (clock, entities, levels,
//! monitors) and the car-following model that runs on top of it. It has no
//! knowledge of scenarios or console output.

mod error;
mod generator;
mod highway;
mod level;
mod model;
mod monitor;
mod scheduler;
mod types;
mod vehicle;

pub use error::{ConfigError, ConfigResult};
pub use generator::{VehicleGenerator, VehicleSpec};
pub use highway::{HighwayWorld, RunReport};
pub use level::{Admission, Level};
pub use model::{
    Model, ModelParams, RunMonitors, SpeedThresholds, TagWindow, Threshold, DEFAULT_ROAD_LENGTH,
    DEFAULT_RUN_DURATION, DEFAULT_SPEED_LIMIT, DEFAULT_TICK_SIZE,
};
pub use monitor::Monitor;
pub use scheduler::{ControlState, Scheduler};
pub use types::{kmh_to_ms, EntityId, GeneratorId, SimTime, VehicleId, TIME_EPSILON};
pub use vehicle::{SpeedRegime, TickOutcome, TravelState, Vehicle};
