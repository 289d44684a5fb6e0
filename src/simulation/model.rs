//! Run parameters and run-accumulated counters

use super::error::{ensure_positive, ConfigError, ConfigResult};
use super::monitor::Monitor;
use super::types::{SimTime, TIME_EPSILON};

/// Default speed limit in km/h
pub const DEFAULT_SPEED_LIMIT: f64 = 100.0;

/// Default road length in metres
pub const DEFAULT_ROAD_LENGTH: f64 = 34_000.0;

/// Default tick size in simulated seconds
pub const DEFAULT_TICK_SIZE: f64 = 1.0;

/// Default run duration in simulated seconds
pub const DEFAULT_RUN_DURATION: f64 = 3600.0;

/// A single threshold comparison with explicit boundary handling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub limit: f64,
    /// Whether a separation exactly equal to `limit` matches
    pub inclusive: bool,
}

impl Threshold {
    pub const fn exclusive(limit: f64) -> Self {
        Self {
            limit,
            inclusive: false,
        }
    }

    pub const fn inclusive(limit: f64) -> Self {
        Self {
            limit,
            inclusive: true,
        }
    }

    pub fn is_below(&self, value: f64) -> bool {
        value < self.limit || (self.inclusive && value == self.limit)
    }

    pub fn is_above(&self, value: f64) -> bool {
        value > self.limit || (self.inclusive && value == self.limit)
    }
}

/// Separation-in-time thresholds (seconds) for the speed regimes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedThresholds {
    /// Separations below this are panic
    pub panic: Threshold,
    /// Separations below this (and not panic) are caution
    pub caution: Threshold,
    /// Separations above this are normal
    pub normal: Threshold,
}

impl Default for SpeedThresholds {
    fn default() -> Self {
        Self {
            panic: Threshold::exclusive(0.5),
            caution: Threshold::exclusive(1.0),
            normal: Threshold::exclusive(2.0),
        }
    }
}

/// Creation-time window in which a new vehicle is tagged
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagWindow {
    pub start: SimTime,
    pub end: SimTime,
    pub end_inclusive: bool,
}

impl Default for TagWindow {
    fn default() -> Self {
        Self {
            start: 49.0,
            end: 50.0,
            end_inclusive: false,
        }
    }
}

impl TagWindow {
    /// Both bounds tolerate the clock drift of summed fractional ticks
    pub fn contains(&self, time: SimTime) -> bool {
        let end_ok = if self.end_inclusive {
            time <= self.end + TIME_EPSILON
        } else {
            time + TIME_EPSILON < self.end
        };
        time + TIME_EPSILON >= self.start && end_ok
    }
}

/// Parameters that stay fixed for a whole run
#[derive(Debug, Clone, PartialEq)]
pub struct ModelParams {
    /// km/h
    pub speed_limit: f64,
    /// metres
    pub road_length: f64,
    /// simulated seconds between vehicle updates
    pub tick_size: SimTime,
    pub run_duration: SimTime,
    /// Mean initial speed as a multiple of the speed limit
    pub initial_speed_factor: f64,
    /// Panic speed as a fraction of the speed limit
    pub panic_speed_fraction: f64,
    /// Multiplier applied to the current speed on each caution tick
    pub caution_factor: f64,
    pub thresholds: SpeedThresholds,
    pub tag_window: TagWindow,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            speed_limit: DEFAULT_SPEED_LIMIT,
            road_length: DEFAULT_ROAD_LENGTH,
            tick_size: DEFAULT_TICK_SIZE,
            run_duration: DEFAULT_RUN_DURATION,
            initial_speed_factor: 1.05,
            panic_speed_fraction: 0.05,
            caution_factor: 0.85,
            thresholds: SpeedThresholds::default(),
            tag_window: TagWindow::default(),
        }
    }
}

impl ModelParams {
    pub fn with_speed_limit(mut self, speed_limit: f64) -> Self {
        self.speed_limit = speed_limit;
        self
    }

    /// Check every parameter before anything gets scheduled
    pub fn validate(&self) -> ConfigResult<()> {
        ensure_positive("speed_limit", self.speed_limit)?;
        ensure_positive("road_length", self.road_length)?;
        ensure_positive("tick_size", self.tick_size)?;
        ensure_positive("run_duration", self.run_duration)?;
        ensure_positive("initial_speed_factor", self.initial_speed_factor)?;
        ensure_positive("panic_speed_fraction", self.panic_speed_fraction)?;
        ensure_positive("caution_factor", self.caution_factor)?;

        let t = &self.thresholds;
        if !(t.panic.limit <= t.caution.limit && t.caution.limit <= t.normal.limit) {
            return Err(ConfigError::ThresholdOrder {
                panic: t.panic.limit,
                caution: t.caution.limit,
                normal: t.normal.limit,
            });
        }

        let w = &self.tag_window;
        if !(w.start <= w.end) {
            return Err(ConfigError::TagWindow {
                start: w.start,
                end: w.end,
            });
        }
        Ok(())
    }

    /// Mean of the initial speed distribution in km/h
    pub fn mean_initial_speed(&self) -> f64 {
        self.speed_limit * self.initial_speed_factor
    }
}

/// Observations the vehicles report into while the run progresses
#[derive(Debug, Clone)]
pub struct RunMonitors {
    /// Running exit count, observed at every exit
    pub exits: Monitor,
    /// Running crash count, observed at every collision
    pub crashes: Monitor,
    /// Travel time of every exiting vehicle
    pub travel_times: Monitor,
}

impl Default for RunMonitors {
    fn default() -> Self {
        Self {
            exits: Monitor::new("exits"),
            crashes: Monitor::new("crashes"),
            travel_times: Monitor::new("travel times"),
        }
    }
}

/// Parameters plus the counters mutated by vehicles as they terminate
#[derive(Debug, Clone)]
pub struct Model {
    params: ModelParams,
    exited_count: u32,
    crashed_count: u32,
    tagged_travel_time: Option<SimTime>,
    monitors: RunMonitors,
}

impl Model {
    pub fn new(params: ModelParams) -> ConfigResult<Self> {
        params.validate()?;
        Ok(Self {
            params,
            exited_count: 0,
            crashed_count: 0,
            tagged_travel_time: None,
            monitors: RunMonitors::default(),
        })
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn exited_count(&self) -> u32 {
        self.exited_count
    }

    pub fn crashed_count(&self) -> u32 {
        self.crashed_count
    }

    /// Travel time of the tagged vehicle, if it has exited
    pub fn tagged_travel_time(&self) -> Option<SimTime> {
        self.tagged_travel_time
    }

    pub fn monitors(&self) -> &RunMonitors {
        &self.monitors
    }

    /// A collision always involves two vehicles and is counted once
    pub(crate) fn record_collision(&mut self, now: SimTime) {
        self.crashed_count += 2;
        self.monitors
            .crashes
            .observe(now, f64::from(self.crashed_count));
    }

    pub(crate) fn record_exit(&mut self, now: SimTime, travel_time: SimTime, tagged: bool) {
        self.exited_count += 1;
        self.monitors
            .exits
            .observe(now, f64::from(self.exited_count));
        self.monitors.travel_times.observe(now, travel_time);
        if tagged {
            self.tagged_travel_time = Some(travel_time);
        }
    }
}
