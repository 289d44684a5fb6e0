//! Vehicle generator
//!
//! The generator is resumed every tick and emits one vehicle per period
//! boundary. It only decides *when* and *with what* a vehicle is created;
//! the world registers the vehicle with the scheduler.

use rand::Rng;
use rand_distr::{Distribution, Exp};

use super::error::{ensure_positive, ConfigError, ConfigResult};
use super::model::ModelParams;
use super::types::{EntityId, GeneratorId, SimTime, VehicleId, TIME_EPSILON};

/// Everything needed to create the next vehicle
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSpec {
    pub name: String,
    pub speed: f64,
    pub preceding: Option<VehicleId>,
    pub tagged: bool,
}

/// Periodic source of vehicles
#[derive(Debug, Clone)]
pub struct VehicleGenerator {
    pub id: GeneratorId,
    pub entity: EntityId,
    period: SimTime,
    start: SimTime,
    next_spawn_at: SimTime,
    car_number: u32,
    last_vehicle: Option<VehicleId>,
    speed_distribution: Exp<f64>,
}

impl VehicleGenerator {
    /// Create a generator whose first vehicle appears at `start`
    pub fn new(
        id: GeneratorId,
        entity: EntityId,
        period: SimTime,
        start: SimTime,
        params: &ModelParams,
    ) -> ConfigResult<Self> {
        ensure_positive("period", period)?;
        ensure_positive("mean initial speed", params.mean_initial_speed())?;
        let speed_distribution =
            Exp::new(1.0 / params.mean_initial_speed()).map_err(|_| ConfigError::NonPositive {
                name: "mean initial speed",
                value: params.mean_initial_speed(),
            })?;
        Ok(Self {
            id,
            entity,
            period,
            start,
            next_spawn_at: start,
            car_number: 1,
            last_vehicle: None,
            speed_distribution,
        })
    }

    pub fn period(&self) -> SimTime {
        self.period
    }

    /// Number of vehicles created so far
    pub fn created(&self) -> u32 {
        self.car_number - 1
    }

    pub fn last_vehicle(&self) -> Option<VehicleId> {
        self.last_vehicle
    }

    /// True when `now` has reached the next period boundary
    pub fn is_due(&self, now: SimTime) -> bool {
        now + TIME_EPSILON >= self.next_spawn_at
    }

    /// Describe the vehicle to create at `now`, or `None` between period
    /// boundaries. Call [`Self::record_spawn`] once the vehicle exists.
    pub fn poll<R: Rng + ?Sized>(
        &mut self,
        now: SimTime,
        params: &ModelParams,
        rng: &mut R,
    ) -> Option<VehicleSpec> {
        if !self.is_due(now) {
            return None;
        }
        // First boundary after `now`: a tick that skipped past several
        // boundaries still emits only one vehicle
        let passed = ((now + TIME_EPSILON - self.start) / self.period).floor();
        self.next_spawn_at = self.start + self.period * (passed + 1.0);

        let spec = VehicleSpec {
            name: format!("car {}", self.car_number),
            speed: self.speed_distribution.sample(rng),
            preceding: self.last_vehicle,
            tagged: params.tag_window.contains(now),
        };
        self.car_number += 1;
        Some(spec)
    }

    /// Remember the vehicle just created so the next one follows it
    pub fn record_spawn(&mut self, vehicle: VehicleId) {
        self.last_vehicle = Some(vehicle);
    }
}
