//! Car-following logic for a single vehicle
//!
//! A vehicle only ever mutates itself. It reads the preceding vehicle's
//! position and liveness, and reports what happened through [`TickOutcome`]
//! so the world can apply the cross-vehicle effects.

use super::model::{ModelParams, SpeedThresholds};
use super::types::{kmh_to_ms, EntityId, SimTime, VehicleId};

/// Travel state of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TravelState {
    /// Moving, resumed every tick
    Cruising,
    /// Hit or was hit; position frozen
    Collided,
    /// Reached the end of the road
    Exited,
}

/// Speed regime picked from the separation-in-time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedRegime {
    /// Drop to a small fraction of the speed limit
    Panic,
    /// Shave the current speed
    Caution,
    /// Between caution and normal: hold the speed limit
    Steady,
    /// Plenty of room: back to the vehicle's own default speed
    Normal,
}

impl SpeedRegime {
    /// First match wins: panic, caution, normal, otherwise steady
    pub fn classify(separation: f64, thresholds: &SpeedThresholds) -> Self {
        if thresholds.panic.is_below(separation) {
            SpeedRegime::Panic
        } else if thresholds.caution.is_below(separation) {
            SpeedRegime::Caution
        } else if thresholds.normal.is_above(separation) {
            SpeedRegime::Normal
        } else {
            SpeedRegime::Steady
        }
    }

    /// Speed (km/h) for the next tick
    pub fn next_speed(self, current_speed: f64, default_speed: f64, params: &ModelParams) -> f64 {
        match self {
            SpeedRegime::Panic => params.speed_limit * params.panic_speed_fraction,
            SpeedRegime::Caution => current_speed * params.caution_factor,
            SpeedRegime::Steady => params.speed_limit,
            SpeedRegime::Normal => default_speed,
        }
    }
}

/// Result of one tick indicating what the world has to do next
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Still cruising; resume after another tick
    Continue,
    /// Ran into the preceding vehicle, which has to be frozen as well
    Collision { preceding: VehicleId },
    /// Left the road after `travel_time` seconds
    Exited { travel_time: SimTime },
}

/// A vehicle on the highway
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub entity: EntityId,
    pub name: String,
    /// km/h
    pub current_speed: f64,
    /// km/h, the speed the vehicle entered at
    default_speed: f64,
    /// metres from the start of the road
    position: f64,
    pub entry_time: SimTime,
    /// The vehicle created just before this one, i.e. ahead on the road
    pub preceding: Option<VehicleId>,
    state: TravelState,
    pub tagged: bool,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        entity: EntityId,
        name: String,
        speed: f64,
        entry_time: SimTime,
        preceding: Option<VehicleId>,
        tagged: bool,
    ) -> Self {
        Self {
            id,
            entity,
            name,
            current_speed: speed,
            default_speed: speed,
            position: 0.0,
            entry_time,
            preceding,
            state: TravelState::Cruising,
            tagged,
        }
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn default_speed(&self) -> f64 {
        self.default_speed
    }

    pub fn state(&self) -> TravelState {
        self.state
    }

    pub fn is_alive(&self) -> bool {
        self.state == TravelState::Cruising
    }

    /// Gap to `preceding` in seconds at this vehicle's current speed.
    /// A gap of zero or less means the two vehicles touch, reported as 0.
    pub fn separation_in_seconds(&self, preceding: &Vehicle) -> f64 {
        let gap = preceding.position - self.position;
        if gap <= 0.0 {
            return 0.0;
        }
        let separation = gap / kmh_to_ms(self.current_speed);
        assert!(
            separation >= 0.0,
            "{} computed negative separation {} from a positive gap",
            self.name,
            separation
        );
        separation
    }

    /// Advance this vehicle by one tick.
    ///
    /// `preceding` must be the vehicle referenced by `self.preceding`.
    pub fn tick(
        &mut self,
        preceding: Option<&Vehicle>,
        params: &ModelParams,
        now: SimTime,
    ) -> TickOutcome {
        assert!(self.is_alive(), "{} resumed while {:?}", self.name, self.state);
        debug_assert_eq!(preceding.map(|p| p.id), self.preceding);

        if let Some(ahead) = preceding.filter(|p| p.is_alive()) {
            let separation = self.separation_in_seconds(ahead);
            if separation <= 0.0 {
                self.state = TravelState::Collided;
                return TickOutcome::Collision { preceding: ahead.id };
            }
            let regime = SpeedRegime::classify(separation, &params.thresholds);
            self.current_speed = regime.next_speed(self.current_speed, self.default_speed, params);
        }

        if self.position < params.road_length {
            self.advance(params.tick_size);
            TickOutcome::Continue
        } else {
            self.state = TravelState::Exited;
            TickOutcome::Exited {
                travel_time: now - self.entry_time,
            }
        }
    }

    /// Freeze this vehicle after the one behind it ran into it
    pub fn collide_from_behind(&mut self) {
        assert!(
            self.is_alive(),
            "{} hit from behind while {:?}",
            self.name,
            self.state
        );
        self.state = TravelState::Collided;
    }

    fn advance(&mut self, tick_size: SimTime) {
        assert!(
            self.is_alive(),
            "{} advanced while {:?}",
            self.name,
            self.state
        );
        // Position never decreases while the vehicle is on the road
        assert!(
            self.current_speed.is_finite() && self.current_speed >= 0.0,
            "{} advanced at invalid speed {}",
            self.name,
            self.current_speed
        );
        self.position += kmh_to_ms(self.current_speed) * tick_size;
    }
}
