//! Highway world that ties everything together
//!
//! The world owns the scheduler, every vehicle ever created (the arena that
//! `preceding` handles index into), the generators and the model counters.
//! Each resumption popped from the scheduler is dispatched to the entity it
//! belongs to.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::error::ConfigResult;
use super::generator::VehicleGenerator;
use super::model::{Model, ModelParams};
use super::scheduler::Scheduler;
use super::types::{EntityId, GeneratorId, SimTime, VehicleId};
use super::vehicle::{TickOutcome, TravelState, Vehicle};

/// What a scheduler entity stands for in this world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Actor {
    Generator(GeneratorId),
    Vehicle(VehicleId),
}

/// Totals of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub speed_limit: f64,
    pub exited: u32,
    pub crashed: u32,
    pub tagged_travel_time: Option<SimTime>,
    pub vehicles_created: usize,
    pub mean_travel_time: Option<SimTime>,
    pub end_time: SimTime,
}

/// The main simulation world
pub struct HighwayWorld {
    scheduler: Scheduler,
    model: Model,
    /// Indexed by `EntityId`
    actors: Vec<Actor>,
    /// Indexed by `VehicleId`; vehicles stay here after they stop moving
    vehicles: Vec<Vehicle>,
    /// Indexed by `GeneratorId`
    generators: Vec<VehicleGenerator>,
    rng: StdRng,
}

impl HighwayWorld {
    /// Create a world for one run. Fails if the parameters are unusable.
    pub fn new(params: ModelParams, seed: u64) -> ConfigResult<Self> {
        Ok(Self {
            scheduler: Scheduler::new(),
            model: Model::new(params)?,
            actors: Vec::new(),
            vehicles: Vec::new(),
            generators: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn now(&self) -> SimTime {
        self.scheduler.now()
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn params(&self) -> &ModelParams {
        self.model.params()
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id.0)
    }

    pub fn generators(&self) -> &[VehicleGenerator] {
        &self.generators
    }

    /// Start a generator that emits one vehicle every `period` seconds,
    /// beginning at the current time
    pub fn start_generator(&mut self, period: SimTime) -> ConfigResult<GeneratorId> {
        let id = GeneratorId(self.generators.len());
        let generator = VehicleGenerator::new(
            id,
            EntityId(self.scheduler.entity_count()),
            period,
            self.now(),
            self.model.params(),
        )?;
        let entity = self.register(format!("generator {}", id.0), Actor::Generator(id));
        debug_assert_eq!(entity, generator.entity);
        self.generators.push(generator);
        self.scheduler.schedule_after(entity, 0.0);
        Ok(id)
    }

    /// Put a vehicle on the road right now, behind `preceding`. Used by the
    /// generators, and directly when a scenario needs hand-placed vehicles.
    pub fn spawn_vehicle(
        &mut self,
        name: impl Into<String>,
        speed: f64,
        preceding: Option<VehicleId>,
        tagged: bool,
    ) -> VehicleId {
        let id = VehicleId(self.vehicles.len());
        assert!(
            speed.is_finite() && speed >= 0.0,
            "{} spawned with invalid speed {}",
            id,
            speed
        );
        if let Some(ahead) = preceding {
            assert!(ahead < id, "{} cannot follow later {}", id, ahead);
        }
        let name = name.into();
        let entity = self.register(name.clone(), Actor::Vehicle(id));
        let vehicle = Vehicle::new(id, entity, name, speed, self.now(), preceding, tagged);
        debug!(
            "t={:.1} {} enters at {:.1} km/h{}",
            self.now(),
            vehicle.name,
            speed,
            if tagged { " (tagged)" } else { "" }
        );
        self.vehicles.push(vehicle);
        self.scheduler.schedule_after(entity, 0.0);
        id
    }

    /// Run until the configured duration
    pub fn run(&mut self) -> RunReport {
        let until = self.params().run_duration;
        self.run_until(until);
        let report = self.report();
        info!(
            "run finished at t={:.1}: {} exited, {} crashed, {} created",
            report.end_time, report.exited, report.crashed, report.vehicles_created
        );
        report
    }

    /// Resume entities in time order until nothing is due by `until`
    pub fn run_until(&mut self, until: SimTime) {
        while let Some(entity) = self.scheduler.next_due(until) {
            match self.actors[entity.0] {
                Actor::Generator(id) => self.step_generator(id),
                Actor::Vehicle(id) => self.step_vehicle(id),
            }
        }
    }

    /// Snapshot of the counters. Final only once [`Self::run`] has returned.
    pub fn report(&self) -> RunReport {
        RunReport {
            speed_limit: self.params().speed_limit,
            exited: self.model.exited_count(),
            crashed: self.model.crashed_count(),
            tagged_travel_time: self.model.tagged_travel_time(),
            vehicles_created: self.vehicles.len(),
            mean_travel_time: self.model.monitors().travel_times.mean(),
            end_time: self.now(),
        }
    }

    fn register(&mut self, name: String, actor: Actor) -> EntityId {
        let entity = self.scheduler.spawn(name);
        debug_assert_eq!(entity.0, self.actors.len());
        self.actors.push(actor);
        entity
    }

    fn step_generator(&mut self, id: GeneratorId) {
        let now = self.now();
        let generator = &mut self.generators[id.0];
        let spec = generator.poll(now, self.model.params(), &mut self.rng);
        let entity = generator.entity;

        if let Some(spec) = spec {
            let vehicle = self.spawn_vehicle(spec.name, spec.speed, spec.preceding, spec.tagged);
            self.generators[id.0].record_spawn(vehicle);
        }
        let tick = self.params().tick_size;
        self.scheduler.schedule_after(entity, tick);
    }

    fn step_vehicle(&mut self, id: VehicleId) {
        let now = self.now();
        // A vehicle only ever follows an earlier one, so the preceding
        // vehicle always sits in the left half of the split.
        let (ahead, rest) = self.vehicles.split_at_mut(id.0);
        let vehicle = &mut rest[0];
        let preceding = vehicle.preceding.map(|p| &ahead[p.0]);
        let outcome = vehicle.tick(preceding, self.model.params(), now);
        let entity = vehicle.entity;

        match outcome {
            TickOutcome::Continue => {
                let tick = self.params().tick_size;
                self.scheduler.schedule_after(entity, tick);
            }
            TickOutcome::Collision { preceding } => {
                self.scheduler.passivate(entity);
                self.force_collision(preceding);
                self.model.record_collision(now);
                debug!(
                    "t={:.1} crash between {} and {}",
                    now, self.vehicles[preceding.0].name, self.vehicles[id.0].name
                );
            }
            TickOutcome::Exited { travel_time } => {
                self.scheduler.terminate(entity);
                let tagged = self.vehicles[id.0].tagged;
                self.model.record_exit(now, travel_time, tagged);
                debug!(
                    "t={:.1} {} exited after {:.1}s",
                    now, self.vehicles[id.0].name, travel_time
                );
            }
        }
    }

    /// The vehicle at `id` was hit from behind: freeze it and drop any
    /// resumption it already had queued
    fn force_collision(&mut self, id: VehicleId) {
        let victim = &mut self.vehicles[id.0];
        self.scheduler.passivate(victim.entity);
        victim.collide_from_behind();
        debug_assert_eq!(victim.state(), TravelState::Collided);
    }
}
