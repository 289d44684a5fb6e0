//! End-to-end runs of the highway world

use approx::assert_relative_eq;
use highway_sim::simulation::{
    ConfigError, ControlState, HighwayWorld, ModelParams, SpeedThresholds, Threshold,
    TravelState, VehicleId,
};

fn short_run(speed_limit: f64) -> ModelParams {
    ModelParams {
        speed_limit,
        road_length: 2000.0,
        run_duration: 300.0,
        ..ModelParams::default()
    }
}

#[test]
fn test_single_vehicle_crosses_the_road() {
    let mut world = HighwayWorld::new(ModelParams::default(), 42).unwrap();
    // 90 km/h is 25 m/s, so 34000 m takes 1360 ticks
    let car = world.spawn_vehicle("car 1", 90.0, None, false);

    world.run_until(1000.0);
    assert_eq!(world.model().exited_count(), 0);
    assert_relative_eq!(world.vehicle(car).unwrap().position(), 25_025.0);

    let report = world.run();
    let vehicle = world.vehicle(car).unwrap();

    assert_eq!(report.exited, 1);
    assert_eq!(report.crashed, 0);
    assert_eq!(report.tagged_travel_time, None);
    assert_eq!(report.mean_travel_time, Some(1360.0));
    assert_eq!(vehicle.state(), TravelState::Exited);
    assert_eq!(vehicle.current_speed, vehicle.default_speed());

    let exits = &world.model().monitors().exits;
    assert_eq!(exits.value_at(1359.0), None);
    assert_eq!(exits.value_at(1360.0), Some(1.0));
    assert_eq!(
        world.scheduler().state(vehicle.entity),
        ControlState::Terminated
    );
}

#[test]
fn test_tagged_vehicle_travel_time_is_recorded() {
    let mut world = HighwayWorld::new(short_run(100.0), 1).unwrap();
    world.spawn_vehicle("car 1", 72.0, None, true);

    let report = world.run();

    // 2000 m at 20 m/s
    assert_eq!(report.tagged_travel_time, Some(100.0));
    assert_eq!(world.model().tagged_travel_time(), Some(100.0));
}

#[test]
fn test_stalled_vehicle_is_hit_immediately() {
    let mut world = HighwayWorld::new(short_run(100.0), 1).unwrap();
    let lead = world.spawn_vehicle("car 1", 0.0, None, false);
    let rear = world.spawn_vehicle("car 2", 150.0, Some(lead), false);

    world.run_until(0.0);

    assert_eq!(world.model().crashed_count(), 2);
    assert_eq!(world.model().monitors().crashes.tseries(), &[0.0]);
    for id in [lead, rear] {
        let vehicle = world.vehicle(id).unwrap();
        assert_eq!(vehicle.state(), TravelState::Collided);
        assert_eq!(vehicle.position(), 0.0);
        assert_eq!(
            world.scheduler().state(vehicle.entity),
            ControlState::RunnableWhenSignaled
        );
    }

    let report = world.run();
    assert_eq!(report.crashed, 2);
    assert_eq!(report.exited, 0);
    assert_eq!(world.vehicle(lead).unwrap().position(), 0.0);
    assert_eq!(world.vehicle(rear).unwrap().position(), 0.0);
}

#[test]
fn test_rear_vehicle_catches_up_and_freezes_lead() {
    let mut world = HighwayWorld::new(short_run(100.0), 1).unwrap();
    // Lead crawls at 1 m/s; the rear car panics down to 5 km/h, which is
    // still faster, and runs into it on the fourth tick
    let lead = world.spawn_vehicle("car 1", 3.6, None, false);
    let rear = world.spawn_vehicle("car 2", 360.0, Some(lead), false);

    world.run_until(2.0);
    assert_eq!(world.model().crashed_count(), 0);
    assert_relative_eq!(world.vehicle(rear).unwrap().current_speed, 5.0);

    world.run_until(3.0);
    assert_eq!(world.model().crashed_count(), 2);
    assert_eq!(world.model().monitors().crashes.tseries(), &[3.0]);

    let lead_position = world.vehicle(lead).unwrap().position();
    let rear_position = world.vehicle(rear).unwrap().position();
    assert_relative_eq!(lead_position, 4.0, epsilon = 1e-9);
    assert!(rear_position >= lead_position);

    // The lead had already queued its next tick; it must never run
    world.run();
    assert_eq!(world.vehicle(lead).unwrap().position(), lead_position);
    assert_eq!(world.vehicle(rear).unwrap().position(), rear_position);
    assert_eq!(world.model().crashed_count(), 2);
}

#[test]
fn test_generator_cadence_and_chain() {
    let params = ModelParams {
        run_duration: 20.0,
        ..ModelParams::default()
    };
    let mut world = HighwayWorld::new(params, 42).unwrap();
    world.start_generator(4.0).unwrap();
    world.run();

    let entry_times: Vec<f64> = world.vehicles().iter().map(|v| v.entry_time).collect();
    assert_eq!(entry_times, vec![0.0, 4.0, 8.0, 12.0, 16.0, 20.0]);
    assert_eq!(world.generators()[0].created(), 6);
    assert_eq!(world.generators()[0].period(), 4.0);
    assert_eq!(world.generators()[0].last_vehicle(), Some(VehicleId(5)));

    assert_eq!(world.vehicles()[0].preceding, None);
    for (i, vehicle) in world.vehicles().iter().enumerate().skip(1) {
        assert_eq!(vehicle.preceding, Some(VehicleId(i - 1)));
        assert!(vehicle.default_speed() > 0.0);
    }
    assert_eq!(world.vehicles()[5].name, "car 6");
}

#[test]
fn test_generator_emits_once_per_period_boundary() {
    let params = ModelParams {
        run_duration: 10.0,
        ..ModelParams::default()
    };
    let mut world = HighwayWorld::new(params, 42).unwrap();
    world.start_generator(2.5).unwrap();
    world.run();

    let entry_times: Vec<f64> = world.vehicles().iter().map(|v| v.entry_time).collect();
    assert_eq!(entry_times, vec![0.0, 3.0, 5.0, 8.0, 10.0]);
}

#[test]
fn test_sub_tick_period_emits_one_vehicle_per_tick() {
    let params = ModelParams {
        run_duration: 10.0,
        ..ModelParams::default()
    };
    let mut world = HighwayWorld::new(params, 42).unwrap();
    world.start_generator(0.25).unwrap();
    world.run();

    let entry_times: Vec<f64> = world.vehicles().iter().map(|v| v.entry_time).collect();
    let expected: Vec<f64> = (0..=10).map(f64::from).collect();
    assert_eq!(entry_times, expected);
}

#[test]
fn test_period_below_float_resolution_still_finishes() {
    let params = ModelParams {
        run_duration: 2.0,
        ..ModelParams::default()
    };
    let mut world = HighwayWorld::new(params, 42).unwrap();
    world.start_generator(1e-17).unwrap();
    let report = world.run();

    assert_eq!(report.vehicles_created, 3);
    assert_eq!(report.end_time, 2.0);
}

#[test]
fn test_tag_window_marks_vehicle_created_at_49() {
    let params = ModelParams {
        run_duration: 60.0,
        ..ModelParams::default()
    };
    let mut world = HighwayWorld::new(params, 42).unwrap();
    world.start_generator(1.0).unwrap();
    world.run();

    let tagged: Vec<f64> = world
        .vehicles()
        .iter()
        .filter(|v| v.tagged)
        .map(|v| v.entry_time)
        .collect();
    assert_eq!(tagged, vec![49.0]);
}

#[test]
fn test_tag_window_survives_fractional_ticks() {
    let params = ModelParams {
        tick_size: 0.1,
        run_duration: 55.0,
        ..ModelParams::default()
    };
    let mut world = HighwayWorld::new(params, 42).unwrap();
    world.start_generator(1.0).unwrap();
    world.run();

    let tagged: Vec<f64> = world
        .vehicles()
        .iter()
        .filter(|v| v.tagged)
        .map(|v| v.entry_time)
        .collect();
    assert_eq!(tagged.len(), 1, "tagged at {:?}", tagged);
    assert_relative_eq!(tagged[0], 49.0, epsilon = 1e-6);
}

#[test]
fn test_same_seed_gives_same_results() {
    let run = |seed| {
        let mut world = HighwayWorld::new(short_run(140.0), seed).unwrap();
        world.start_generator(1.0).unwrap();
        world.run()
    };

    assert_eq!(run(42), run(42));
    assert!(run(42).vehicles_created > 0);
}

#[test]
fn test_positions_never_move_backward_and_freeze_when_stopped() {
    let mut world = HighwayWorld::new(short_run(140.0), 7).unwrap();
    world.start_generator(1.0).unwrap();

    let mut last: Vec<(f64, bool)> = Vec::new();
    for t in 0..=300 {
        world.run_until(t as f64);
        for (i, vehicle) in world.vehicles().iter().enumerate() {
            if let Some(&(position, alive)) = last.get(i) {
                assert!(vehicle.position() >= position, "{} moved backward", vehicle.name);
                if !alive {
                    assert_eq!(vehicle.position(), position, "{} moved after stopping", vehicle.name);
                    assert!(!vehicle.is_alive());
                }
            }
        }
        last = world
            .vehicles()
            .iter()
            .map(|v| (v.position(), v.is_alive()))
            .collect();
    }

    let collided = world
        .vehicles()
        .iter()
        .filter(|v| v.state() == TravelState::Collided)
        .count();
    let exited = world
        .vehicles()
        .iter()
        .filter(|v| v.state() == TravelState::Exited)
        .count();
    assert_eq!(collided as u32, world.model().crashed_count());
    assert_eq!(exited as u32, world.model().exited_count());
    assert_eq!(world.model().crashed_count() % 2, 0);
}

#[test]
#[should_panic(expected = "invalid speed")]
fn test_negative_spawn_speed_is_rejected() {
    let mut world = HighwayWorld::new(short_run(100.0), 1).unwrap();
    world.spawn_vehicle("car 1", -36.0, None, false);
}

#[test]
fn test_invalid_parameters_fail_before_scheduling() {
    let params = ModelParams {
        tick_size: 0.0,
        ..ModelParams::default()
    };
    assert_eq!(
        HighwayWorld::new(params, 42).err(),
        Some(ConfigError::NonPositive {
            name: "tick_size",
            value: 0.0
        })
    );

    let params = ModelParams {
        road_length: -5.0,
        ..ModelParams::default()
    };
    assert!(HighwayWorld::new(params, 42).is_err());

    let params = ModelParams {
        thresholds: SpeedThresholds {
            panic: Threshold::exclusive(1.5),
            ..SpeedThresholds::default()
        },
        ..ModelParams::default()
    };
    assert!(matches!(
        HighwayWorld::new(params, 42),
        Err(ConfigError::ThresholdOrder { .. })
    ));

    let mut world = HighwayWorld::new(ModelParams::default(), 42).unwrap();
    assert!(world.start_generator(0.0).is_err());
    assert!(world.start_generator(f64::NAN).is_err());
    assert_eq!(world.scheduler().entity_count(), 0);
}
