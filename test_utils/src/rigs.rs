//! Rig configurations and coordinators used across integration tests.

use glam::Vec3;
use legwork::{
    BodyPose, FlatGround, LegCoordinator, LegSpec, LocomotionConfig, TerrainProbe,
};

/// Fixed timestep used by the tests.
pub const DT: f32 = 1.0 / 60.0;

/// Height bodies ride above flat ground.
pub const RIDE_HEIGHT: f32 = 1.0;

/// One leg in group `"A"` with the given step distance and no stability
/// floor.
pub fn single_leg(step_distance: f32) -> LocomotionConfig {
    let mut config = LocomotionConfig {
        groups: vec!["A".to_owned()],
        legs: vec![LegSpec::new("solo", "A", Vec3::ZERO)],
        ..LocomotionConfig::default()
    };
    config.tuning.step_distance = step_distance;
    config.coordinator.min_grounded_legs = 0;
    config
}

/// Four legs in two diagonal pairs.
pub fn quadruped(min_grounded: usize, max_concurrent: usize) -> LocomotionConfig {
    let mut config = LocomotionConfig {
        groups: vec!["diag_a".to_owned(), "diag_b".to_owned()],
        legs: vec![
            LegSpec::new("front_left", "diag_a", Vec3::new(-1.0, 0.0, 1.0)),
            LegSpec::new("front_right", "diag_b", Vec3::new(1.0, 0.0, 1.0)),
            LegSpec::new("rear_left", "diag_b", Vec3::new(-1.0, 0.0, -1.0)),
            LegSpec::new("rear_right", "diag_a", Vec3::new(1.0, 0.0, -1.0)),
        ],
        ..LocomotionConfig::default()
    };
    config.coordinator.min_grounded_legs = min_grounded;
    config.coordinator.max_concurrent_moves = max_concurrent;
    config
}

/// Builds a coordinator for a body resting at `RIDE_HEIGHT` above the
/// origin.
///
/// # Panics
/// Panics if `config` is invalid.
pub fn coordinator_on<P: TerrainProbe>(config: &LocomotionConfig, probe: &P) -> LegCoordinator {
    LegCoordinator::new(config, &BodyPose::at(Vec3::Y * RIDE_HEIGHT), probe)
        .unwrap_or_else(|e| panic!("test rig rejected: {e}"))
}

/// Builds a coordinator standing on flat ground at height zero.
///
/// # Panics
/// Panics if `config` is invalid.
pub fn coordinator(config: &LocomotionConfig) -> LegCoordinator {
    coordinator_on(config, &FlatGround::new(0.0))
}
