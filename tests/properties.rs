//! Invariants that must hold on every tick regardless of rig or motion.

use glam::Vec3;
use legwork::{
    BodyPose, FlatGround, Leg, LegId, GroupId, LegTuning, LocomotionConfig, ProbeSettings,
    StepProgress,
};
use rstest::rstest;
use static_assertions::assert_impl_all;
use test_utils::body::ScriptedBody;
use test_utils::rigs::{self, DT, RIDE_HEIGHT};

assert_impl_all!(legwork::LegCoordinator: Send, Sync);
assert_impl_all!(legwork::CoordinatorSnapshot: Send, Sync, Clone);

fn hexapod() -> LocomotionConfig {
    LocomotionConfig::hexapod()
}

fn walking() -> ScriptedBody {
    ScriptedBody::at(Vec3::Y * RIDE_HEIGHT).moving(Vec3::new(0.0, 0.0, 6.0))
}

fn strafing_turn() -> ScriptedBody {
    ScriptedBody::at(Vec3::Y * RIDE_HEIGHT)
        .moving(Vec3::new(3.0, 0.0, 2.0))
        .turning(1.2)
}

fn spinning() -> ScriptedBody {
    ScriptedBody::at(Vec3::Y * RIDE_HEIGHT).turning(4.0)
}

#[rstest]
#[case(hexapod(), walking(), DT)]
#[case(hexapod(), strafing_turn(), DT)]
#[case(hexapod(), spinning(), DT)]
#[case(rigs::quadruped(2, 2), walking(), DT)]
#[case(rigs::quadruped(1, 1), strafing_turn(), DT)]
#[case(rigs::quadruped(0, 3), walking(), 0.5)]
#[case(rigs::single_leg(2.0), walking(), DT)]
fn invariants_hold_every_tick(
    #[case] config: LocomotionConfig,
    #[case] mut body: ScriptedBody,
    #[case] dt: f32,
) {
    let ground = FlatGround::new(0.0);
    let mut coordinator = rigs::coordinator(&config);
    let total = coordinator.legs().len();
    let limits = config.coordinator;
    let mut steps_started = 0;

    for tick in 0..600 {
        body.advance(dt);
        let report = coordinator.tick(&body, &ground, dt);
        let started = report.started().count();
        steps_started += started;

        for &urgency in coordinator.leg_urgency() {
            assert!((0.0..=1.0).contains(&urgency), "tick {tick}: urgency {urgency}");
        }
        for leg in coordinator.legs() {
            let urgency = leg.urgency();
            assert!((0.0..=1.0).contains(&urgency), "tick {tick}: {} urgency {urgency}", leg.name());
        }

        assert_eq!(report.grounded + report.moving, total, "tick {tick}");
        assert_eq!(coordinator.grounded_count() + coordinator.moving_count(), total);

        assert!(
            report.moving <= limits.max_concurrent_moves,
            "tick {tick}: {} moving",
            report.moving
        );

        assert!(started <= report.gate.budget(), "tick {tick}: gate {}", report.gate);
        if started > 0 {
            let grounded_before = report.grounded + started;
            assert!(grounded_before >= limits.min_grounded_legs, "tick {tick}");
            assert!(report.grounded >= limits.min_grounded_legs, "tick {tick}");
        }

        for id in report.landed() {
            let leg = coordinator.leg(id).expect("landed leg exists");
            assert_eq!(
                leg.current_pose(),
                leg.target_pose(),
                "tick {tick}: {} landed off target",
                leg.name()
            );
        }
        for leg in coordinator.legs().iter().filter(|leg| leg.is_moving()) {
            let landing = leg.state().trajectory().map(|step| step.to);
            assert_eq!(
                landing,
                Some(leg.target_pose()),
                "tick {tick}: {} target drifted mid-step",
                leg.name()
            );
        }

        let group_sum: f32 = coordinator.group_urgency().iter().sum();
        let leg_sum: f32 = coordinator.leg_urgency().iter().sum();
        assert!((group_sum - leg_sum).abs() < 1e-4, "tick {tick}");
    }

    assert!(steps_started > 0, "the rig never stepped");
}

fn leg_with_target(target: Vec3) -> Leg {
    let mut leg = Leg::new(
        LegId(0),
        "lone",
        GroupId(0),
        Vec3::ZERO,
        LegTuning::default(),
        Vec3::ZERO,
        0.0,
    );
    let body = BodyPose::at(target + Vec3::Y * RIDE_HEIGHT);
    leg.update_target_pose(&body, Vec3::ZERO, &FlatGround::new(0.0), &ProbeSettings::default());
    leg
}

#[rstest]
#[case(0.3)]
#[case(1.0)]
#[case(25.0)]
fn completed_steps_stay_put(#[case] dt: f32) {
    let mut leg = leg_with_target(Vec3::new(1.5, 0.0, 0.5));
    assert!(leg.start_step());
    let mut completed = 0;
    for _ in 0..8 {
        if let StepProgress::Completed { .. } = leg.advance_step(dt) {
            completed += 1;
        }
        if !leg.is_moving() {
            assert_eq!(leg.current_pose(), leg.target_pose());
        }
    }
    assert_eq!(completed, 1);
    assert_eq!(leg.current_pose(), leg.target_pose());
}

#[rstest]
fn interpolation_starts_and_ends_on_the_endpoints() {
    let mut leg = leg_with_target(Vec3::new(-1.0, 0.0, 1.0));
    let old = leg.current_pose();
    leg.start_step();
    assert_eq!(leg.advance_step(0.0), StepProgress::InFlight { t: 0.0 });
    assert!(leg.current_pose().abs_diff_eq(old, 1e-5));
    let duration = leg.tuning().step_duration;
    assert!(matches!(leg.advance_step(duration), StepProgress::Completed { .. }));
    assert_eq!(leg.current_pose(), leg.target_pose());
}
