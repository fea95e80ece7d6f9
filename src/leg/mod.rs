//! A single limb: planted foot, resolved target, urgency and step playback.
//!
//! Legs never decide to step on their own. The coordinator reads
//! [`Leg::urgency`] and calls [`Leg::start_step`]; the only way back to
//! [`LegState::Idle`] is the step timer running out (or an explicit
//! [`Leg::reset`]).

mod state;

use std::fmt;

use glam::Vec3;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

pub use state::{LegState, StepProgress};

use crate::body::{yaw_drift, BodyPose};
use crate::config::{LegTuning, ProbeSettings};
use crate::step::StepTrajectory;
use crate::target::{attachment_point, predict_foot_target, resolve_foot_target};
use crate::terrain::TerrainProbe;

/// Position of a leg in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegId(pub usize);

/// Position of a group in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub usize);

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "leg#{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Urgency of a planted foot, clamped to `[0, 1]`.
///
/// Positional drift is normalised by the step distance and rotational drift
/// by the rotation threshold; the latter is scaled down by the rotation
/// weight so turning on the spot rarely forces a step by itself. NaN inputs
/// yield zero.
#[must_use]
pub fn urgency(old: Vec3, target: Vec3, rotation_drift: f32, tuning: &LegTuning) -> f32 {
    let positional = old.distance(target) / tuning.step_distance;
    let rotational = rotation_drift / tuning.max_rotation * tuning.rotation_weight;
    let raw = positional + rotational;
    if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, 1.0)
    }
}

/// One limb of the rig.
#[derive(Debug, Clone)]
pub struct Leg {
    id: LegId,
    name: String,
    group: GroupId,
    rest_offset: Vec3,
    tuning: LegTuning,
    old_pose: Vec3,
    current_pose: Vec3,
    target_pose: Vec3,
    tracked_yaw: f32,
    body_yaw: f32,
    state: LegState,
}

impl Leg {
    /// Creates an idle leg with its foot planted at `planted`.
    #[must_use]
    pub fn new(
        id: LegId,
        name: impl Into<String>,
        group: GroupId,
        rest_offset: Vec3,
        tuning: LegTuning,
        planted: Vec3,
        yaw: f32,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            group,
            rest_offset,
            tuning,
            old_pose: planted,
            current_pose: planted,
            target_pose: planted,
            tracked_yaw: yaw,
            body_yaw: yaw,
            state: LegState::default(),
        }
    }

    /// Declaration index.
    #[must_use]
    pub const fn id(&self) -> LegId {
        self.id
    }

    /// Leg name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Group the leg steps with.
    #[must_use]
    pub const fn group(&self) -> GroupId {
        self.group
    }

    /// Attachment point in body space.
    #[must_use]
    pub const fn rest_offset(&self) -> Vec3 {
        self.rest_offset
    }

    /// Tuning used for the next step.
    #[must_use]
    pub const fn tuning(&self) -> &LegTuning {
        &self.tuning
    }

    /// Foot position at the last touchdown.
    #[must_use]
    pub const fn old_pose(&self) -> Vec3 {
        self.old_pose
    }

    /// Observable foot position.
    #[must_use]
    pub const fn current_pose(&self) -> Vec3 {
        self.current_pose
    }

    /// Last successfully resolved foot target.
    #[must_use]
    pub const fn target_pose(&self) -> Vec3 {
        self.target_pose
    }

    /// Body yaw the foot is oriented to.
    #[must_use]
    pub const fn foot_yaw(&self) -> f32 {
        self.tracked_yaw
    }

    /// Absolute body yaw change since the leg last reset its rotation.
    #[must_use]
    pub fn rotation_drift(&self) -> f32 {
        yaw_drift(self.tracked_yaw, self.body_yaw)
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &LegState {
        &self.state
    }

    /// `true` while the foot is planted.
    #[must_use]
    pub const fn is_grounded(&self) -> bool {
        self.state.is_idle()
    }

    /// `true` while a step is in flight.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        self.state.is_moving()
    }

    /// Replaces the tuning. A step already in flight keeps the values it
    /// started with.
    pub fn set_tuning(&mut self, tuning: LegTuning) {
        self.tuning = tuning;
    }

    /// Re-resolves the foot target from the body pose.
    ///
    /// Returns `false` when the probe misses; the previous target is kept.
    /// A moving leg still probes but discards the result, so its target stays
    /// the landing point of the step in flight.
    pub fn update_target_pose<P>(
        &mut self,
        body: &BodyPose,
        velocity: Vec3,
        probe: &P,
        settings: &ProbeSettings,
    ) -> bool
    where
        P: TerrainProbe + ?Sized,
    {
        self.body_yaw = body.yaw();
        let origin = attachment_point(body, self.rest_offset, settings.lift);
        let Some(hit) = resolve_foot_target(probe, origin, settings) else {
            trace!("{} probe missed; keeping target {}", self.name, self.target_pose);
            return false;
        };
        let foot = predict_foot_target(
            probe,
            origin,
            hit,
            velocity,
            self.tuning.velocity_factor,
            settings,
        );
        if self.is_grounded() {
            self.target_pose = foot + Vec3::Y * settings.ground_clearance;
        }
        true
    }

    /// Step necessity in `[0, 1]`. Moving legs report zero.
    #[must_use]
    pub fn urgency(&self) -> f32 {
        if self.is_moving() {
            return 0.0;
        }
        urgency(
            self.old_pose,
            self.target_pose,
            self.rotation_drift(),
            &self.tuning,
        )
    }

    /// `true` when the leg has rested long enough after its last step.
    #[must_use]
    pub fn is_rested(&self) -> bool {
        self.state.is_rested(self.tuning.leg_interval)
    }

    /// Lifts the foot towards the current target.
    ///
    /// Returns `false` and does nothing if the leg is already moving.
    pub fn start_step(&mut self) -> bool {
        if self.is_moving() {
            return false;
        }
        self.old_pose = self.current_pose;
        let step = StepTrajectory::new(
            self.old_pose,
            self.target_pose,
            self.tuning.step_duration,
            self.tuning.step_height,
            self.tuning.curve.clone(),
            self.tuning.blend,
        );
        self.tracked_yaw = self.body_yaw;
        debug!(
            "{} lifts off {} -> {}",
            self.name, self.old_pose, self.target_pose
        );
        self.state = LegState::Moving(step);
        true
    }

    /// Advances the step by `dt`, or the rest clock while planted.
    ///
    /// On completion the foot snaps onto the landing point, which becomes the
    /// new baseline for urgency. Further calls after landing leave the foot
    /// where it is.
    pub fn advance_step(&mut self, dt: f32) -> StepProgress {
        let progress = self.state.advance(dt);
        match progress {
            StepProgress::Idle => {}
            StepProgress::InFlight { .. } => {
                if let Some(step) = self.state.trajectory() {
                    self.current_pose = step.pose();
                }
            }
            StepProgress::Completed { landed_at } => {
                self.current_pose = landed_at;
                self.old_pose = landed_at;
                self.target_pose = landed_at;
                self.tracked_yaw = self.body_yaw;
                debug!("{} landed at {landed_at}", self.name);
            }
        }
        progress
    }

    /// Drops any step in flight and plants the foot where it currently is.
    pub fn reset(&mut self) {
        self.state = LegState::default();
        self.old_pose = self.current_pose;
        self.tracked_yaw = self.body_yaw;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::FlatGround;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn leg() -> Leg {
        Leg::new(
            LegId(0),
            "front_left",
            GroupId(0),
            Vec3::ZERO,
            LegTuning::default(),
            Vec3::ZERO,
            0.0,
        )
    }

    #[rstest]
    #[case(Vec3::ZERO, 0.0, 0.0)]
    #[case(Vec3::new(1.0, 0.0, 0.0), 0.0, 0.5)]
    #[case(Vec3::new(3.0, 0.0, 0.0), 0.0, 1.0)]
    #[case(Vec3::ZERO, 0.35, 0.1)]
    #[case(Vec3::new(f32::NAN, 0.0, 0.0), 0.0, 0.0)]
    fn urgency_blends_and_clamps(#[case] target: Vec3, #[case] drift: f32, #[case] expected: f32) {
        let value = urgency(Vec3::ZERO, target, drift, &LegTuning::default());
        assert_relative_eq!(value, expected, epsilon = 1e-5);
    }

    #[rstest]
    fn body_motion_raises_urgency(mut leg: Leg) {
        let ground = FlatGround::new(0.0);
        let body = BodyPose::at(Vec3::new(1.0, 1.0, 0.0));
        assert!(leg.update_target_pose(&body, Vec3::ZERO, &ground, &ProbeSettings::default()));
        assert_relative_eq!(leg.target_pose().x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(leg.urgency(), 0.5, epsilon = 1e-5);
    }

    #[rstest]
    fn probe_miss_keeps_the_target(mut leg: Leg) {
        let ground = FlatGround::new(5.0);
        let body = BodyPose::at(Vec3::new(1.0, 1.0, 0.0));
        assert!(!leg.update_target_pose(&body, Vec3::ZERO, &ground, &ProbeSettings::default()));
        assert_eq!(leg.target_pose(), Vec3::ZERO);
    }

    #[rstest]
    fn step_plays_back_and_lands(mut leg: Leg) {
        let ground = FlatGround::new(0.0);
        let body = BodyPose::at(Vec3::new(2.0, 1.0, 0.0));
        leg.update_target_pose(&body, Vec3::ZERO, &ground, &ProbeSettings::default());
        assert!(leg.start_step());
        assert!(!leg.start_step());
        assert_relative_eq!(leg.urgency(), 0.0);
        assert_eq!(leg.current_pose(), Vec3::ZERO);

        let mid = leg.advance_step(leg.tuning().step_duration * 0.5);
        assert!(matches!(mid, StepProgress::InFlight { .. }));
        assert!(leg.current_pose().y > 1.0);

        let done = leg.advance_step(1.0);
        assert!(matches!(done, StepProgress::Completed { .. }));
        assert_eq!(leg.current_pose(), leg.target_pose());
        assert_eq!(leg.old_pose(), leg.target_pose());
        for _ in 0..3 {
            assert_eq!(leg.advance_step(1.0), StepProgress::Idle);
            assert_eq!(leg.current_pose(), leg.target_pose());
        }
    }

    #[rstest]
    fn moving_leg_keeps_its_landing_target(mut leg: Leg) {
        let ground = FlatGround::new(0.0);
        let settings = ProbeSettings::default();
        leg.update_target_pose(&BodyPose::at(Vec3::new(2.0, 1.0, 0.0)), Vec3::ZERO, &ground, &settings);
        leg.start_step();
        let landing = leg.target_pose();
        assert!(leg.update_target_pose(
            &BodyPose::at(Vec3::new(5.0, 1.0, 0.0)),
            Vec3::ZERO,
            &ground,
            &settings,
        ));
        assert_eq!(leg.target_pose(), landing);
        assert_eq!(leg.state().trajectory().map(|s| s.to), Some(landing));
        leg.advance_step(1.0);
        assert_eq!(leg.current_pose(), landing);
        assert_eq!(leg.target_pose(), landing);
    }

    #[rstest]
    fn retuning_spares_the_step_in_flight(mut leg: Leg) {
        let ground = FlatGround::new(0.0);
        leg.update_target_pose(
            &BodyPose::at(Vec3::new(2.0, 1.0, 0.0)),
            Vec3::ZERO,
            &ground,
            &ProbeSettings::default(),
        );
        leg.start_step();
        let mut faster = leg.tuning().clone();
        faster.step_duration = 10.0;
        leg.set_tuning(faster);
        let duration = leg.state().trajectory().map(|s| s.duration);
        assert_eq!(duration, Some(LegTuning::default().step_duration));
    }

    #[rstest]
    fn turning_accumulates_drift_until_the_step(mut leg: Leg) {
        let ground = FlatGround::new(0.0);
        let mut body = BodyPose::at(Vec3::Y);
        body.rotation = glam::Quat::from_rotation_y(0.35);
        leg.update_target_pose(&body, Vec3::ZERO, &ground, &ProbeSettings::default());
        assert_relative_eq!(leg.rotation_drift(), 0.35, epsilon = 1e-5);
        assert_relative_eq!(leg.urgency(), 0.1, epsilon = 1e-4);
        leg.start_step();
        assert_relative_eq!(leg.rotation_drift(), 0.0);
        assert_relative_eq!(leg.foot_yaw(), 0.35, epsilon = 1e-5);
    }

    #[rstest]
    fn reset_plants_mid_step(mut leg: Leg) {
        let ground = FlatGround::new(0.0);
        leg.update_target_pose(
            &BodyPose::at(Vec3::new(2.0, 1.0, 0.0)),
            Vec3::ZERO,
            &ground,
            &ProbeSettings::default(),
        );
        leg.start_step();
        leg.advance_step(0.1);
        let airborne = leg.current_pose();
        leg.reset();
        assert!(leg.is_grounded());
        assert_eq!(leg.old_pose(), airborne);
        assert!(leg.is_rested());
    }
}
