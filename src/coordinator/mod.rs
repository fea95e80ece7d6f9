//! The leg coordinator: urgency aggregation, group ranking and admission.
//!
//! One [`LegCoordinator::tick`] runs in a fixed order: every leg re-resolves
//! its target, moving legs advance (landings are collected into the tick's
//! report), urgency is aggregated per group, and only then are the gates
//! evaluated and new steps started. Nothing inside a tick observes a
//! half-updated urgency vector.

mod admission;

use glam::Vec3;
use log::{debug, info, trace, warn};
use serde::Serialize;

pub use admission::{admission_budget, most_urgent_group, select_admissions, AdmissionGate};

use crate::body::{BodyPose, BodySource};
use crate::config::{
    ConfigError, CoordinatorSettings, LocomotionConfig, ProbeSettings, TuningPatch, TuningScope,
};
use crate::leg::{GroupId, Leg, LegId, StepProgress};
use crate::target::attachment_point;
use crate::telemetry::CoordinatorSnapshot;
use crate::terrain::TerrainProbe;

/// Something that happened to a leg during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StepEvent {
    /// The leg was admitted and lifted off.
    Started {
        /// Leg that lifted off.
        leg: LegId,
        /// Liftoff position.
        from: Vec3,
        /// Landing position.
        to: Vec3,
    },
    /// The leg's step timer ran out and the foot touched down.
    Landed {
        /// Leg that landed.
        leg: LegId,
        /// Touchdown position.
        at: Vec3,
    },
}

impl StepEvent {
    /// Leg the event concerns.
    #[must_use]
    pub const fn leg(&self) -> LegId {
        match self {
            Self::Started { leg, .. } | Self::Landed { leg, .. } => *leg,
        }
    }
}

/// Outcome of one coordinator tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickReport {
    /// Landings first, then liftoffs, each in leg order.
    pub events: Vec<StepEvent>,
    /// Group chosen for admission.
    pub most_urgent: Option<GroupId>,
    /// Gate state before any leg was admitted.
    pub gate: AdmissionGate,
    /// Planted legs after admission.
    pub grounded: usize,
    /// Stepping legs after admission.
    pub moving: usize,
}

impl TickReport {
    /// Legs admitted this tick.
    pub fn started(&self) -> impl Iterator<Item = LegId> + '_ {
        self.events.iter().filter_map(|event| match event {
            StepEvent::Started { leg, .. } => Some(*leg),
            StepEvent::Landed { .. } => None,
        })
    }

    /// Legs that touched down this tick.
    pub fn landed(&self) -> impl Iterator<Item = LegId> + '_ {
        self.events.iter().filter_map(|event| match event {
            StepEvent::Landed { leg, .. } => Some(*leg),
            StepEvent::Started { .. } => None,
        })
    }
}

/// Owns the legs of one rig and decides which of them step.
#[derive(Debug, Clone)]
pub struct LegCoordinator {
    groups: Vec<String>,
    legs: Vec<Leg>,
    settings: CoordinatorSettings,
    probe: ProbeSettings,
    leg_urgency: Vec<f32>,
    group_urgency: Vec<f32>,
    most_urgent: Option<GroupId>,
    gate: AdmissionGate,
    ticks: u64,
}

impl LegCoordinator {
    /// Validates `config` and plants every foot under `body`.
    ///
    /// Each foot is probed straight down with the initial probe distance; a
    /// miss plants the foot at its attachment point.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found by
    /// [`LocomotionConfig::validate`].
    pub fn new<P>(config: &LocomotionConfig, body: &BodyPose, probe: &P) -> Result<Self, ConfigError>
    where
        P: TerrainProbe + ?Sized,
    {
        config.validate()?;
        let settings = config.probe;
        let yaw = body.yaw();
        let mut legs = Vec::with_capacity(config.legs.len());
        for (index, spec) in config.legs.iter().enumerate() {
            let group = config
                .group_index(&spec.group)
                .map(GroupId)
                .ok_or_else(|| ConfigError::UnknownGroup {
                    leg: spec.name.clone(),
                    group: spec.group.clone(),
                })?;
            let origin = attachment_point(body, spec.rest_offset, settings.lift);
            let planted = match probe.probe(origin, Vec3::NEG_Y, settings.initial_distance, settings.mask) {
                Some(hit) => hit.point + Vec3::Y * settings.ground_clearance,
                None => {
                    warn!("{} found no ground below {origin}; planting in place", spec.name);
                    origin
                }
            };
            legs.push(Leg::new(
                LegId(index),
                spec.name.clone(),
                group,
                spec.rest_offset,
                config.tuning_for(spec),
                planted,
                yaw,
            ));
        }
        info!(
            "coordinator ready: {} legs in {} groups, at most {} moving, at least {} grounded",
            legs.len(),
            config.groups.len(),
            config.coordinator.max_concurrent_moves,
            config.coordinator.min_grounded_legs
        );
        let leg_count = legs.len();
        let group_count = config.groups.len();
        Ok(Self {
            groups: config.groups.clone(),
            legs,
            settings: config.coordinator,
            probe: settings,
            leg_urgency: vec![0.0; leg_count],
            group_urgency: vec![0.0; group_count],
            most_urgent: None,
            gate: AdmissionGate::Open { budget: 0 },
            ticks: 0,
        })
    }

    /// Runs one fixed-step update.
    pub fn tick<B, P>(&mut self, body: &B, probe: &P, dt: f32) -> TickReport
    where
        B: BodySource + ?Sized,
        P: TerrainProbe + ?Sized,
    {
        self.ticks += 1;
        let pose = body.pose();
        let velocity = body.velocity();
        let mut events = Vec::new();

        for leg in &mut self.legs {
            leg.update_target_pose(&pose, velocity, probe, &self.probe);
        }
        for leg in &mut self.legs {
            if let StepProgress::Completed { landed_at } = leg.advance_step(dt) {
                events.push(StepEvent::Landed {
                    leg: leg.id(),
                    at: landed_at,
                });
            }
        }

        self.refresh_urgency();
        self.most_urgent = most_urgent_group(&self.group_urgency);

        let moving = self.moving_count();
        let grounded = self.legs.len() - moving;
        self.gate = AdmissionGate::evaluate(grounded, moving, &self.settings);
        trace!(
            "tick {}: groups {:?}, gate {}",
            self.ticks,
            self.group_urgency,
            self.gate
        );

        if let Some(group) = self.most_urgent {
            let admitted = select_admissions(
                &self.legs,
                &self.leg_urgency,
                group,
                self.gate.budget(),
                &self.settings,
            );
            for id in admitted {
                let Some(leg) = self.legs.get_mut(id.0) else {
                    continue;
                };
                let from = leg.current_pose();
                if leg.start_step() {
                    events.push(StepEvent::Started {
                        leg: id,
                        from,
                        to: leg.target_pose(),
                    });
                }
            }
        }

        let moving = self.moving_count();
        TickReport {
            events,
            most_urgent: self.most_urgent,
            gate: self.gate,
            grounded: self.legs.len() - moving,
            moving,
        }
    }

    fn refresh_urgency(&mut self) {
        self.group_urgency.iter_mut().for_each(|u| *u = 0.0);
        for (leg, slot) in self.legs.iter().zip(self.leg_urgency.iter_mut()) {
            *slot = leg.urgency();
            if let Some(total) = self.group_urgency.get_mut(leg.group().0) {
                *total += *slot;
            }
        }
    }

    /// Applies `patch` to the legs selected by `scope`.
    ///
    /// The change is all-or-nothing. Steps already in flight finish with the
    /// values they started with. Returns the number of legs updated.
    ///
    /// # Errors
    /// Returns [`ConfigError::NoSuchGroup`] or [`ConfigError::NoSuchLeg`] for
    /// an unknown scope and the tunable error for an out-of-range value.
    pub fn apply_tuning(&mut self, scope: &TuningScope, patch: &TuningPatch) -> Result<usize, ConfigError> {
        let selected: Vec<usize> = match scope {
            TuningScope::All => (0..self.legs.len()).collect(),
            TuningScope::Group(name) => {
                let group = self
                    .group_id(name)
                    .ok_or_else(|| ConfigError::NoSuchGroup(name.clone()))?;
                self.legs
                    .iter()
                    .enumerate()
                    .filter(|(_, leg)| leg.group() == group)
                    .map(|(index, _)| index)
                    .collect()
            }
            TuningScope::Leg(name) => {
                let leg = self
                    .leg_by_name(name)
                    .ok_or_else(|| ConfigError::NoSuchLeg(name.clone()))?;
                vec![leg.id().0]
            }
        };
        let mut staged = Vec::with_capacity(selected.len());
        for index in selected {
            let Some(leg) = self.legs.get(index) else {
                continue;
            };
            let tuning = leg.tuning().patched(patch);
            tuning.validate(leg.name())?;
            staged.push((index, tuning));
        }
        let count = staged.len();
        for (index, tuning) in staged {
            if let Some(leg) = self.legs.get_mut(index) {
                leg.set_tuning(tuning);
            }
        }
        debug!("retuned {count} leg(s) in scope {scope:?}");
        Ok(count)
    }

    /// Replaces the rig-wide limits.
    ///
    /// # Errors
    /// Rejects limits that would starve the rig, as at construction.
    pub fn apply_settings(&mut self, settings: CoordinatorSettings) -> Result<(), ConfigError> {
        settings.validate(self.legs.len())?;
        self.settings = settings;
        debug!("coordinator limits now {settings:?}");
        Ok(())
    }

    /// Drops every step in flight and plants all feet where they are.
    pub fn reset_legs(&mut self) {
        for leg in &mut self.legs {
            leg.reset();
        }
        self.refresh_urgency();
        debug!("all legs reset");
    }

    /// Read-only view of the rig for telemetry.
    #[must_use]
    pub fn snapshot(&self) -> CoordinatorSnapshot {
        CoordinatorSnapshot::capture(self)
    }

    /// Legs in declaration order.
    #[must_use]
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Leg by declaration index.
    #[must_use]
    pub fn leg(&self, id: LegId) -> Option<&Leg> {
        self.legs.get(id.0)
    }

    /// Leg by name.
    #[must_use]
    pub fn leg_by_name(&self, name: &str) -> Option<&Leg> {
        self.legs.iter().find(|leg| leg.name() == name)
    }

    /// Group names in declaration order.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Group index for `name`.
    #[must_use]
    pub fn group_id(&self, name: &str) -> Option<GroupId> {
        self.groups.iter().position(|g| g == name).map(GroupId)
    }

    /// Group name for `id`.
    #[must_use]
    pub fn group_name(&self, id: GroupId) -> Option<&str> {
        self.groups.get(id.0).map(String::as_str)
    }

    /// Aggregate urgency per group as of the last tick.
    #[must_use]
    pub fn group_urgency(&self) -> &[f32] {
        &self.group_urgency
    }

    /// Per-leg urgency as of the last tick.
    #[must_use]
    pub fn leg_urgency(&self) -> &[f32] {
        &self.leg_urgency
    }

    /// Group chosen on the last tick.
    #[must_use]
    pub const fn most_urgent(&self) -> Option<GroupId> {
        self.most_urgent
    }

    /// Gate state on the last tick.
    #[must_use]
    pub const fn gate(&self) -> AdmissionGate {
        self.gate
    }

    /// Legs currently planted.
    #[must_use]
    pub fn grounded_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_grounded()).count()
    }

    /// Legs currently stepping.
    #[must_use]
    pub fn moving_count(&self) -> usize {
        self.legs.iter().filter(|leg| leg.is_moving()).count()
    }

    /// Rig-wide limits.
    #[must_use]
    pub const fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Foot ray settings.
    #[must_use]
    pub const fn probe_settings(&self) -> &ProbeSettings {
        &self.probe
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyState;
    use crate::config::LegSpec;
    use crate::terrain::FlatGround;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    const DT: f32 = 1.0 / 60.0;

    fn quad_config() -> LocomotionConfig {
        let mut config = LocomotionConfig {
            groups: vec!["diag_a".to_owned(), "diag_b".to_owned()],
            legs: vec![
                LegSpec::new("fl", "diag_a", Vec3::new(-1.0, 0.0, 1.0)),
                LegSpec::new("fr", "diag_b", Vec3::new(1.0, 0.0, 1.0)),
                LegSpec::new("rl", "diag_b", Vec3::new(-1.0, 0.0, -1.0)),
                LegSpec::new("rr", "diag_a", Vec3::new(1.0, 0.0, -1.0)),
            ],
            ..LocomotionConfig::default()
        };
        config.coordinator.min_grounded_legs = 2;
        config
    }

    #[fixture]
    fn coordinator() -> LegCoordinator {
        LegCoordinator::new(&quad_config(), &BodyPose::at(Vec3::Y), &FlatGround::new(0.0))
            .expect("valid quad")
    }

    #[rstest]
    fn feet_start_planted_on_the_ground(coordinator: LegCoordinator) {
        for leg in coordinator.legs() {
            assert_relative_eq!(leg.current_pose().y, 0.0);
            assert_eq!(leg.old_pose(), leg.current_pose());
        }
    }

    #[rstest]
    fn initial_miss_plants_at_the_attachment_point() {
        let coordinator = LegCoordinator::new(
            &quad_config(),
            &BodyPose::at(Vec3::Y),
            &FlatGround::new(100.0),
        )
        .expect("misses are not fatal");
        let fl = coordinator.leg_by_name("fl").expect("declared");
        assert_eq!(fl.current_pose(), Vec3::new(-1.0, 1.5, 1.0));
    }

    #[rstest]
    fn invalid_config_refuses_to_start() {
        let mut config = quad_config();
        config.coordinator.min_grounded_legs = 4;
        let result = LegCoordinator::new(&config, &BodyPose::default(), &FlatGround::new(0.0));
        assert!(matches!(result, Err(ConfigError::Starvation { legs: 4, .. })));
    }

    #[rstest]
    fn standing_still_admits_nothing(mut coordinator: LegCoordinator) {
        let body = BodyState::at(Vec3::Y);
        let report = coordinator.tick(&body, &FlatGround::new(0.0), DT);
        assert!(report.events.is_empty());
        assert_eq!(report.most_urgent, Some(GroupId(0)));
        assert_eq!(report.grounded, 4);
    }

    #[rstest]
    fn displaced_body_steps_the_first_group(mut coordinator: LegCoordinator) {
        let body = BodyState::at(Vec3::new(0.0, 1.0, 3.0));
        let report = coordinator.tick(&body, &FlatGround::new(0.0), DT);
        let started: Vec<_> = report.started().collect();
        assert_eq!(started, vec![LegId(0), LegId(3)]);
        assert_eq!(report.moving, 2);
        assert_eq!(report.grounded + report.moving, 4);
        assert_relative_eq!(coordinator.group_urgency().iter().sum::<f32>(), 4.0);
    }

    #[rstest]
    fn steps_land_and_release_their_slots(mut coordinator: LegCoordinator) {
        let body = BodyState::at(Vec3::new(0.0, 1.0, 3.0));
        let ground = FlatGround::new(0.0);
        coordinator.tick(&body, &ground, DT);
        let mut landed = Vec::new();
        for _ in 0..120 {
            let report = coordinator.tick(&body, &ground, DT);
            landed.extend(report.landed());
        }
        assert_eq!(landed.len(), 4);
        assert_eq!(coordinator.moving_count(), 0);
        for leg in coordinator.legs() {
            assert_relative_eq!(leg.urgency(), 0.0, epsilon = 1e-5);
        }
    }

    #[rstest]
    fn tuning_scopes_select_legs(mut coordinator: LegCoordinator) {
        let patch = TuningPatch {
            step_height: Some(0.5),
            ..TuningPatch::default()
        };
        assert_eq!(
            coordinator.apply_tuning(&TuningScope::Group("diag_b".to_owned()), &patch).ok(),
            Some(2)
        );
        assert_eq!(coordinator.apply_tuning(&TuningScope::All, &patch).ok(), Some(4));
        assert_eq!(
            coordinator.apply_tuning(&TuningScope::Leg("fl".to_owned()), &patch).ok(),
            Some(1)
        );
        assert!(matches!(
            coordinator.apply_tuning(&TuningScope::Leg("nope".to_owned()), &patch),
            Err(ConfigError::NoSuchLeg(_))
        ));
    }

    #[rstest]
    fn rejected_tuning_changes_nothing(mut coordinator: LegCoordinator) {
        let patch = TuningPatch {
            step_duration: Some(0.0),
            ..TuningPatch::default()
        };
        assert!(coordinator.apply_tuning(&TuningScope::All, &patch).is_err());
        for leg in coordinator.legs() {
            assert_relative_eq!(leg.tuning().step_duration, crate::constants::STEP_DURATION);
        }
    }

    #[rstest]
    fn settings_are_revalidated(mut coordinator: LegCoordinator) {
        let mut settings = *coordinator.settings();
        settings.min_grounded_legs = 4;
        assert!(coordinator.apply_settings(settings).is_err());
        settings.min_grounded_legs = 1;
        assert!(coordinator.apply_settings(settings).is_ok());
        assert_eq!(coordinator.settings().min_grounded_legs, 1);
    }

    #[rstest]
    fn reset_grounds_every_leg(mut coordinator: LegCoordinator) {
        coordinator.tick(&BodyState::at(Vec3::new(0.0, 1.0, 3.0)), &FlatGround::new(0.0), DT);
        assert!(coordinator.moving_count() > 0);
        coordinator.reset_legs();
        assert_eq!(coordinator.moving_count(), 0);
        assert_eq!(coordinator.grounded_count(), 4);
    }
}
