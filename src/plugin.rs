//! Bevy plugin driving leg rigs from the fixed-step schedule.
//!
//! Each entity carrying a [`LegRig`] and a [`Transform`] is one body. The
//! body's transform and optional [`BodyVelocity`] feed the rig's coordinator
//! every `FixedUpdate`, and the resulting foot poses are copied onto the
//! [`FootOf`] entities spawned for the rig.

use std::fmt;

use bevy::prelude::*;
use bevy_app::{App, FixedUpdate, Plugin, Update};
use bevy_ecs::prelude::On;
use bevy_math::Quat;
use bevy_transform::components::Transform;
use log::error;
use thiserror::Error;

use crate::body::{BodyPose, BodyState};
use crate::config::{ConfigError, LocomotionConfig, TuningPatch, TuningScope};
use crate::coordinator::{LegCoordinator, TickReport};
use crate::leg::{Leg, LegId};
use crate::terrain::TerrainProbe;

/// Coordinator attached to a body entity.
#[derive(Component, Debug)]
pub struct LegRig {
    coordinator: LegCoordinator,
    last_report: Option<TickReport>,
}

impl LegRig {
    /// Wraps an existing coordinator.
    #[must_use]
    pub const fn new(coordinator: LegCoordinator) -> Self {
        Self {
            coordinator,
            last_report: None,
        }
    }

    /// Builds a coordinator for a body currently at `transform`.
    ///
    /// # Errors
    /// Returns the [`ConfigError`] raised by [`LegCoordinator::new`].
    pub fn build<P>(
        config: &LocomotionConfig,
        transform: &Transform,
        probe: &P,
    ) -> Result<Self, ConfigError>
    where
        P: TerrainProbe + ?Sized,
    {
        LegCoordinator::new(config, &body_pose(transform), probe).map(Self::new)
    }

    /// The wrapped coordinator.
    #[must_use]
    pub const fn coordinator(&self) -> &LegCoordinator {
        &self.coordinator
    }

    /// Mutable access for settings changes and resets.
    pub fn coordinator_mut(&mut self) -> &mut LegCoordinator {
        &mut self.coordinator
    }

    /// Report from the most recent fixed tick.
    #[must_use]
    pub const fn last_report(&self) -> Option<&TickReport> {
        self.last_report.as_ref()
    }
}

/// Linear velocity of a rig's body. Missing means stationary.
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyVelocity(pub Vec3);

/// Marks an entity as the foot of leg `leg` on rig `rig`.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FootOf {
    /// Body entity owning the [`LegRig`].
    pub rig: Entity,
    /// Declaration index of the leg.
    pub leg: usize,
}

/// Terrain every rig probes against.
#[derive(Resource)]
pub struct Terrain(pub Box<dyn TerrainProbe + Send + Sync>);

impl Terrain {
    /// Boxes `probe` as the shared terrain.
    pub fn new(probe: impl TerrainProbe + Send + Sync + 'static) -> Self {
        Self(Box::new(probe))
    }
}

impl fmt::Debug for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Terrain(..)")
    }
}

/// Live tuning request for one rig.
#[derive(Event, Debug, Clone)]
pub struct ApplyRigTuning {
    /// Body entity owning the [`LegRig`].
    pub rig: Entity,
    /// Legs to change.
    pub scope: TuningScope,
    /// Values to change.
    pub patch: TuningPatch,
}

/// Context carried by [`LocomotionError`] events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocomotionErrorContext {
    /// No [`Terrain`] resource exists, so rigs cannot probe.
    MissingTerrain,
    /// A request named an entity without a [`LegRig`].
    UnknownRig,
    /// A tuning request was rejected.
    Tuning,
}

/// Event raised when the locomotion layer rejects a request or cannot run.
///
/// An observer logs every occurrence so failures remain visible without a
/// bevy log backend.
#[derive(Event, Debug, Clone, Error)]
#[error("{context:?}: {detail}")]
pub struct LocomotionError {
    /// What was being attempted.
    pub context: LocomotionErrorContext,
    /// Description of the underlying error.
    pub detail: String,
}

impl LocomotionError {
    /// Convenience constructor used by systems and observers.
    pub fn new(context: LocomotionErrorContext, detail: impl Into<String>) -> Self {
        Self {
            context,
            detail: detail.into(),
        }
    }
}

/// Pose of a body entity.
#[must_use]
pub const fn body_pose(transform: &Transform) -> BodyPose {
    BodyPose {
        position: transform.translation,
        rotation: transform.rotation,
    }
}

fn foot_transform(leg: &Leg) -> Transform {
    Transform::from_translation(leg.current_pose())
        .with_rotation(Quat::from_rotation_y(leg.foot_yaw()))
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value."
)]
fn log_locomotion_error(event: On<LocomotionError>) {
    let LocomotionError { context, detail } = event.event();
    error!("locomotion error during {context:?}: {detail}");
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Observer systems must accept On<T> by value."
)]
fn apply_rig_tuning(
    event: On<ApplyRigTuning>,
    mut rigs: Query<&mut LegRig>,
    mut commands: Commands,
) {
    let ApplyRigTuning { rig, scope, patch } = event.event();
    let Ok(mut leg_rig) = rigs.get_mut(*rig) else {
        commands.trigger(LocomotionError::new(
            LocomotionErrorContext::UnknownRig,
            format!("{rig:?} has no LegRig"),
        ));
        return;
    };
    if let Err(e) = leg_rig.coordinator.apply_tuning(scope, patch) {
        commands.trigger(LocomotionError::new(
            LocomotionErrorContext::Tuning,
            e.to_string(),
        ));
    }
}

/// Spawns one [`FootOf`] entity per leg for newly added rigs.
pub fn attach_feet_system(mut commands: Commands, rigs: Query<(Entity, &LegRig), Added<LegRig>>) {
    for (entity, rig) in &rigs {
        for leg in rig.coordinator.legs() {
            commands.spawn((
                FootOf {
                    rig: entity,
                    leg: leg.id().0,
                },
                foot_transform(leg),
                Name::new(leg.name().to_owned()),
            ));
        }
    }
}

/// Advances every rig by one fixed timestep.
///
/// Without a [`Terrain`] resource the rigs stay frozen and a single
/// [`LocomotionError`] is raised.
#[expect(
    clippy::needless_pass_by_value,
    reason = "Bevy system parameters use `Res<T>` by value."
)]
pub fn tick_rigs_system(
    time: Res<Time<Fixed>>,
    terrain: Option<Res<Terrain>>,
    mut rigs: Query<(&Transform, Option<&BodyVelocity>, &mut LegRig)>,
    mut commands: Commands,
    mut reported: Local<bool>,
) {
    let Some(terrain) = terrain else {
        if !*reported {
            *reported = true;
            commands.trigger(LocomotionError::new(
                LocomotionErrorContext::MissingTerrain,
                "no Terrain resource; rigs are frozen",
            ));
        }
        return;
    };
    let dt = time.timestep().as_secs_f32();
    for (transform, velocity, mut rig) in &mut rigs {
        let body = BodyState {
            pose: body_pose(transform),
            velocity: velocity.map_or(Vec3::ZERO, |v| v.0),
        };
        let report = rig.coordinator.tick(&body, terrain.0.as_ref(), dt);
        rig.last_report = Some(report);
    }
}

/// Copies foot poses from rigs onto their [`FootOf`] entities.
pub fn sync_feet_system(
    rigs: Query<&LegRig>,
    mut feet: Query<(&FootOf, &mut Transform), Without<LegRig>>,
) {
    for (foot, mut transform) in &mut feet {
        let Ok(rig) = rigs.get(foot.rig) else {
            continue;
        };
        if let Some(leg) = rig.coordinator.leg(LegId(foot.leg)) {
            *transform = foot_transform(leg);
        }
    }
}

/// Installs the rig systems and observers.
#[derive(Default)]
pub struct LocomotionPlugin;

impl Plugin for LocomotionPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(log_locomotion_error);
        app.add_observer(apply_rig_tuning);
        app.add_systems(Update, attach_feet_system);
        app.add_systems(FixedUpdate, (tick_rigs_system, sync_feet_system).chain());
    }
}
