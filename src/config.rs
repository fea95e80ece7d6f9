//! Rig configuration: groups, legs, tunables and coordinator limits.
//!
//! A [`LocomotionConfig`] is validated once before a
//! [`LegCoordinator`](crate::coordinator::LegCoordinator) is built from it.
//! Misconfiguration is the only fatal error in the crate; everything that can
//! go wrong at runtime degrades to a leg staying put.

use std::path::{Path, PathBuf};

use glam::Vec3;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    INITIAL_PROBE_DISTANCE, LEG_INTERVAL, LEG_SENSITIVITY, MAX_CONCURRENT_MOVES, MAX_ROTATION,
    MIN_GROUNDED_LEGS, PROBE_DISTANCE, PROBE_LIFT, ROTATION_WEIGHT, STEP_DISTANCE, STEP_DURATION,
    STEP_HEIGHT, VELOCITY_FACTOR,
};
use crate::curve::{HorizontalBlend, StepCurve};
use crate::terrain::LayerMask;

/// Errors raised while loading or validating a rig configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No leg groups were declared.
    #[error("no leg groups declared")]
    NoGroups,
    /// No legs were declared.
    #[error("no legs declared")]
    NoLegs,
    /// A group name appears twice.
    #[error("group `{0}` is declared more than once")]
    DuplicateGroup(String),
    /// A leg name appears twice.
    #[error("leg `{0}` is declared more than once")]
    DuplicateLeg(String),
    /// A leg references a group that was never declared.
    #[error("leg `{leg}` references unknown group `{group}`")]
    UnknownGroup {
        /// Offending leg.
        leg: String,
        /// Group it asked for.
        group: String,
    },
    /// A tuning scope names a group that does not exist.
    #[error("no group named `{0}`")]
    NoSuchGroup(String),
    /// A tuning scope names a leg that does not exist.
    #[error("no leg named `{0}`")]
    NoSuchLeg(String),
    /// The stability floor can never be met while stepping.
    #[error("min_grounded_legs ({min_grounded}) must be below the leg count ({legs})")]
    Starvation {
        /// Configured minimum.
        min_grounded: usize,
        /// Number of legs on the rig.
        legs: usize,
    },
    /// A concurrency cap of zero would stop every leg forever.
    #[error("max_concurrent_moves must be at least 1")]
    NoConcurrency,
    /// A tunable is outside its accepted range.
    #[error("{owner}: {field} = {value} is out of range")]
    InvalidTunable {
        /// Leg, group or section the value belongs to.
        owner: String,
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// An authored step curve is malformed.
    #[error("{owner}: invalid step curve: {reason}")]
    InvalidCurve {
        /// Leg or section the curve belongs to.
        owner: String,
        /// What is wrong with it.
        reason: String,
    },
    /// The configuration could not be parsed.
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// The configuration file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

/// Per-leg stepping parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegTuning {
    /// Foot-to-target distance that saturates positional urgency.
    pub step_distance: f32,
    /// Seconds a step takes.
    pub step_duration: f32,
    /// Peak lift of the step arc.
    pub step_height: f32,
    /// Rest time after touchdown before the leg may step again.
    pub leg_interval: f32,
    /// Yaw drift, in radians, that saturates rotational urgency.
    pub max_rotation: f32,
    /// Seconds of horizontal body travel the foot target leads by.
    pub velocity_factor: f32,
    /// Weight of rotational urgency relative to positional urgency.
    pub rotation_weight: f32,
    /// Vertical lift profile.
    pub curve: StepCurve,
    /// Horizontal easing.
    pub blend: HorizontalBlend,
}

impl Default for LegTuning {
    fn default() -> Self {
        Self {
            step_distance: STEP_DISTANCE,
            step_duration: STEP_DURATION,
            step_height: STEP_HEIGHT,
            leg_interval: LEG_INTERVAL,
            max_rotation: MAX_ROTATION,
            velocity_factor: VELOCITY_FACTOR,
            rotation_weight: ROTATION_WEIGHT,
            curve: StepCurve::default(),
            blend: HorizontalBlend::default(),
        }
    }
}

impl LegTuning {
    /// Returns a copy with every field set in `patch` replaced.
    #[must_use]
    pub fn patched(&self, patch: &TuningPatch) -> Self {
        Self {
            step_distance: patch.step_distance.unwrap_or(self.step_distance),
            step_duration: patch.step_duration.unwrap_or(self.step_duration),
            step_height: patch.step_height.unwrap_or(self.step_height),
            leg_interval: patch.leg_interval.unwrap_or(self.leg_interval),
            max_rotation: patch.max_rotation.unwrap_or(self.max_rotation),
            velocity_factor: patch.velocity_factor.unwrap_or(self.velocity_factor),
            rotation_weight: patch.rotation_weight.unwrap_or(self.rotation_weight),
            curve: patch.curve.clone().unwrap_or_else(|| self.curve.clone()),
            blend: patch.blend.unwrap_or(self.blend),
        }
    }

    /// Checks every field against its accepted range.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidTunable`] or [`ConfigError::InvalidCurve`]
    /// naming `owner`.
    pub fn validate(&self, owner: &str) -> Result<(), ConfigError> {
        positive(owner, "step_distance", self.step_distance)?;
        positive(owner, "step_duration", self.step_duration)?;
        non_negative(owner, "step_height", self.step_height)?;
        non_negative(owner, "leg_interval", self.leg_interval)?;
        positive(owner, "max_rotation", self.max_rotation)?;
        non_negative(owner, "velocity_factor", self.velocity_factor)?;
        non_negative(owner, "rotation_weight", self.rotation_weight)?;
        self.curve
            .validate()
            .map_err(|reason| ConfigError::InvalidCurve {
                owner: owner.to_owned(),
                reason,
            })
    }
}

/// Partial update to [`LegTuning`]; unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningPatch {
    /// New step distance.
    pub step_distance: Option<f32>,
    /// New step duration.
    pub step_duration: Option<f32>,
    /// New arc height.
    pub step_height: Option<f32>,
    /// New rest time.
    pub leg_interval: Option<f32>,
    /// New rotation threshold.
    pub max_rotation: Option<f32>,
    /// New velocity lead.
    pub velocity_factor: Option<f32>,
    /// New rotation weight.
    pub rotation_weight: Option<f32>,
    /// New lift profile.
    pub curve: Option<StepCurve>,
    /// New horizontal easing.
    pub blend: Option<HorizontalBlend>,
}

impl TuningPatch {
    /// `true` when the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Legs a live tuning change applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuningScope {
    /// Every leg on the rig.
    All,
    /// Every leg in the named group.
    Group(String),
    /// A single leg.
    Leg(String),
}

/// Order in which eligible legs of the chosen group are admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionOrder {
    /// Legs are admitted in the order they were declared.
    #[default]
    Declaration,
    /// The most urgent legs are admitted first; ties keep declaration order.
    UrgencyDescending,
}

/// Limits enforced by the coordinator across the whole rig.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    /// Upper bound on legs stepping at once.
    pub max_concurrent_moves: usize,
    /// Legs that must stay planted after any admission.
    pub min_grounded_legs: usize,
    /// Urgency a leg must reach to be admitted, in `(0, 1]`.
    pub sensitivity: f32,
    /// Admission order within the chosen group.
    pub admission_order: AdmissionOrder,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            max_concurrent_moves: MAX_CONCURRENT_MOVES,
            min_grounded_legs: MIN_GROUNDED_LEGS,
            sensitivity: LEG_SENSITIVITY,
            admission_order: AdmissionOrder::default(),
        }
    }
}

impl CoordinatorSettings {
    /// Checks the limits against a rig with `legs` legs.
    ///
    /// # Errors
    /// Rejects a zero concurrency cap, a stability floor the rig can never
    /// satisfy while stepping and a sensitivity outside `(0, 1]`.
    pub fn validate(&self, legs: usize) -> Result<(), ConfigError> {
        if self.max_concurrent_moves == 0 {
            return Err(ConfigError::NoConcurrency);
        }
        if legs > 0 && self.min_grounded_legs >= legs {
            return Err(ConfigError::Starvation {
                min_grounded: self.min_grounded_legs,
                legs,
            });
        }
        if !(self.sensitivity > 0.0 && self.sensitivity <= 1.0) {
            return Err(ConfigError::InvalidTunable {
                owner: "coordinator".to_owned(),
                field: "sensitivity",
                value: self.sensitivity,
            });
        }
        Ok(())
    }
}

/// How foot rays are cast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Height above the body origin the foot rays start from.
    pub lift: f32,
    /// Reach of the per-tick foot ray.
    pub distance: f32,
    /// Reach of the ray used to plant feet when the rig is built.
    pub initial_distance: f32,
    /// Layers the feet may stand on.
    pub mask: LayerMask,
    /// Height the foot is kept above the hit point.
    pub ground_clearance: f32,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            lift: PROBE_LIFT,
            distance: PROBE_DISTANCE,
            initial_distance: INITIAL_PROBE_DISTANCE,
            mask: LayerMask::TERRAIN,
            ground_clearance: 0.0,
        }
    }
}

impl ProbeSettings {
    /// Checks ray reach and clearance.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidTunable`] for a non-positive reach, a
    /// negative clearance or a non-finite lift.
    pub fn validate(&self) -> Result<(), ConfigError> {
        const OWNER: &str = "probe";
        if !self.lift.is_finite() {
            return Err(invalid(OWNER, "lift", self.lift));
        }
        positive(OWNER, "distance", self.distance)?;
        positive(OWNER, "initial_distance", self.initial_distance)?;
        non_negative(OWNER, "ground_clearance", self.ground_clearance)
    }
}

/// One limb on the rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegSpec {
    /// Unique leg name.
    pub name: String,
    /// Group the leg steps with.
    pub group: String,
    /// Attachment point relative to the body, in body space.
    pub rest_offset: Vec3,
    /// Per-leg overrides on top of the shared tuning.
    #[serde(default)]
    pub overrides: TuningPatch,
}

impl LegSpec {
    /// Leg with no tuning overrides.
    pub fn new(name: impl Into<String>, group: impl Into<String>, rest_offset: Vec3) -> Self {
        Self {
            name: name.into(),
            group: group.into(),
            rest_offset,
            overrides: TuningPatch::default(),
        }
    }
}

/// Complete description of a legged rig.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Group names in declaration order. Ties between groups go to the
    /// earliest one.
    pub groups: Vec<String>,
    /// Legs in declaration order.
    pub legs: Vec<LegSpec>,
    /// Tuning shared by every leg unless overridden.
    pub tuning: LegTuning,
    /// Rig-wide limits.
    pub coordinator: CoordinatorSettings,
    /// Foot ray settings.
    pub probe: ProbeSettings,
}

impl LocomotionConfig {
    /// Six legs in two alternating tripods.
    #[must_use]
    pub fn hexapod() -> Self {
        let sides = [("left", -1.5_f32), ("right", 1.5)];
        let rows = [("front", 1.5_f32), ("middle", 0.0), ("rear", -1.5)];
        let mut legs = Vec::with_capacity(6);
        for (row_index, (row, z)) in rows.into_iter().enumerate() {
            for (side_index, (side, x)) in sides.into_iter().enumerate() {
                let group = if (row_index + side_index) % 2 == 0 {
                    "tripod_a"
                } else {
                    "tripod_b"
                };
                legs.push(LegSpec::new(format!("{row}_{side}"), group, Vec3::new(x, 0.0, z)));
            }
        }
        Self {
            groups: vec!["tripod_a".to_owned(), "tripod_b".to_owned()],
            legs,
            ..Self::default()
        }
    }

    /// Parses a JSON configuration.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on malformed input. The result is not
    /// validated.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Index of `group` in declaration order.
    #[must_use]
    pub fn group_index(&self, group: &str) -> Option<usize> {
        self.groups.iter().position(|g| g == group)
    }

    /// Effective tuning for `leg`.
    #[must_use]
    pub fn tuning_for(&self, leg: &LegSpec) -> LegTuning {
        self.tuning.patched(&leg.overrides)
    }

    /// Checks the whole configuration.
    ///
    /// # Errors
    /// Returns the first inconsistency found: missing or duplicate names,
    /// legs bound to unknown groups, out-of-range tunables and limits that
    /// would starve the rig.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.groups.is_empty() {
            return Err(ConfigError::NoGroups);
        }
        if self.legs.is_empty() {
            return Err(ConfigError::NoLegs);
        }
        let mut seen = HashSet::with_capacity(self.groups.len());
        if let Some(dup) = self.groups.iter().find(|g| !seen.insert(g.as_str())) {
            return Err(ConfigError::DuplicateGroup(dup.clone()));
        }
        let mut seen = HashSet::with_capacity(self.legs.len());
        for leg in &self.legs {
            if !seen.insert(leg.name.as_str()) {
                return Err(ConfigError::DuplicateLeg(leg.name.clone()));
            }
            if self.group_index(&leg.group).is_none() {
                return Err(ConfigError::UnknownGroup {
                    leg: leg.name.clone(),
                    group: leg.group.clone(),
                });
            }
            if !leg.rest_offset.is_finite() {
                return Err(invalid(&leg.name, "rest_offset", f32::NAN));
            }
            self.tuning_for(leg).validate(&leg.name)?;
        }
        self.tuning.validate("tuning")?;
        self.probe.validate()?;
        self.coordinator.validate(self.legs.len())
    }
}

fn invalid(owner: &str, field: &'static str, value: f32) -> ConfigError {
    ConfigError::InvalidTunable {
        owner: owner.to_owned(),
        field,
        value,
    }
}

fn positive(owner: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(owner, field, value))
    }
}

fn non_negative(owner: &str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(owner, field, value))
    }
}
