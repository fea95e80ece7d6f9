#![cfg_attr(docsrs, feature(doc_cfg))]
//! Procedural multi-leg locomotion.
//!
//! Each leg decides how urgently it needs to step and where its foot should
//! land; a [`LegCoordinator`] admits steps group by group without breaking
//! its concurrency cap or leaving too few feet planted. Terrain and body
//! motion are supplied from outside through [`TerrainProbe`] and
//! [`BodySource`].
pub mod body;
pub mod config;
pub mod constants;
pub mod coordinator;
pub mod curve;
pub mod leg;
pub mod logging;
pub mod plugin;
pub mod step;
pub mod target;
pub mod telemetry;
pub mod terrain;
pub use constants::*;

// Re-export commonly used items
pub use body::{BodyPose, BodySource, BodyState};
pub use config::{
    AdmissionOrder, ConfigError, CoordinatorSettings, LegSpec, LegTuning, LocomotionConfig,
    ProbeSettings, TuningPatch, TuningScope,
};
pub use coordinator::{AdmissionGate, LegCoordinator, StepEvent, TickReport};
pub use curve::{HorizontalBlend, Keyframe, StepCurve};
pub use leg::{GroupId, Leg, LegId, LegState, StepProgress};
pub use logging::init as init_logging;
pub use plugin::{
    ApplyRigTuning, BodyVelocity, FootOf, LegRig, LocomotionError, LocomotionErrorContext,
    LocomotionPlugin, Terrain,
};
pub use step::{interpolate_step, StepTrajectory};
pub use telemetry::{CoordinatorSnapshot, GroupSnapshot, LegPhase, LegSnapshot};
pub use terrain::{Block, BlockSlope, BlockTerrain, FlatGround, LayerMask, ProbeHit, TerrainProbe};

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use legwork::prelude::*;
    //! ```

    pub use crate::BodyState;
    pub use crate::FlatGround;
    pub use crate::LegCoordinator;
    pub use crate::LocomotionConfig;
    pub use crate::LocomotionPlugin;
    pub use crate::TerrainProbe;
    pub use glam::Vec3;
}
