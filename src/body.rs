//! Body pose and velocity as seen by the locomotion core.
//!
//! The rigid-body simulation lives elsewhere; the coordinator only polls a
//! [`BodySource`] once per tick.

use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World-space pose of the body the legs are attached to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyPose {
    /// Body origin.
    pub position: Vec3,
    /// Body orientation.
    pub rotation: Quat,
}

impl BodyPose {
    /// Pose at `position` with identity rotation.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Rotation about the world up axis, in radians.
    #[must_use]
    pub fn yaw(&self) -> f32 {
        yaw_of(self.rotation)
    }
}

impl Default for BodyPose {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Anything able to report the body's pose and linear velocity.
pub trait BodySource {
    /// Current world pose.
    fn pose(&self) -> BodyPose;
    /// Current linear velocity in world space.
    fn velocity(&self) -> Vec3;
}

/// Plain snapshot of pose and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BodyState {
    /// Pose at the sampled instant.
    pub pose: BodyPose,
    /// Linear velocity at the sampled instant.
    pub velocity: Vec3,
}

impl BodyState {
    /// Stationary body at `position`.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            pose: BodyPose::at(position),
            velocity: Vec3::ZERO,
        }
    }

    /// Returns a copy with the given yaw.
    #[must_use]
    pub fn with_yaw(mut self, yaw: f32) -> Self {
        self.pose.rotation = Quat::from_rotation_y(yaw);
        self
    }

    /// Returns a copy with the given velocity.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }
}

impl BodySource for BodyState {
    fn pose(&self) -> BodyPose {
        self.pose
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }
}

/// Extracts the yaw (rotation about +Y) from `rotation`.
#[must_use]
pub fn yaw_of(rotation: Quat) -> f32 {
    let (yaw, _, _) = rotation.to_euler(EulerRot::YXZ);
    yaw
}

/// Smallest absolute angle between two yaws, in `[0, PI]`.
#[must_use]
pub fn yaw_drift(from: f32, to: f32) -> f32 {
    let delta = (to - from).rem_euclid(std::f32::consts::TAU);
    if delta > std::f32::consts::PI {
        std::f32::consts::TAU - delta
    } else {
        delta
    }
}
