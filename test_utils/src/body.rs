//! Scripted body motion.

use glam::{Quat, Vec3};
use legwork::{BodyPose, BodySource};

/// Body moving at a constant velocity and yaw rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedBody {
    /// Current position.
    pub position: Vec3,
    /// Current yaw in radians.
    pub yaw: f32,
    /// Linear velocity.
    pub velocity: Vec3,
    /// Yaw rate in radians per second.
    pub yaw_rate: f32,
}

impl ScriptedBody {
    /// Stationary body at `position`.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            velocity: Vec3::ZERO,
            yaw_rate: 0.0,
        }
    }

    /// Returns a copy moving at `velocity`.
    pub fn moving(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Returns a copy turning at `yaw_rate`.
    pub fn turning(mut self, yaw_rate: f32) -> Self {
        self.yaw_rate = yaw_rate;
        self
    }

    /// Advances position and yaw by `dt`.
    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.yaw += self.yaw_rate * dt;
    }
}

impl BodySource for ScriptedBody {
    fn pose(&self) -> BodyPose {
        BodyPose {
            position: self.position,
            rotation: Quat::from_rotation_y(self.yaw),
        }
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }
}
