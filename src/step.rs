//! Step trajectories and the pure step interpolator.

use glam::Vec3;

use crate::curve::{HorizontalBlend, StepCurve};

/// Foot position at normalised step time `t`.
///
/// The foot blends from `from` to `to` and is lifted along +Y by
/// `curve(t) * height`. `t` is clamped to `[0, 1]`, so an oversized tick can
/// never extrapolate past the landing point.
#[must_use]
pub fn interpolate_step(
    from: Vec3,
    to: Vec3,
    t: f32,
    curve: &StepCurve,
    blend: HorizontalBlend,
    height: f32,
) -> Vec3 {
    from.lerp(to, blend.evaluate(t)) + Vec3::Y * (curve.evaluate(t) * height)
}

/// Everything needed to play back one step. Lives only while a leg is moving.
///
/// Tunables are captured when the step starts, so retuning a leg mid-step
/// never disturbs the step already in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct StepTrajectory {
    /// Foot position at liftoff.
    pub from: Vec3,
    /// Landing position.
    pub to: Vec3,
    /// Time spent in the step so far.
    pub elapsed: f32,
    /// Total step time.
    pub duration: f32,
    /// Peak lift.
    pub height: f32,
    /// Lift profile.
    pub curve: StepCurve,
    /// Horizontal easing.
    pub blend: HorizontalBlend,
}

impl StepTrajectory {
    /// A step that has not started yet.
    #[must_use]
    pub const fn new(
        from: Vec3,
        to: Vec3,
        duration: f32,
        height: f32,
        curve: StepCurve,
        blend: HorizontalBlend,
    ) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration,
            height,
            curve,
            blend,
        }
    }

    /// Normalised progress in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.elapsed / self.duration).clamp(0.0, 1.0)
    }

    /// `true` once the timer has reached the step duration.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advances the timer; negative or non-finite `dt` counts as zero.
    pub fn advance(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    /// Foot position for the current timer value.
    #[must_use]
    pub fn pose(&self) -> Vec3 {
        if self.is_complete() {
            return self.to;
        }
        interpolate_step(
            self.from,
            self.to,
            self.progress(),
            &self.curve,
            self.blend,
            self.height,
        )
    }
}
