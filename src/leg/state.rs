//! Tagged leg state and the transitions between its variants.

use glam::Vec3;

use crate::step::StepTrajectory;

/// What a leg is doing this tick.
#[derive(Debug, Clone, PartialEq)]
pub enum LegState {
    /// Foot planted. `since_landing` is `None` until the first step lands.
    Idle {
        /// Seconds since the last touchdown.
        since_landing: Option<f32>,
    },
    /// Foot in the air following a trajectory.
    Moving(StepTrajectory),
}

impl Default for LegState {
    fn default() -> Self {
        Self::Idle {
            since_landing: None,
        }
    }
}

/// Outcome of advancing a leg by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepProgress {
    /// The leg was planted; nothing moved.
    Idle,
    /// The step is under way at normalised time `t`.
    InFlight {
        /// Progress in `[0, 1)`.
        t: f32,
    },
    /// The foot touched down at the given position this tick.
    Completed {
        /// Landing position.
        landed_at: Vec3,
    },
}

impl LegState {
    /// `true` while the foot is planted.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle { .. })
    }

    /// `true` while a step is in flight.
    #[must_use]
    pub const fn is_moving(&self) -> bool {
        matches!(self, Self::Moving(_))
    }

    /// Step trajectory, if moving.
    #[must_use]
    pub const fn trajectory(&self) -> Option<&StepTrajectory> {
        match self {
            Self::Moving(step) => Some(step),
            Self::Idle { .. } => None,
        }
    }

    /// `true` once the leg has rested for at least `interval` seconds.
    /// Legs that never stepped are always rested.
    #[must_use]
    pub fn is_rested(&self, interval: f32) -> bool {
        match self {
            Self::Idle { since_landing } => since_landing.is_none_or(|t| t >= interval),
            Self::Moving(_) => false,
        }
    }

    /// Advances the rest clock or the step timer by `dt`.
    ///
    /// A finished step leaves the state `Idle` with a fresh rest clock and
    /// reports where it landed.
    pub fn advance(&mut self, dt: f32) -> StepProgress {
        match self {
            Self::Idle { since_landing } => {
                if let Some(rest) = since_landing {
                    if dt.is_finite() && dt > 0.0 {
                        *rest += dt;
                    }
                }
                StepProgress::Idle
            }
            Self::Moving(step) => {
                step.advance(dt);
                if step.is_complete() {
                    let landed_at = step.to;
                    *self = Self::Idle {
                        since_landing: Some(0.0),
                    };
                    StepProgress::Completed { landed_at }
                } else {
                    StepProgress::InFlight {
                        t: step.progress(),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{HorizontalBlend, StepCurve};
    use rstest::rstest;

    fn moving(duration: f32) -> LegState {
        LegState::Moving(StepTrajectory::new(
            Vec3::ZERO,
            Vec3::X,
            duration,
            1.0,
            StepCurve::Sine,
            HorizontalBlend::Linear,
        ))
    }

    #[rstest]
    fn fresh_legs_are_rested() {
        assert!(LegState::default().is_rested(10.0));
        assert!(!moving(1.0).is_rested(0.0));
    }

    #[rstest]
    fn step_completes_into_idle() {
        let mut state = moving(0.2);
        assert!(matches!(state.advance(0.1), StepProgress::InFlight { .. }));
        assert_eq!(
            state.advance(0.1),
            StepProgress::Completed { landed_at: Vec3::X }
        );
        assert!(state.is_idle());
        assert!(!state.is_rested(0.05));
        assert_eq!(state.advance(0.05), StepProgress::Idle);
        assert!(state.is_rested(0.05));
    }
}
