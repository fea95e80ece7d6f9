//! Easing curves shaping a step's lift and horizontal progress.

use serde::{Deserialize, Serialize};

// Lift profile control points for a degree-11 Bezier. The first and last three
// points are zero so the foot leaves and meets the ground with zero vertical
// velocity and acceleration.
const BEZIER_LIFT: [f32; 12] = [0.0, 0.0, 0.0, 0.9, 0.9, 1.0, 1.0, 0.9, 0.9, 0.0, 0.0, 0.0];
// Value of the lift profile at t = 0.5, used to normalise the peak to 1.
const BEZIER_LIFT_PEAK: f32 = 0.886_230_5;

/// A point on an authored lift curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Normalised step time in `[0, 1]`.
    pub time: f32,
    /// Lift as a fraction of the step height.
    pub value: f32,
}

/// Vertical lift profile evaluated over normalised step time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepCurve {
    /// `sin(pi t)`: symmetric arc peaking at mid-step.
    #[default]
    Sine,
    /// `4 t (1 - t)`.
    Parabola,
    /// Smooth Bezier lift with zero velocity at liftoff and touchdown.
    Bezier,
    /// Piecewise-linear authored curve.
    Keyframes {
        /// Keys sorted by time.
        keys: Vec<Keyframe>,
    },
}

impl StepCurve {
    /// Evaluates the lift at `t`, clamping `t` into `[0, 1]` first.
    #[must_use]
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = clamp_unit(t);
        match self {
            Self::Sine => (std::f32::consts::PI * t).sin(),
            Self::Parabola => 4.0 * t * (1.0 - t),
            Self::Bezier => bezier_eval(&BEZIER_LIFT, t) / BEZIER_LIFT_PEAK,
            Self::Keyframes { keys } => sample_keys(keys, t),
        }
    }

    /// Checks that authored keys are usable.
    ///
    /// # Errors
    /// Returns a human-readable reason when keyframes are empty, out of
    /// `[0, 1]`, non-finite or unsorted.
    pub fn validate(&self) -> Result<(), String> {
        let Self::Keyframes { keys } = self else {
            return Ok(());
        };
        if keys.is_empty() {
            return Err("keyframe curve has no keys".into());
        }
        if keys
            .iter()
            .any(|k| !k.value.is_finite() || !(0.0..=1.0).contains(&k.time))
        {
            return Err("keyframe times must lie in [0, 1] with finite values".into());
        }
        if keys.windows(2).any(|pair| match pair {
            [a, b] => b.time < a.time,
            _ => false,
        }) {
            return Err("keyframes must be sorted by time".into());
        }
        Ok(())
    }
}

/// Horizontal easing between liftoff and touchdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalBlend {
    /// Constant horizontal speed.
    #[default]
    Linear,
    /// Eases in and out: `3t^2 - 2t^3`.
    SmoothStep,
}

impl HorizontalBlend {
    /// Fraction of the horizontal distance covered at `t`.
    #[must_use]
    pub fn evaluate(self, t: f32) -> f32 {
        let t = clamp_unit(t);
        match self {
            Self::Linear => t,
            Self::SmoothStep => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Clamps to `[0, 1]`, mapping NaN to 0.
fn clamp_unit(t: f32) -> f32 {
    if t.is_nan() {
        0.0
    } else {
        t.clamp(0.0, 1.0)
    }
}

fn sample_keys(keys: &[Keyframe], t: f32) -> f32 {
    let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
        return 0.0;
    };
    if t <= first.time {
        return first.value;
    }
    if t >= last.time {
        return last.value;
    }
    keys.windows(2)
        .find_map(|pair| match pair {
            [a, b] if t <= b.time => {
                let span = b.time - a.time;
                if span <= f32::EPSILON {
                    Some(b.value)
                } else {
                    Some(a.value + (b.value - a.value) * (t - a.time) / span)
                }
            }
            _ => None,
        })
        .unwrap_or(last.value)
}

/// De Casteljau evaluation of a Bezier with scalar control points.
fn bezier_eval(points: &[f32], t: f32) -> f32 {
    let mut work = points.to_vec();
    while work.len() > 1 {
        work = work
            .windows(2)
            .map(|pair| match pair {
                [a, b] => a * (1.0 - t) + b * t,
                _ => 0.0,
            })
            .collect();
    }
    work.first().copied().unwrap_or_default()
}
