//! Group ranking and the gates that bound how many legs may lift off.

use std::cmp::Reverse;
use std::fmt;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::config::{AdmissionOrder, CoordinatorSettings};
use crate::leg::{GroupId, Leg, LegId};

/// Outcome of the stability and concurrency gates for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "gate", rename_all = "snake_case")]
pub enum AdmissionGate {
    /// Up to `budget` legs may start stepping.
    Open {
        /// Legs that may still lift off this tick.
        budget: usize,
    },
    /// Fewer legs are planted than the configured minimum.
    Stability {
        /// Legs currently planted.
        grounded: usize,
        /// Configured floor.
        min_grounded: usize,
    },
    /// The concurrency cap is already reached.
    Concurrency {
        /// Legs currently stepping.
        moving: usize,
        /// Configured cap.
        max_concurrent: usize,
    },
}

impl AdmissionGate {
    /// Evaluates both gates. The stability gate is checked first.
    ///
    /// A rig sitting exactly on its grounding floor is reported as open with
    /// a zero budget.
    #[must_use]
    pub fn evaluate(grounded: usize, moving: usize, settings: &CoordinatorSettings) -> Self {
        if grounded < settings.min_grounded_legs {
            return Self::Stability {
                grounded,
                min_grounded: settings.min_grounded_legs,
            };
        }
        if moving >= settings.max_concurrent_moves {
            return Self::Concurrency {
                moving,
                max_concurrent: settings.max_concurrent_moves,
            };
        }
        Self::Open {
            budget: admission_budget(grounded, moving, settings),
        }
    }

    /// Legs that may be admitted; zero when either gate is closed.
    #[must_use]
    pub const fn budget(&self) -> usize {
        match self {
            Self::Open { budget } => *budget,
            Self::Stability { .. } | Self::Concurrency { .. } => 0,
        }
    }
}

impl fmt::Display for AdmissionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { budget } => write!(f, "open ({budget} slot(s))"),
            Self::Stability {
                grounded,
                min_grounded,
            } => write!(f, "held: {grounded} grounded, need at least {min_grounded}"),
            Self::Concurrency {
                moving,
                max_concurrent,
            } => write!(f, "held: {moving}/{max_concurrent} moving"),
        }
    }
}

/// Legs that may lift off without breaking either limit.
///
/// `min(max_concurrent - moving, grounded - min_grounded)`, saturating at
/// zero.
#[must_use]
pub const fn admission_budget(grounded: usize, moving: usize, settings: &CoordinatorSettings) -> usize {
    let concurrency = settings.max_concurrent_moves.saturating_sub(moving);
    let stability = grounded.saturating_sub(settings.min_grounded_legs);
    if concurrency < stability {
        concurrency
    } else {
        stability
    }
}

/// Group with the highest aggregate urgency.
///
/// Ties go to the earliest declared group, so an all-zero rig reports the
/// first group. `None` only for an empty slice.
#[must_use]
pub fn most_urgent_group(group_urgency: &[f32]) -> Option<GroupId> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &urgency) in group_urgency.iter().enumerate() {
        match best {
            Some((_, top)) if urgency <= top || urgency.is_nan() => {}
            _ => best = Some((index, if urgency.is_nan() { 0.0 } else { urgency })),
        }
    }
    best.map(|(index, _)| GroupId(index))
}

/// Picks which legs of `group` lift off this tick.
///
/// A leg qualifies when it is planted, rested and at or above the
/// sensitivity threshold. At most `budget` legs are returned, ordered by the
/// configured [`AdmissionOrder`].
#[must_use]
pub fn select_admissions(
    legs: &[Leg],
    leg_urgency: &[f32],
    group: GroupId,
    budget: usize,
    settings: &CoordinatorSettings,
) -> Vec<LegId> {
    if budget == 0 {
        return Vec::new();
    }
    let mut eligible: Vec<(LegId, f32)> = legs
        .iter()
        .zip(leg_urgency)
        .filter(|(leg, &urgency)| {
            leg.group() == group
                && leg.is_grounded()
                && leg.is_rested()
                && urgency >= settings.sensitivity
        })
        .map(|(leg, &urgency)| (leg.id(), urgency))
        .collect();
    if settings.admission_order == AdmissionOrder::UrgencyDescending {
        eligible.sort_by_key(|&(_, urgency)| Reverse(OrderedFloat(urgency)));
    }
    eligible.into_iter().take(budget).map(|(id, _)| id).collect()
}
