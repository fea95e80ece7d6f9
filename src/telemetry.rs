//! Read-only per-tick snapshots of a coordinator.
//!
//! Snapshots serialise to JSON for telemetry consumers and render as the
//! plain-text diagnostic overlay through [`fmt::Display`].

use std::fmt;

use glam::Vec3;
use serde::Serialize;

use crate::constants::PRIORITY_URGENCY;
use crate::coordinator::{AdmissionGate, LegCoordinator};
use crate::leg::Leg;

/// Coarse leg state for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegPhase {
    /// Foot planted.
    Idle,
    /// Foot in the air.
    Moving,
}

impl fmt::Display for LegPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "Idle",
            Self::Moving => "Moving",
        })
    }
}

/// One group's aggregate urgency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSnapshot {
    /// Group name.
    pub name: String,
    /// Sum of member urgencies.
    pub urgency: f32,
    /// `true` once the aggregate reaches the priority threshold.
    pub priority: bool,
}

/// One leg as of the last tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegSnapshot {
    /// Leg name.
    pub name: String,
    /// Group name.
    pub group: String,
    /// Idle or moving.
    pub phase: LegPhase,
    /// Urgency computed on the last tick.
    pub urgency: f32,
    /// Normalised step progress while moving.
    pub progress: Option<f32>,
    /// Observable foot position.
    pub position: Vec3,
    /// Last resolved target, or the landing point while stepping.
    pub target: Vec3,
    /// Yaw drift since the last rotation reset, in radians.
    pub rotation_drift: f32,
}

/// Everything a debug overlay or telemetry sink needs from one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoordinatorSnapshot {
    /// Ticks run so far.
    pub tick: u64,
    /// Name of the group chosen for admission.
    pub most_urgent: Option<String>,
    /// Groups in declaration order.
    pub groups: Vec<GroupSnapshot>,
    /// Legs in declaration order.
    pub legs: Vec<LegSnapshot>,
    /// Planted legs.
    pub grounded: usize,
    /// Stepping legs.
    pub moving: usize,
    /// Gate state on the last tick.
    pub gate: AdmissionGate,
}

impl CoordinatorSnapshot {
    /// Captures the current state of `coordinator`.
    #[must_use]
    pub fn capture(coordinator: &LegCoordinator) -> Self {
        let groups = coordinator
            .groups()
            .iter()
            .zip(coordinator.group_urgency())
            .map(|(name, &urgency)| GroupSnapshot {
                name: name.clone(),
                urgency,
                priority: urgency >= PRIORITY_URGENCY,
            })
            .collect();
        let legs = coordinator
            .legs()
            .iter()
            .zip(coordinator.leg_urgency())
            .map(|(leg, &urgency)| leg_snapshot(coordinator, leg, urgency))
            .collect();
        Self {
            tick: coordinator.ticks(),
            most_urgent: coordinator
                .most_urgent()
                .and_then(|id| coordinator.group_name(id))
                .map(str::to_owned),
            groups,
            legs,
            grounded: coordinator.grounded_count(),
            moving: coordinator.moving_count(),
            gate: coordinator.gate(),
        }
    }
}

fn leg_snapshot(coordinator: &LegCoordinator, leg: &Leg, urgency: f32) -> LegSnapshot {
    LegSnapshot {
        name: leg.name().to_owned(),
        group: coordinator
            .group_name(leg.group())
            .unwrap_or_default()
            .to_owned(),
        phase: if leg.is_moving() {
            LegPhase::Moving
        } else {
            LegPhase::Idle
        },
        urgency,
        progress: leg.state().trajectory().map(crate::step::StepTrajectory::progress),
        position: leg.current_pose(),
        target: leg.target_pose(),
        rotation_drift: leg.rotation_drift(),
    }
}

impl fmt::Display for CoordinatorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Group Priority:")?;
        writeln!(
            f,
            "Most Urgent Leg Group: {}",
            self.most_urgent.as_deref().unwrap_or("-")
        )?;
        for group in &self.groups {
            if group.priority {
                writeln!(f, "Group {}: PRIORITY", group.name)?;
            } else {
                writeln!(f, "Group {}: {:.3}", group.name, group.urgency)?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Grounded Legs: {}", self.grounded)?;
        writeln!(f, "Gate: {}", self.gate)?;
        writeln!(f)?;
        writeln!(f, "Leg States:")?;
        for leg in &self.legs {
            writeln!(f, "Leg {} ({:.3})", leg.name, leg.urgency)?;
            writeln!(f, "Status: {}", leg.phase)?;
        }
        Ok(())
    }
}
