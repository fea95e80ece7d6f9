//! Default tunables shared by the leg, coordinator and probe layers.
//!
//! Values mirror the defaults the rig shipped with before configuration moved
//! into [`LocomotionConfig`](crate::config::LocomotionConfig). Distances are in
//! world units, durations in seconds and angles in radians.

/// Distance between the planted foot and its resolved target that saturates
/// positional urgency.
pub const STEP_DISTANCE: f32 = 2.0;
/// Time a single step takes from liftoff to touchdown.
pub const STEP_DURATION: f32 = 0.25;
/// Peak height of the step arc.
pub const STEP_HEIGHT: f32 = 2.0;
/// Minimum rest time after touchdown before a leg may step again.
pub const LEG_INTERVAL: f32 = 0.1;
/// Body yaw drift that saturates rotational urgency.
pub const MAX_ROTATION: f32 = 0.35;
/// Look-ahead applied to the body's horizontal velocity when predicting
/// foot targets.
pub const VELOCITY_FACTOR: f32 = 0.1;
/// Down-weighting of rotational drift relative to positional drift.
pub const ROTATION_WEIGHT: f32 = 0.1;

/// Maximum number of legs allowed in the air at once.
pub const MAX_CONCURRENT_MOVES: usize = 2;
/// Minimum number of planted legs required before any new step is admitted.
pub const MIN_GROUNDED_LEGS: usize = 3;
/// Urgency a leg must reach before it is eligible to step.
pub const LEG_SENSITIVITY: f32 = 1.0;

/// Height above the attachment pivot from which target probes are cast.
pub const PROBE_LIFT: f32 = 0.5;
/// Reach of the per-tick target probe.
pub const PROBE_DISTANCE: f32 = 10.0;
/// Reach of the probe used to plant feet when the rig is built.
pub const INITIAL_PROBE_DISTANCE: f32 = 30.0;

/// Group aggregate urgency at which the diagnostic overlay flags a group as
/// a priority.
pub const PRIORITY_URGENCY: f32 = 2.0;
/// Horizontal speeds below this are treated as standing still.
pub const VELOCITY_EPSILON: f32 = 1e-4;
