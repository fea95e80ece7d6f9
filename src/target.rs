//! Foot target resolution.
//!
//! A leg's pivot is the body position lifted by the probe lift plus the
//! leg's rest offset rotated into world space. A ray cast straight down from
//! the pivot finds the ground; moving bodies push the target ahead along the
//! horizontal direction of travel.

use glam::Vec3;

use crate::body::BodyPose;
use crate::config::ProbeSettings;
use crate::constants::VELOCITY_EPSILON;
use crate::terrain::{ProbeHit, TerrainProbe};

/// World-space origin of the downward foot ray for a leg.
#[must_use]
pub fn attachment_point(body: &BodyPose, rest_offset: Vec3, lift: f32) -> Vec3 {
    body.position + Vec3::Y * lift + body.rotation * rest_offset
}

/// Casts the foot ray from `origin` and returns the ground hit, if any.
pub fn resolve_foot_target<P>(
    probe: &P,
    origin: Vec3,
    settings: &ProbeSettings,
) -> Option<ProbeHit>
where
    P: TerrainProbe + ?Sized,
{
    probe.probe(origin, Vec3::NEG_Y, settings.distance, settings.mask)
}

/// Shifts `hit` along the horizontal body velocity and re-probes the ground.
///
/// The shifted ray keeps the height of the original `origin`, so feet land
/// on whatever surface lies ahead. A stationary body, a zero factor or a
/// re-probe miss all fall back to `hit.point`.
pub fn predict_foot_target<P>(
    probe: &P,
    origin: Vec3,
    hit: ProbeHit,
    velocity: Vec3,
    velocity_factor: f32,
    settings: &ProbeSettings,
) -> Vec3
where
    P: TerrainProbe + ?Sized,
{
    let horizontal = Vec3::new(velocity.x, 0.0, velocity.z);
    if velocity_factor <= 0.0 || horizontal.length_squared() < VELOCITY_EPSILON {
        return hit.point;
    }
    let lead = horizontal * velocity_factor;
    if !lead.is_finite() {
        return hit.point;
    }
    resolve_foot_target(probe, origin + lead, settings).map_or(hit.point, |ahead| ahead.point)
}
