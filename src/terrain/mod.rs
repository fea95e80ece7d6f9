//! Terrain probing contract and the probes shipped with the crate.
//!
//! The locomotion core never owns terrain. Every tick it asks a
//! [`TerrainProbe`] for the nearest surface along a ray and treats a miss as
//! "keep the last known target" rather than as an error.

mod blocks;

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub use blocks::{Block, BlockSlope, BlockTerrain};

/// Bit mask selecting which terrain layers a probe may hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Matches nothing.
    pub const NONE: Self = Self(0);
    /// Matches every layer.
    pub const ALL: Self = Self(u32::MAX);
    /// The layer terrain lives on unless configured otherwise.
    pub const TERRAIN: Self = Self(1);

    /// Mask containing only layer `index`; indices past 31 yield [`Self::NONE`].
    #[must_use]
    pub const fn layer(index: u32) -> Self {
        match 1_u32.checked_shl(index) {
            Some(bits) => Self(bits),
            None => Self::NONE,
        }
    }

    /// Returns `true` when the two masks share at least one layer.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::TERRAIN
    }
}

/// Surface intersection reported by a [`TerrainProbe`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    /// World-space intersection point.
    pub point: Vec3,
    /// Surface normal at the intersection. Informational only.
    pub normal: Vec3,
}

impl ProbeHit {
    /// Hit on a horizontal surface.
    #[must_use]
    pub const fn flat(point: Vec3) -> Self {
        Self {
            point,
            normal: Vec3::Y,
        }
    }
}

/// Synchronous terrain intersection oracle.
///
/// Implementations must answer within the calling tick; the coordinator never
/// waits on a probe.
pub trait TerrainProbe {
    /// Casts a ray from `origin` along `direction` and returns the nearest
    /// surface on a layer selected by `mask` within `max_distance`, or `None`.
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<ProbeHit>;
}

impl<T: TerrainProbe + ?Sized> TerrainProbe for &T {
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<ProbeHit> {
        (**self).probe(origin, direction, max_distance, mask)
    }
}

impl<T: TerrainProbe + ?Sized> TerrainProbe for Box<T> {
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<ProbeHit> {
        (**self).probe(origin, direction, max_distance, mask)
    }
}

/// Infinite horizontal plane at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatGround {
    /// Height of the plane.
    pub height: f32,
    /// Layer the plane lives on.
    pub layer: LayerMask,
}

impl FlatGround {
    /// Plane at `height` on the terrain layer.
    #[must_use]
    pub const fn new(height: f32) -> Self {
        Self {
            height,
            layer: LayerMask::TERRAIN,
        }
    }
}

impl Default for FlatGround {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl TerrainProbe for FlatGround {
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<ProbeHit> {
        if !mask.intersects(self.layer) {
            return None;
        }
        let dir = direction.try_normalize()?;
        if dir.y.abs() < f32::EPSILON {
            return None;
        }
        let distance = (self.height - origin.y) / dir.y;
        if !(0.0..=max_distance).contains(&distance) {
            return None;
        }
        Some(ProbeHit::flat(origin + dir * distance))
    }
}
