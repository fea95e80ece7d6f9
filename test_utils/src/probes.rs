//! Terrain doubles.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use glam::Vec3;
use legwork::{LayerMask, ProbeHit, TerrainProbe};

/// Terrain with nothing in it.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGround;

impl TerrainProbe for NoGround {
    fn probe(&self, _: Vec3, _: Vec3, _: f32, _: LayerMask) -> Option<ProbeHit> {
        None
    }
}

/// Wraps a probe so tests can make it go blind and count calls.
#[derive(Debug, Default)]
pub struct SwitchableProbe<P> {
    inner: P,
    blind: AtomicBool,
    calls: AtomicUsize,
}

impl<P> SwitchableProbe<P> {
    /// Wraps `inner`, initially seeing normally.
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            blind: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Makes every subsequent probe miss (`true`) or see again (`false`).
    pub fn set_blind(&self, blind: bool) {
        self.blind.store(blind, Ordering::SeqCst);
    }

    /// Number of probes issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<P: TerrainProbe> TerrainProbe for SwitchableProbe<P> {
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<ProbeHit> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.blind.load(Ordering::SeqCst) {
            return None;
        }
        self.inner.probe(origin, direction, max_distance, mask)
    }
}
