//! Block-built terrain.
//!
//! The world is a grid of unit cells. Each cell's floor is the top face of the
//! highest block stacked on it, optionally tilted by a [`BlockSlope`]. Cells
//! without blocks fall back to `base_height`, or are holes when that is
//! `None`.

use glam::{Vec2, Vec3};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use super::{LayerMask, ProbeHit, TerrainProbe};

/// Offset from a block's base to its top face.
const BLOCK_TOP_OFFSET: f32 = 1.0;
/// Ray marching resolution for non-vertical probes.
const MARCH_STEP: f32 = 0.05;
/// Bisection passes used to refine a marched crossing.
const REFINE_PASSES: usize = 12;

/// A unit block occupying grid cell `(x, z)` at stack level `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    /// Identifier used to attach slopes.
    pub id: i64,
    /// Grid column along world X.
    pub x: i32,
    /// Stack level; the top face sits at `y + 1`.
    pub y: i32,
    /// Grid row along world Z.
    pub z: i32,
}

/// Gradient applied to the top face of a block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlockSlope {
    /// Block the slope belongs to.
    pub block_id: i64,
    /// Height change per unit along X.
    pub grad_x: f32,
    /// Height change per unit along Z.
    pub grad_z: f32,
}

/// Terrain assembled from [`Block`]s with optional [`BlockSlope`]s.
#[derive(Debug, Clone, Default)]
pub struct BlockTerrain {
    highest: HashMap<(i32, i32), Block>,
    slopes: HashMap<i64, BlockSlope>,
    /// Floor height of empty cells; `None` turns them into holes.
    pub base_height: Option<f32>,
    /// Layer the blocks live on.
    pub layer: LayerMask,
}

impl BlockTerrain {
    /// Empty terrain whose bare cells sit at `base_height`.
    #[must_use]
    pub fn new(base_height: Option<f32>) -> Self {
        Self {
            base_height,
            ..Self::default()
        }
    }

    /// Adds a block, keeping only the highest block per cell.
    pub fn insert(&mut self, block: Block) -> &mut Self {
        self.highest
            .entry((block.x, block.z))
            .and_modify(|current| {
                if block.y > current.y {
                    *current = block;
                }
            })
            .or_insert(block);
        self
    }

    /// Attaches a slope to the block with `slope.block_id`.
    pub fn insert_slope(&mut self, slope: BlockSlope) -> &mut Self {
        self.slopes.insert(slope.block_id, slope);
        self
    }

    /// Builds terrain from block and slope lists.
    #[must_use]
    pub fn from_parts(
        base_height: Option<f32>,
        blocks: impl IntoIterator<Item = Block>,
        slopes: impl IntoIterator<Item = BlockSlope>,
    ) -> Self {
        let mut terrain = Self::new(base_height);
        for block in blocks {
            terrain.insert(block);
        }
        for slope in slopes {
            terrain.insert_slope(slope);
        }
        terrain
    }

    /// Highest block stacked on the cell containing `(x, z)`.
    #[must_use]
    pub fn highest_block_at(&self, x: f32, z: f32) -> Option<&Block> {
        self.highest.get(&cell_of(x, z))
    }

    /// Floor height and surface gradient at horizontal position `(x, z)`.
    fn surface_at(&self, x: f32, z: f32) -> Option<(f32, Vec2)> {
        let Some(block) = self.highest_block_at(x, z) else {
            return self.base_height.map(|h| (h, Vec2::ZERO));
        };
        let base = block.y as f32 + BLOCK_TOP_OFFSET;
        match self.slopes.get(&block.id) {
            Some(s) => Some((
                base + (x - block.x as f32) * s.grad_x + (z - block.z as f32) * s.grad_z,
                Vec2::new(s.grad_x, s.grad_z),
            )),
            None => Some((base, Vec2::ZERO)),
        }
    }

    /// Floor height at horizontal position `(x, z)`, or `None` over a hole.
    #[must_use]
    pub fn floor_height_at(&self, x: f32, z: f32) -> Option<f32> {
        self.surface_at(x, z).map(|(h, _)| h)
    }

    fn hit_at(&self, point: Vec3) -> Option<ProbeHit> {
        let (height, gradient) = self.surface_at(point.x, point.z)?;
        let normal = Vec3::new(-gradient.x, 1.0, -gradient.y).normalize_or(Vec3::Y);
        Some(ProbeHit {
            point: Vec3::new(point.x, height, point.z),
            normal,
        })
    }

    /// Signed clearance of `point` above the floor; `None` over holes.
    fn clearance(&self, point: Vec3) -> Option<f32> {
        self.floor_height_at(point.x, point.z).map(|h| point.y - h)
    }

    fn march(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<ProbeHit> {
        if self.clearance(origin).is_some_and(|c| c < 0.0) {
            return None;
        }
        let mut previous = 0.0_f32;
        let mut travelled = MARCH_STEP.min(max_distance);
        loop {
            if self.clearance(origin + dir * travelled).is_some_and(|c| c <= 0.0) {
                let (mut lo, mut hi) = (previous, travelled);
                for _ in 0..REFINE_PASSES {
                    let mid = 0.5 * (lo + hi);
                    if self.clearance(origin + dir * mid).is_some_and(|c| c <= 0.0) {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                }
                return self.hit_at(origin + dir * hi);
            }
            if travelled >= max_distance {
                return None;
            }
            previous = travelled;
            travelled = (travelled + MARCH_STEP).min(max_distance);
        }
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "Grid coordinates are floored world positions well inside i32."
)]
fn cell_of(x: f32, z: f32) -> (i32, i32) {
    (x.floor() as i32, z.floor() as i32)
}

impl TerrainProbe for BlockTerrain {
    fn probe(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<ProbeHit> {
        if !mask.intersects(self.layer) || !(max_distance.is_finite() && max_distance > 0.0) {
            return None;
        }
        let dir = direction.try_normalize()?;
        let vertical = dir.x.abs() < f32::EPSILON && dir.z.abs() < f32::EPSILON;
        if vertical && dir.y < 0.0 {
            let drop = self.clearance(origin)?;
            if !(0.0..=max_distance).contains(&drop) {
                return None;
            }
            return self.hit_at(origin);
        }
        self.march(origin, dir, max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::{fixture, rstest};

    fn block(id: i64, x: i32, y: i32, z: i32) -> Block {
        Block { id, x, y, z }
    }

    #[fixture]
    fn steps() -> BlockTerrain {
        BlockTerrain::from_parts(
            Some(0.0),
            [block(1, 0, 0, 0), block(2, 1, 1, 0), block(3, 1, 0, 0)],
            [],
        )
    }

    #[rstest]
    fn highest_block_wins(steps: BlockTerrain) {
        assert_eq!(steps.highest_block_at(1.5, 0.5).map(|b| b.id), Some(2));
        assert_relative_eq!(steps.floor_height_at(1.5, 0.5).unwrap_or_default(), 2.0);
    }

    #[rstest]
    #[case(0.5, 0.5, Some(1.0))]
    #[case(5.5, 5.5, Some(0.0))]
    fn floor_heights(steps: BlockTerrain, #[case] x: f32, #[case] z: f32, #[case] expected: Option<f32>) {
        assert_eq!(steps.floor_height_at(x, z), expected);
    }

    #[rstest]
    fn holes_miss() {
        let terrain = BlockTerrain::from_parts(None, [block(1, 0, 0, 0)], []);
        assert!(terrain
            .probe(Vec3::new(3.5, 5.0, 3.5), Vec3::NEG_Y, 10.0, LayerMask::ALL)
            .is_none());
        assert!(terrain
            .probe(Vec3::new(0.5, 5.0, 0.5), Vec3::NEG_Y, 10.0, LayerMask::ALL)
            .is_some());
    }

    #[rstest]
    fn slopes_tilt_the_floor() {
        let terrain = BlockTerrain::from_parts(
            Some(0.0),
            [block(7, 0, 0, 0)],
            [BlockSlope {
                block_id: 7,
                grad_x: 1.0,
                grad_z: 0.0,
            }],
        );
        let hit = terrain
            .probe(Vec3::new(0.5, 5.0, 0.25), Vec3::NEG_Y, 10.0, LayerMask::ALL)
            .expect("sloped block below");
        assert_relative_eq!(hit.point.y, 1.5);
        assert!(hit.normal.x < 0.0);
    }

    #[rstest]
    fn vertical_probe_respects_reach(steps: BlockTerrain) {
        assert!(steps
            .probe(Vec3::new(0.5, 5.0, 0.5), Vec3::NEG_Y, 3.0, LayerMask::ALL)
            .is_none());
    }

    #[rstest]
    #[case(Vec3::NEG_Y, f32::INFINITY)]
    #[case(Vec3::NEG_Y, f32::NAN)]
    #[case(Vec3::new(1.0, 1.0, 0.0), f32::INFINITY)]
    #[case(Vec3::new(1.0, 1.0, 0.0), f32::NAN)]
    #[case(Vec3::new(1.0, -1.0, 0.0), 0.0)]
    fn unbounded_or_empty_reach_misses(
        steps: BlockTerrain,
        #[case] direction: Vec3,
        #[case] reach: f32,
    ) {
        assert!(steps
            .probe(Vec3::new(0.5, 5.0, 0.5), direction, reach, LayerMask::ALL)
            .is_none());
    }

    #[rstest]
    fn marched_probe_finds_step_face(steps: BlockTerrain) {
        let hit = steps
            .probe(Vec3::new(0.5, 2.5, 0.5), Vec3::new(1.0, -1.0, 0.0), 5.0, LayerMask::ALL)
            .expect("ray descends onto the raised block");
        assert_relative_eq!(hit.point.y, 2.0, epsilon = 1e-3);
        assert!(hit.point.x >= 1.0);
    }
}
