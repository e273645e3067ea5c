//! Carries finer-LOD border samples up to the coarser LOD tiles containing them

use super::scanner::LodScanner;
use super::tile::SamplerTile;
use super::vertex::{BorderTag, Side};
use crate::core::types::Vec3;
use crate::math::Aabb;

/// Tolerance when comparing fine and coarse tile edges
pub const BORDER_EPSILON: f32 = 0.01;

/// Sides of the coarse tile touched by a fine tile inside it
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Placement {
    pub left: bool,
    pub right: bool,
    pub bottom: bool,
    pub top: bool,
}

impl Placement {
    pub fn classify(coarse: &Aabb, fine: &Aabb) -> Self {
        let near = |a: f32, b: f32| (a - b).abs() < BORDER_EPSILON;
        Self {
            left: near(coarse.min.x, fine.min.x),
            right: near(coarse.max.x, fine.max.x),
            bottom: near(coarse.min.z, fine.min.z),
            top: near(coarse.max.z, fine.max.z),
        }
    }

    pub fn touches(&self, side: Side) -> bool {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Top => self.top,
        }
    }

    pub fn is_interior(&self) -> bool {
        !(self.left || self.right || self.bottom || self.top)
    }

    /// `(coarse tag, fine tags)` merge pairs for this placement.
    ///
    /// Each touched side takes the fine edge plus the fine corners on that
    /// side that are not themselves coarse corners. A fine corner lying on two
    /// touched sides maps to the same coarse corner.
    pub fn merge_table(&self) -> Vec<(BorderTag, Vec<BorderTag>)> {
        let is_coarse_corner = |corner: BorderTag| {
            corner
                .corner_sides()
                .is_some_and(|(a, b)| self.touches(a) && self.touches(b))
        };

        let mut table = Vec::new();
        for side in Side::ALL {
            if !self.touches(side) {
                continue;
            }
            let mut sources = vec![side.edge()];
            sources.extend(side.corners().into_iter().filter(|c| !is_coarse_corner(*c)));
            table.push((side.edge(), sources));
        }
        for corner in BorderTag::ALL.into_iter().filter(|t| t.is_corner()) {
            if is_coarse_corner(corner) {
                table.push((corner, vec![corner]));
            }
        }
        table
    }
}

fn merge_from(coarse: &mut SamplerTile, fine: &SamplerTile, min_dist: f32) -> usize {
    let placement = Placement::classify(&coarse.bounds, &fine.bounds);
    if placement.is_interior() {
        return 0;
    }

    let mut failures = 0;
    for (target, sources) in placement.merge_table() {
        for source in sources {
            let Some(list) = fine.boundaries.get(&source) else {
                log::error!("Finer tile {:?} has no {:?} border to merge", fine.bounds, source);
                failures += 1;
                continue;
            };
            if coarse.merge_boundary(target, min_dist, list).is_err() {
                failures += 1;
            }
        }
    }
    failures
}

/// Rebuild every coarse tile's border lists from the finer LOD.
///
/// Returns the number of failed merges; each one is logged.
pub fn stitch_lod(coarse: &mut LodScanner, fine: &LodScanner, min_dist: f32) -> usize {
    let mut failures = 0;
    for tile in coarse.tiles_mut() {
        tile.init_boundary(min_dist);
        for fine_tile in fine.tiles() {
            let c = fine_tile.bounds.center();
            if !tile.bounds.contains_xz(Vec3::new(c.x, 0.0, c.z)) {
                continue;
            }
            failures += merge_from(tile, fine_tile, min_dist);
        }
    }
    if failures > 0 {
        log::warn!("Cross-LOD stitching finished with {} failed merges", failures);
    }
    failures
}
