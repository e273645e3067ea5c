//! Samples one LOD grid of tiles incrementally and stitches their borders

use super::job::MAX_SUBDIVISION;
use super::tile::SamplerTile;
use super::vertex::{BorderTag, SampleVertex};
use crate::core::types::{Vec2, Vec3};
use crate::heightfield::HeightProvider;
use crate::math::Aabb;

/// Border samples on the outer dataset edge are pulled inward by this much
const OUTER_INSET: f32 = 1e-6;

/// All tiles of one LOD, laid out row-major (`z * grid_x + x`)
#[derive(Debug)]
pub struct LodScanner {
    bounds: Aabb,
    subdivision: u32,
    slope_angle_error: f32,
    grid_x: u32,
    grid_z: u32,
    stitch_border: bool,
    tiles: Vec<SamplerTile>,
}

impl LodScanner {
    pub fn new(
        bounds: Aabb,
        subdivision: u32,
        slope_angle_error: f32,
        grid_x: u32,
        grid_z: u32,
        stitch_border: bool,
    ) -> Self {
        let grid_x = grid_x.max(1);
        let grid_z = grid_z.max(1);
        Self {
            bounds,
            subdivision: subdivision.clamp(1, MAX_SUBDIVISION),
            slope_angle_error,
            grid_x,
            grid_z,
            stitch_border,
            tiles: Vec::with_capacity((grid_x * grid_z) as usize),
        }
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn subdivision(&self) -> u32 {
        self.subdivision
    }

    pub fn grid(&self) -> (u32, u32) {
        (self.grid_x, self.grid_z)
    }

    /// XZ size of one tile
    pub fn tile_size(&self) -> Vec2 {
        let size = self.bounds.size();
        Vec2::new(size.x / self.grid_x as f32, size.z / self.grid_z as f32)
    }

    /// Distance under which two border samples count as the same point
    pub fn stitch_distance(&self) -> f32 {
        let size = self.tile_size();
        size.x.min(size.y) / (1u32 << self.subdivision) as f32 * 0.5
    }

    fn tile_count(&self) -> usize {
        (self.grid_x * self.grid_z) as usize
    }

    pub fn is_done(&self) -> bool {
        self.tiles.len() >= self.tile_count()
    }

    pub fn progress(&self) -> f32 {
        self.tiles.len() as f32 / self.tile_count() as f32
    }

    pub fn tiles(&self) -> &[SamplerTile] {
        &self.tiles
    }

    pub fn into_tiles(self) -> Vec<SamplerTile> {
        self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [SamplerTile] {
        &mut self.tiles
    }

    fn index(&self, x: u32, z: u32) -> usize {
        (z * self.grid_x + x) as usize
    }

    /// Sample the next tile. No-op once every tile is done.
    pub fn step(&mut self, provider: &dyn HeightProvider) {
        if self.is_done() {
            return;
        }
        let i = self.tiles.len() as u32;
        let (x, z) = (i % self.grid_x, i / self.grid_x);

        let tile_size = self.tile_size();
        let min = Vec3::new(
            self.bounds.min.x + x as f32 * tile_size.x,
            self.bounds.min.y,
            self.bounds.min.z + z as f32 * tile_size.y,
        );
        let tile_bounds = Aabb::new(
            min,
            Vec3::new(min.x + tile_size.x, self.bounds.max.y, min.z + tile_size.y),
        );
        let uv_step = Vec2::new(1.0 / self.grid_x as f32, 1.0 / self.grid_z as f32);
        let uv_min = Vec2::new(x as f32, z as f32) * uv_step;

        let mut tile = SamplerTile::new(tile_bounds, self.subdivision, uv_min, uv_min + uv_step);
        tile.run_sampler(provider);
        if self.stitch_border {
            self.sample_border(&mut tile, x, z, provider);
        }
        log::trace!("Sampled tile ({}, {}) of {}x{}", x, z, self.grid_x, self.grid_z);
        self.tiles.push(tile);
    }

    /// World-space sample on the finest dataset grid.
    ///
    /// Positions come from integer grid indices so neighbouring tiles produce
    /// bit-identical border points.
    fn grid_point(&self, gx: u32, gz: u32, provider: &dyn HeightProvider) -> SampleVertex {
        let detail = 1u32 << self.subdivision;
        let total_x = self.grid_x * detail;
        let total_z = self.grid_z * detail;
        let size = self.bounds.size();

        let axis = |g: u32, total: u32, min: f32, extent: f32| {
            let t = g as f32 / total as f32;
            let mut v = min + extent * t;
            if g == 0 {
                v += OUTER_INSET;
            } else if g == total {
                v -= OUTER_INSET;
            }
            v
        };
        let x = axis(gx, total_x, self.bounds.min.x, size.x);
        let z = axis(gz, total_z, self.bounds.min.z, size.z);

        let mut position = Vec3::new(x, self.bounds.max.y, z);
        let (height, normal) = provider.sample(position);
        position.y = height;
        let uv = Vec2::new(
            (x - self.bounds.min.x) / size.x.max(f32::EPSILON),
            (z - self.bounds.min.z) / size.z.max(f32::EPSILON),
        );
        SampleVertex { position, normal, uv }
    }

    fn sample_border(&self, tile: &mut SamplerTile, x: u32, z: u32, provider: &dyn HeightProvider) {
        let d = tile.detail();
        let (gx0, gz0) = (x * d, z * d);
        let last = d - 1;

        tile.add_boundary(0, 0, BorderTag::LeftBottom, self.grid_point(gx0, gz0, provider));
        tile.add_boundary(0, last, BorderTag::LeftTop, self.grid_point(gx0, gz0 + d, provider));
        tile.add_boundary(last, last, BorderTag::RightTop, self.grid_point(gx0 + d, gz0 + d, provider));
        tile.add_boundary(last, 0, BorderTag::RightBottom, self.grid_point(gx0 + d, gz0, provider));

        for u in 1..d {
            tile.add_boundary(u, 0, BorderTag::Bottom, self.grid_point(gx0 + u, gz0, provider));
            tile.add_boundary(u, last, BorderTag::Top, self.grid_point(gx0 + u, gz0 + d, provider));
            tile.add_boundary(0, u, BorderTag::Left, self.grid_point(gx0, gz0 + u, provider));
            tile.add_boundary(last, u, BorderTag::Right, self.grid_point(gx0 + d, gz0 + u, provider));
        }
    }

    /// Simplify every tile, stitch shared corners and edges, then fold border
    /// samples into each tile's vertex list.
    ///
    /// Returns the number of tile pairs whose stitching failed.
    pub fn fill_data(&mut self) -> usize {
        for tile in &mut self.tiles {
            tile.fill_data(self.slope_angle_error);
        }
        if !self.is_done() {
            log::warn!("Filling LOD grid with {} of {} tiles", self.tiles.len(), self.tile_count());
            return 0;
        }

        self.stitch_corners();
        let failures = self.stitch_edges();

        let min_dist = self.stitch_distance();
        for tile in &mut self.tiles {
            tile.append_boundaries(min_dist);
        }
        failures
    }

    /// Average the corner normals of the up to four tiles meeting at each
    /// grid corner.
    fn stitch_corners(&mut self) {
        for cz in 0..=self.grid_z {
            for cx in 0..=self.grid_x {
                let mut members: Vec<(usize, BorderTag)> = Vec::with_capacity(4);
                if cx > 0 && cz > 0 {
                    members.push((self.index(cx - 1, cz - 1), BorderTag::RightTop));
                }
                if cx < self.grid_x && cz > 0 {
                    members.push((self.index(cx, cz - 1), BorderTag::LeftTop));
                }
                if cx > 0 && cz < self.grid_z {
                    members.push((self.index(cx - 1, cz), BorderTag::RightBottom));
                }
                if cx < self.grid_x && cz < self.grid_z {
                    members.push((self.index(cx, cz), BorderTag::LeftBottom));
                }
                if members.len() < 2 {
                    continue;
                }

                let mut sum = Vec3::ZERO;
                let mut found = 0;
                for &(i, tag) in &members {
                    if let Some(v) = self.tiles[i].boundaries.get(&tag).and_then(|l| l.first()) {
                        sum += v.normal;
                        found += 1;
                    }
                }
                if found < members.len() {
                    log::warn!("Corner ({}, {}) missing samples in {} tiles", cx, cz, members.len() - found);
                }
                if found == 0 {
                    continue;
                }

                let normal = sum.normalize_or(Vec3::Y);
                for &(i, tag) in &members {
                    if let Some(v) = self.tiles[i].boundaries.get_mut(&tag).and_then(|l| l.first_mut()) {
                        v.normal = normal;
                    }
                }
            }
        }
    }

    fn stitch_edges(&mut self) -> usize {
        let mut failures = 0;
        for z in 0..self.grid_z {
            for x in 0..self.grid_x {
                let here = self.index(x, z);
                if x + 1 < self.grid_x {
                    let right = self.index(x + 1, z);
                    let (a, b) = pair_mut(&mut self.tiles, here, right);
                    if a.stitch_border(BorderTag::Right, b, BorderTag::Left).is_err() {
                        failures += 1;
                    }
                }
                if z + 1 < self.grid_z {
                    let up = self.index(x, z + 1);
                    let (a, b) = pair_mut(&mut self.tiles, here, up);
                    if a.stitch_border(BorderTag::Top, b, BorderTag::Bottom).is_err() {
                        failures += 1;
                    }
                }
            }
        }
        failures
    }
}

/// Two distinct mutable elements, `a < b`
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    let (lo, hi) = items.split_at_mut(b);
    (&mut lo[a], &mut hi[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::FnHeightField;

    fn bounds() -> Aabb {
        Aabb::new(Vec3::ZERO, Vec3::new(64.0, 50.0, 64.0))
    }

    fn hills(x: f32, z: f32) -> f32 {
        10.0 + (x * 0.3).sin() * 4.0 + (z * 0.2).cos() * 3.0
    }

    fn scan(grid: u32, sub: u32, angle: f32) -> LodScanner {
        let field = FnHeightField::new(bounds(), 0.05, hills);
        let mut scanner = LodScanner::new(bounds(), sub, angle, grid, grid, true);
        while !scanner.is_done() {
            scanner.step(&field);
        }
        scanner
    }

    fn sorted_xz(list: &[SampleVertex]) -> Vec<(i64, i64)> {
        let mut v: Vec<_> = list
            .iter()
            .map(|s| ((s.position.x * 1e4) as i64, (s.position.z * 1e4) as i64))
            .collect();
        v.sort();
        v
    }

    #[test]
    fn test_progress_reaches_one() {
        let field = FnHeightField::new(bounds(), 0.05, hills);
        let mut scanner = LodScanner::new(bounds(), 2, 5.0, 2, 2, true);
        assert_eq!(scanner.progress(), 0.0);
        scanner.step(&field);
        assert_eq!(scanner.progress(), 0.25);
        for _ in 0..10 {
            scanner.step(&field);
        }
        assert!(scanner.is_done());
        assert_eq!(scanner.tiles().len(), 4);
    }

    #[test]
    fn test_border_sample_counts() {
        let mut scanner = scan(2, 2, 0.0);
        assert_eq!(scanner.fill_data(), 0);
        let tile = &scanner.tiles()[0];
        for tag in BorderTag::ALL {
            let expected = if tag.is_corner() { 1 } else { 3 };
            assert_eq!(tile.boundaries[&tag].len(), expected, "{:?}", tag);
        }
        assert_eq!(tile.vertices.len(), 16 + 4 + 12);
    }

    #[test]
    fn test_adjacent_edges_identical_after_fill() {
        let mut scanner = scan(2, 3, 8.0);
        assert_eq!(scanner.fill_data(), 0);
        let tiles = scanner.tiles();
        // (0,0) right edge vs (1,0) left edge
        assert_eq!(
            sorted_xz(&tiles[0].boundaries[&BorderTag::Right]),
            sorted_xz(&tiles[1].boundaries[&BorderTag::Left])
        );
        // (0,0) top edge vs (0,1) bottom edge
        assert_eq!(
            sorted_xz(&tiles[0].boundaries[&BorderTag::Top]),
            sorted_xz(&tiles[2].boundaries[&BorderTag::Bottom])
        );
        assert!(tiles[0].is_stitched(BorderTag::Right));
    }

    #[test]
    fn test_shared_corner_normals_agree() {
        let mut scanner = scan(2, 2, 3.0);
        scanner.fill_data();
        let tiles = scanner.tiles();
        let n0 = tiles[0].boundaries[&BorderTag::RightTop][0].normal;
        let n1 = tiles[1].boundaries[&BorderTag::LeftTop][0].normal;
        let n2 = tiles[2].boundaries[&BorderTag::RightBottom][0].normal;
        let n3 = tiles[3].boundaries[&BorderTag::LeftBottom][0].normal;
        assert_eq!(n0, n1);
        assert_eq!(n0, n2);
        assert_eq!(n0, n3);
        let p0 = tiles[0].boundaries[&BorderTag::RightTop][0].position;
        let p3 = tiles[3].boundaries[&BorderTag::LeftBottom][0].position;
        assert_eq!(p0, p3);
    }

    #[test]
    fn test_outer_border_is_inset() {
        let scanner = scan(1, 1, 0.0);
        let field = FnHeightField::new(bounds(), 0.05, hills);
        let v = scanner.grid_point(0, 0, &field);
        assert!(v.position.x > 0.0 && v.position.x < 1e-3);
        let v = scanner.grid_point(1, 1, &field);
        assert_eq!(v.position.x, 32.0);
    }

    #[test]
    fn test_stitch_distance() {
        let scanner = LodScanner::new(bounds(), 2, 0.0, 4, 4, false);
        assert_eq!(scanner.tile_size(), Vec2::splat(16.0));
        assert_eq!(scanner.stitch_distance(), 2.0);
    }
}
