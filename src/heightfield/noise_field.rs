//! Noise-based procedural height field

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

use crate::core::types::{Vec2, Vec3};
use crate::math::Aabb;
use super::provider::{normal_from_heights, HeightProvider};

/// Parameters controlling the procedural height field
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NoiseParams {
    pub seed: u32,
    pub scale: f32,        // Horizontal scale (larger = smoother)
    pub height_scale: f32, // Vertical scale (max height)
    pub octaves: u32,      // FBM octaves (detail levels)
    pub persistence: f32,  // FBM persistence (0.5 typical)
    pub lacunarity: f32,   // FBM lacunarity (2.0 typical)
}

impl Default for NoiseParams {
    fn default() -> Self {
        Self {
            seed: 12345,
            scale: 150.0,
            height_scale: 80.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Fractal Brownian motion height field over a fixed footprint
pub struct NoiseHeightField {
    params: NoiseParams,
    bounds: Aabb,
    noise: Fbm<Perlin>,
    /// Finite difference distance for normals
    normal_step: f32,
}

impl NoiseHeightField {
    /// Create a height field covering `size` (x, z) meters from the origin
    pub fn new(params: NoiseParams, size: Vec2) -> Self {
        let noise = Fbm::<Perlin>::new(params.seed)
            .set_octaves(params.octaves as usize)
            .set_persistence(params.persistence as f64)
            .set_lacunarity(params.lacunarity as f64);

        let bounds = Aabb::new(Vec3::ZERO, Vec3::new(size.x, params.height_scale, size.y));
        let normal_step = (params.scale / 64.0).max(0.01);
        Self { params, bounds, noise, normal_step }
    }

    pub fn params(&self) -> &NoiseParams {
        &self.params
    }
}

impl HeightProvider for NoiseHeightField {
    fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn height(&self, x: f32, z: f32) -> f32 {
        let nx = (x / self.params.scale) as f64;
        let nz = (z / self.params.scale) as f64;

        // [-1, 1] -> [0, height_scale]
        let normalized = (self.noise.get([nx, nz]) + 1.0) / 2.0;
        (normalized.clamp(0.0, 1.0) * self.params.height_scale as f64) as f32
    }

    fn interpolated_normal(&self, u: f32, v: f32) -> Vec3 {
        let size = self.bounds.size();
        let x = self.bounds.min.x + u * size.x;
        let z = self.bounds.min.z + v * size.z;
        let d = self.normal_step;
        normal_from_heights(
            self.height(x - d, z),
            self.height(x + d, z),
            self.height(x, z - d),
            self.height(x, z + d),
            Vec2::splat(d),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_within_range() {
        let field = NoiseHeightField::new(NoiseParams::default(), Vec2::splat(512.0));
        for i in 0..64 {
            let h = field.height(i as f32 * 7.3, i as f32 * 3.1);
            assert!((0.0..=80.0).contains(&h));
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let a = NoiseHeightField::new(NoiseParams::default(), Vec2::splat(256.0));
        let b = NoiseHeightField::new(NoiseParams::default(), Vec2::splat(256.0));
        assert_eq!(a.height(12.5, 99.0), b.height(12.5, 99.0));
    }

    #[test]
    fn test_normals_point_up() {
        let field = NoiseHeightField::new(NoiseParams::default(), Vec2::splat(256.0));
        let n = field.interpolated_normal(0.3, 0.7);
        assert!(n.y > 0.0);
        assert!((n.length() - 1.0).abs() < 1e-4);
    }
}
