//! Height/normal provider trait

use crate::core::types::{Vec2, Vec3};
use crate::math::Aabb;

/// Source of surface height and normals for the sampler.
pub trait HeightProvider {
    /// World footprint covered by this provider. `(u, v)` passed to
    /// [`interpolated_normal`](Self::interpolated_normal) are normalized over it.
    fn bounds(&self) -> Aabb;

    /// Surface height at world position (x, z)
    fn height(&self, x: f32, z: f32) -> f32;

    /// Surface normal at normalized coordinates (u, v) in [0, 1]
    fn interpolated_normal(&self, u: f32, v: f32) -> Vec3;

    /// Height and normal under `pos`. The returned height replaces `pos.y`.
    fn sample(&self, pos: Vec3) -> (f32, Vec3) {
        let bounds = self.bounds();
        let size = bounds.size();
        let u = if size.x > 0.0 { (pos.x - bounds.min.x) / size.x } else { 0.0 };
        let v = if size.z > 0.0 { (pos.z - bounds.min.z) / size.z } else { 0.0 };
        (
            self.height(pos.x, pos.z),
            self.interpolated_normal(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0)),
        )
    }
}

/// Surface normal from central differences.
///
/// `left`/`right` are sampled at x ∓ `step.x`, `down`/`up` at z ∓ `step.y`.
pub fn normal_from_heights(left: f32, right: f32, down: f32, up: f32, step: Vec2) -> Vec3 {
    Vec3::new(
        (left - right) * step.y,
        2.0 * step.x * step.y,
        (down - up) * step.x,
    )
    .normalize_or(Vec3::Y)
}

/// Height provider backed by a closure, normals by central differences.
pub struct FnHeightField<F>
where
    F: Fn(f32, f32) -> f32,
{
    bounds: Aabb,
    func: F,
    step: f32,
}

impl<F> FnHeightField<F>
where
    F: Fn(f32, f32) -> f32,
{
    /// `step` is the finite difference distance used for normals.
    pub fn new(bounds: Aabb, step: f32, func: F) -> Self {
        Self { bounds, func, step }
    }
}

impl<F> HeightProvider for FnHeightField<F>
where
    F: Fn(f32, f32) -> f32,
{
    fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn height(&self, x: f32, z: f32) -> f32 {
        (self.func)(x, z)
    }

    fn interpolated_normal(&self, u: f32, v: f32) -> Vec3 {
        let size = self.bounds.size();
        let x = self.bounds.min.x + u * size.x;
        let z = self.bounds.min.z + v * size.z;
        let d = self.step;
        normal_from_heights(
            self.height(x - d, z),
            self.height(x + d, z),
            self.height(x, z - d),
            self.height(x, z + d),
            Vec2::splat(d),
        )
    }
}
