//! 2-byte encoded height map
//!
//! Each sample is two bytes, row-major: byte 0 is the integer part of the
//! height on a 0-255 scale, byte 1 the fractional part scaled to 0-255. The
//! decoded value `hi + lo / 255` is mapped to world space by
//! `value * scale.y / 255 + bounds.min.y`.

use std::path::Path;

use crate::core::types::{Result, Vec2, Vec3};
use crate::core::Error;
use crate::math::Aabb;
use super::provider::{normal_from_heights, HeightProvider};

/// Decoded-on-demand height map over a square grid of samples.
#[derive(Clone, Debug)]
pub struct HeightMap {
    bounds: Aabb,
    resolution: usize,
    /// World units per sample step on each axis (y maps 255 to full height)
    scale: Vec3,
    data: Vec<u8>,
}

impl HeightMap {
    /// Wrap encoded bytes. `data` must hold `resolution²` 2-byte samples.
    pub fn from_bytes(bounds: Aabb, resolution: usize, scale: Vec3, data: Vec<u8>) -> Result<Self> {
        if resolution < 2 {
            return Err(Error::Format(format!("height map resolution {} is too small", resolution)));
        }
        let expected = resolution * resolution * 2;
        if data.len() != expected {
            return Err(Error::Format(format!(
                "height map holds {} bytes, expected {} for resolution {}",
                data.len(),
                expected,
                resolution
            )));
        }
        Ok(Self { bounds, resolution, scale, data })
    }

    /// Encode normalized heights (0..=1, row-major) into the 2-byte format.
    pub fn encode(heights: &[f32], resolution: usize) -> Vec<u8> {
        let mut bytes = vec![0u8; resolution * resolution * 2];
        for (i, h) in heights.iter().take(resolution * resolution).enumerate() {
            let val = h.clamp(0.0, 1.0) * 255.0;
            let hi = val.floor();
            let lo = ((val - hi) * 255.0).floor();
            bytes[i * 2] = hi as u8;
            bytes[i * 2 + 1] = lo as u8;
        }
        bytes
    }

    /// Sample a provider on a `resolution²` grid over its bounds and encode
    /// the result. Returns the bytes and the matching per-axis scale.
    pub fn export(provider: &dyn HeightProvider, resolution: usize) -> (Vec<u8>, Vec3) {
        let bounds = provider.bounds();
        let size = bounds.size();
        let range = size.y.max(f32::EPSILON);
        let steps = (resolution.max(2) - 1) as f32;

        let mut heights = Vec::with_capacity(resolution * resolution);
        for y in 0..resolution {
            for x in 0..resolution {
                let wx = bounds.min.x + size.x * x as f32 / steps;
                let wz = bounds.min.z + size.z * y as f32 / steps;
                heights.push((provider.height(wx, wz) - bounds.min.y) / range);
            }
        }

        let scale = Vec3::new(size.x / steps, range, size.z / steps);
        (Self::encode(&heights, resolution), scale)
    }

    /// Load a 16-bit grayscale image as a height map over `bounds`.
    /// The image must be square; its full range maps to `bounds` height.
    pub fn from_image(path: &Path, bounds: Aabb) -> Result<Self> {
        let img = image::open(path)
            .map_err(|e| Error::Format(format!("{}: {}", path.display(), e)))?
            .into_luma16();
        let (w, h) = img.dimensions();
        if w != h {
            return Err(Error::Format(format!("height image {}x{} is not square", w, h)));
        }
        let resolution = w as usize;
        let heights: Vec<f32> = img.pixels().map(|p| p.0[0] as f32 / u16::MAX as f32).collect();
        let size = bounds.size();
        let steps = (resolution.max(2) - 1) as f32;
        let scale = Vec3::new(size.x / steps, size.y, size.z / steps);
        Self::from_bytes(bounds, resolution, scale, Self::encode(&heights, resolution))
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Decoded value of sample (x, y) on the 0-255 scale
    pub fn sample_raw(&self, x: usize, y: usize) -> f32 {
        let idx = y * self.resolution * 2 + x * 2;
        self.data[idx] as f32 + self.data[idx + 1] as f32 / 255.0
    }

    /// Bilinear value on the 0-255 scale at a world position, clamped to the grid
    fn interpolated_value(&self, pos: Vec3) -> f32 {
        let size = self.bounds.size();
        let last = (self.resolution - 1) as f32;
        let local_x = ((pos.x - self.bounds.min.x) / size.x).clamp(0.0, 1.0) * last;
        let local_y = ((pos.z - self.bounds.min.z) / size.z).clamp(0.0, 1.0) * last;
        let x = local_x.floor() as usize;
        let y = local_y.floor() as usize;
        let tx = local_x - x as f32;
        let ty = local_y - y as f32;
        let x1 = (x + 1).min(self.resolution - 1);
        let y1 = (y + 1).min(self.resolution - 1);

        let y00 = self.sample_raw(x, y);
        let y10 = self.sample_raw(x1, y);
        let y01 = self.sample_raw(x, y1);
        let y11 = self.sample_raw(x1, y1);
        let bottom = y00 + (y10 - y00) * tx;
        let top = y01 + (y11 - y01) * tx;
        bottom + (top - bottom) * ty
    }

    fn to_world(&self, value: f32) -> f32 {
        value * self.scale.y / 255.0 + self.bounds.min.y
    }

    /// Bilinearly interpolated world height, or `None` outside the XZ footprint
    pub fn interpolated_height(&self, pos: Vec3) -> Option<f32> {
        if !self.bounds.contains_xz(pos) {
            return None;
        }
        Some(self.to_world(self.interpolated_value(pos)))
    }

    /// Height of the sample cell containing `pos`, or `None` off the grid
    pub fn height_at(&self, pos: Vec3) -> Option<f32> {
        let local_x = ((pos.x - self.bounds.min.x) / self.scale.x).floor();
        let local_y = ((pos.z - self.bounds.min.z) / self.scale.z).floor();
        if local_x < 0.0 || local_y < 0.0 {
            return None;
        }
        let (x, y) = (local_x as usize, local_y as usize);
        if x >= self.resolution || y >= self.resolution {
            return None;
        }
        Some(self.to_world(self.sample_raw(x, y)))
    }
}

impl HeightProvider for HeightMap {
    fn bounds(&self) -> Aabb {
        self.bounds
    }

    fn height(&self, x: f32, z: f32) -> f32 {
        self.to_world(self.interpolated_value(Vec3::new(x, 0.0, z)))
    }

    fn interpolated_normal(&self, u: f32, v: f32) -> Vec3 {
        let size = self.bounds.size();
        let x = self.bounds.min.x + u * size.x;
        let z = self.bounds.min.z + v * size.z;
        let step = Vec2::new(self.scale.x, self.scale.z);
        normal_from_heights(
            self.height(x - step.x, z),
            self.height(x + step.x, z),
            self.height(x, z - step.y),
            self.height(x, z + step.y),
            step,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_4x4() -> HeightMap {
        // Raw sample values hi + lo/255, row-major
        let mut bytes = Vec::new();
        for y in 0..4u8 {
            for x in 0..4u8 {
                bytes.push(10 * y + x);
                bytes.push(51 * x);
            }
        }
        let bounds = Aabb::new(Vec3::ZERO, Vec3::new(3.0, 255.0, 3.0));
        HeightMap::from_bytes(bounds, 4, Vec3::new(1.0, 255.0, 1.0), bytes).unwrap()
    }

    #[test]
    fn test_sample_raw_decodes_fraction() {
        let map = grid_4x4();
        assert_eq!(map.sample_raw(0, 0), 0.0);
        assert!((map.sample_raw(1, 2) - (21.0 + 51.0 / 255.0)).abs() < 1e-5);
    }

    #[test]
    fn test_mid_cell_is_bilinear_of_corners() {
        let map = grid_4x4();
        let pos = Vec3::new(1.25, 0.0, 2.5);
        let h00 = map.sample_raw(1, 2);
        let h10 = map.sample_raw(2, 2);
        let h01 = map.sample_raw(1, 3);
        let h11 = map.sample_raw(2, 3);
        let (tx, ty) = (0.25, 0.5);
        let expected = (h00 * (1.0 - tx) + h10 * tx) * (1.0 - ty) + (h01 * (1.0 - tx) + h11 * tx) * ty;

        // scale.y = 255 and min.y = 0 make world height equal the raw value
        let h = map.interpolated_height(pos).unwrap();
        assert!((h - expected).abs() < 1e-4, "{} vs {}", h, expected);
    }

    #[test]
    fn test_outside_bounds_is_none() {
        let map = grid_4x4();
        assert!(map.interpolated_height(Vec3::new(-0.5, 0.0, 1.0)).is_none());
        assert!(map.height_at(Vec3::new(1.0, 0.0, 7.0)).is_none());
    }

    #[test]
    fn test_height_at_uses_cell() {
        let map = grid_4x4();
        let h = map.height_at(Vec3::new(2.7, 0.0, 1.2)).unwrap();
        assert!((h - map.sample_raw(2, 1)).abs() < 1e-5);
    }

    #[test]
    fn test_encode_roundtrip_precision() {
        let heights = [0.0, 0.25, 0.5, 1.0];
        let bytes = HeightMap::encode(&heights, 2);
        let bounds = Aabb::new(Vec3::ZERO, Vec3::new(1.0, 255.0, 1.0));
        let map = HeightMap::from_bytes(bounds, 2, Vec3::new(1.0, 255.0, 1.0), bytes).unwrap();
        for (i, h) in heights.iter().enumerate() {
            let decoded = map.sample_raw(i % 2, i / 2) / 255.0;
            assert!((decoded - h).abs() < 1.0 / (255.0 * 255.0) * 2.0);
        }
    }

    #[test]
    fn test_from_bytes_rejects_wrong_length() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let result = HeightMap::from_bytes(bounds, 4, Vec3::ONE, vec![0; 10]);
        assert!(matches!(result, Err(Error::Format(_))));
    }
}
