//! Spatial lookup over several height maps
//!
//! Replaces a process-wide map table: the application owns a registry, fills
//! it when a dataset loads and drops it when the dataset goes away. All
//! registered maps must share one footprint size so a position can be turned
//! into a bucket id without searching.

use std::collections::HashMap;

use crate::core::types::{Result, Vec3};
use crate::core::Error;
use super::height_map::HeightMap;

/// Bucketed collection of equally sized height maps.
#[derive(Default)]
pub struct HeightMapRegistry {
    maps: HashMap<u32, HeightMap>,
    map_width: i64,
    map_height: i64,
    half_range: f64,
}

impl HeightMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket_id(&self, pos: Vec3) -> u32 {
        // Shift into positive range so each axis fits 16 bits of buckets
        let x = (pos.x as f64 + self.half_range).ceil() as i64 / self.map_width.max(1);
        let z = (pos.z as f64 + self.half_range).ceil() as i64 / self.map_height.max(1);
        ((x as u32 & 0xFFFF) << 16) | (z as u32 & 0xFFFF)
    }

    /// Register a map, returning its bucket id.
    ///
    /// The first map fixes the bucket size; later maps with a different
    /// footprint or an already occupied bucket are rejected.
    pub fn register(&mut self, map: HeightMap) -> Result<u32> {
        let size = map.bounds().size();
        let width = size.x.floor() as i64;
        let height = size.z.floor() as i64;
        if width <= 0 || height <= 0 {
            return Err(Error::Config(format!("height map footprint {}x{} is empty", width, height)));
        }

        if self.maps.is_empty() {
            self.map_width = width;
            self.map_height = height;
            self.half_range = width.max(height) as f64 * i16::MAX as f64;
        }

        if width != self.map_width || height != self.map_height {
            log::error!("height map size is not valid : {}, {}", width, height);
            return Err(Error::Config(format!(
                "height map size {}x{} differs from registered size {}x{}",
                width, height, self.map_width, self.map_height
            )));
        }

        let min = map.bounds().min;
        let id = self.bucket_id(min);
        if self.maps.contains_key(&id) {
            log::error!("height map id overlapped : {}, {}", min.x, min.z);
            return Err(Error::Config(format!("height map at ({}, {}) overlaps an existing map", min.x, min.z)));
        }

        self.maps.insert(id, map);
        Ok(id)
    }

    /// Remove the map whose bucket contains `pos`
    pub fn unregister(&mut self, pos: Vec3) -> Option<HeightMap> {
        let id = self.bucket_id(pos);
        let removed = self.maps.remove(&id);
        if removed.is_none() {
            log::warn!("height map not exist : {}, {}", pos.x, pos.z);
        }
        removed
    }

    /// Bilinear height at `pos` from whichever map covers it
    pub fn height_interpolated(&self, pos: Vec3) -> Option<f32> {
        self.maps.get(&self.bucket_id(pos))?.interpolated_height(pos)
    }

    /// Nearest-sample height at `pos`
    pub fn height_simple(&self, pos: Vec3) -> Option<f32> {
        self.maps.get(&self.bucket_id(pos))?.height_at(pos)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Drop every map
    pub fn clear(&mut self) {
        self.maps.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;

    fn flat_map(min_x: f32, level: u8) -> HeightMap {
        let bounds = Aabb::new(Vec3::new(min_x, 0.0, 0.0), Vec3::new(min_x + 64.0, 255.0, 64.0));
        let mut bytes = vec![0u8; 2 * 2 * 2];
        for i in 0..4 {
            bytes[i * 2] = level;
        }
        HeightMap::from_bytes(bounds, 2, Vec3::new(64.0, 255.0, 64.0), bytes).unwrap()
    }

    #[test]
    fn test_lookup_picks_covering_map() {
        let mut registry = HeightMapRegistry::new();
        registry.register(flat_map(0.0, 10)).unwrap();
        registry.register(flat_map(64.0, 20)).unwrap();
        assert_eq!(registry.len(), 2);

        let a = registry.height_interpolated(Vec3::new(10.0, 0.0, 10.0)).unwrap();
        let b = registry.height_interpolated(Vec3::new(100.0, 0.0, 10.0)).unwrap();
        assert!((a - 10.0).abs() < 1e-4);
        assert!((b - 20.0).abs() < 1e-4);
        assert!(registry.height_simple(Vec3::new(100.0, 0.0, 10.0)).is_some());
    }

    #[test]
    fn test_overlap_rejected() {
        let mut registry = HeightMapRegistry::new();
        registry.register(flat_map(0.0, 10)).unwrap();
        assert!(matches!(registry.register(flat_map(0.0, 30)), Err(Error::Config(_))));
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let mut registry = HeightMapRegistry::new();
        registry.register(flat_map(0.0, 10)).unwrap();
        let bounds = Aabb::new(Vec3::new(64.0, 0.0, 0.0), Vec3::new(96.0, 255.0, 32.0));
        let odd = HeightMap::from_bytes(bounds, 2, Vec3::ONE, vec![0; 8]).unwrap();
        assert!(registry.register(odd).is_err());
    }

    #[test]
    fn test_unregister() {
        let mut registry = HeightMapRegistry::new();
        registry.register(flat_map(0.0, 10)).unwrap();
        assert!(registry.unregister(Vec3::new(0.0, 0.0, 0.0)).is_some());
        assert!(registry.is_empty());
        assert!(registry.height_interpolated(Vec3::new(10.0, 0.0, 10.0)).is_none());
    }
}
