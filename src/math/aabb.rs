//! Axis-aligned bounding box

use crate::core::types::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create AABB from center and full size
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get half-extents
    pub fn half_extent(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Length of the diagonal projected onto the XZ plane
    pub fn horizontal_diagonal(&self) -> f32 {
        let size = self.size();
        Vec2::new(size.x, size.z).length()
    }

    /// Check if point is inside AABB
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Check if point lies inside the XZ footprint, ignoring height
    pub fn contains_xz(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Check if two AABBs intersect
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Translate the box by an offset
    pub fn translated(&self, offset: Vec3) -> Aabb {
        Aabb {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Get child quadrant AABB for quadtree subdivision in XZ.
    /// index: 0-3, bit 0 = +x, bit 1 = +z. Height range is kept.
    pub fn child_quadrant(&self, index: u8) -> Aabb {
        let center = self.center();
        let min = Vec3::new(
            if index & 1 != 0 { center.x } else { self.min.x },
            self.min.y,
            if index & 2 != 0 { center.z } else { self.min.z },
        );
        let max = Vec3::new(
            if index & 1 != 0 { self.max.x } else { center.x },
            self.max.y,
            if index & 2 != 0 { self.max.z } else { center.z },
        );
        Aabb::new(min, max)
    }
}
