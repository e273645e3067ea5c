//! Immutable per-tile triangle mesh

use crate::core::types::{Vec2, Vec3};
use crate::math::Aabb;

/// Triangle mesh of one tile at one LOD
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TileMesh {
    /// Running index across all LODs, LOD 0 first
    pub id: i32,
    pub lod_level: u8,
    pub bounds: Aabb,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u16>,
}

impl TileMesh {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    /// Approximate heap footprint
    pub fn memory_size(&self) -> usize {
        self.vertex_bytes().len()
            + self.normal_bytes().len()
            + self.uv_bytes().len()
            + self.index_bytes().len()
    }
}
