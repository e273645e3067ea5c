//! Runtime quadtree node

use crate::core::types::{RAD_TO_DEG, Vec3};
use crate::math::Aabb;

/// Mesh id of a node without a mesh
pub const NO_MESH: i32 = -1;

/// LOD byte stored for nodes without a mesh
pub const NO_LOD: u8 = u8::MAX;

/// One node of the flattened tile quadtree
#[derive(Clone, Debug, PartialEq)]
pub struct QuadTreeNode {
    pub bounds: Aabb,
    /// Tile mesh drawn for this node, [`NO_MESH`] for structural nodes
    pub mesh_id: i32,
    /// Index of this node in the flattened array
    pub cell_index: i32,
    pub lod_level: u8,
    pub children: Vec<i32>,
    diameter: f32,
}

impl QuadTreeNode {
    pub fn new(bounds: Aabb, mesh_id: i32, cell_index: i32, lod_level: u8, children: Vec<i32>) -> Self {
        Self {
            bounds,
            mesh_id,
            cell_index,
            lod_level,
            children,
            diameter: bounds.horizontal_diagonal(),
        }
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh_id >= 0
    }

    /// Diagonal of the node's XZ footprint
    pub fn diameter(&self) -> f32 {
        self.diameter
    }

    /// Approximate projected size in pixels
    ///
    /// `fov` is the vertical field of view in degrees.
    pub fn pixel_size(&self, view_center: Vec3, fov: f32, screen_h: f32) -> f32 {
        let distance = view_center.distance(self.bounds.center()).max(f32::EPSILON);
        self.diameter * RAD_TO_DEG * screen_h / (distance * fov)
    }
}
