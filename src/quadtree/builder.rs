//! Build-time quadtree that places tile meshes by size and flattens them

use std::collections::VecDeque;

use super::node::{NO_LOD, NO_MESH, QuadTreeNode};
use crate::core::types::Vec2;
use crate::math::Aabb;
use crate::mesh::TileMesh;

/// Node of the full build quadtree
#[derive(Debug)]
pub struct QuadTreeBuildNode {
    pub bounds: Aabb,
    pub mesh_id: i32,
    pub lod_level: Option<u8>,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
    children: Option<Box<[QuadTreeBuildNode; 4]>>,
}

impl QuadTreeBuildNode {
    /// Full quadtree `depth` levels deep; children ordered (-x,-z), (+x,-z),
    /// (-x,+z), (+x,+z).
    pub fn new(depth: u32, bounds: Aabb, uv_min: Vec2, uv_max: Vec2) -> Self {
        let children = (depth > 0).then(|| {
            let uv_center = 0.5 * (uv_min + uv_max);
            let child = |index: u8| {
                let child_bounds = bounds.child_quadrant(index);
                let ux = index & 1 != 0;
                let uz = index & 2 != 0;
                let child_uv_min = Vec2::new(
                    if ux { uv_center.x } else { uv_min.x },
                    if uz { uv_center.y } else { uv_min.y },
                );
                let child_uv_max = Vec2::new(
                    if ux { uv_max.x } else { uv_center.x },
                    if uz { uv_max.y } else { uv_center.y },
                );
                QuadTreeBuildNode::new(depth - 1, child_bounds, child_uv_min, child_uv_max)
            };
            Box::new([child(0), child(1), child(2), child(3)])
        });

        Self {
            bounds,
            mesh_id: NO_MESH,
            lod_level: None,
            uv_min,
            uv_max,
            children,
        }
    }

    pub fn children(&self) -> Option<&[QuadTreeBuildNode; 4]> {
        self.children.as_deref()
    }

    /// Place `mesh` at the first node (top-down) containing its center whose
    /// size is less than twice the mesh's. The mesh takes the node's uv rect.
    pub fn insert(&mut self, mesh: &mut TileMesh) -> bool {
        let center = mesh.bounds.center();
        if !self.bounds.contains_xz(center) {
            return false;
        }

        if mesh.bounds.size().x > 0.5 * self.bounds.size().x {
            if self.mesh_id != NO_MESH {
                log::warn!(
                    "Node {:?} already holds mesh {}, rejecting mesh {}",
                    self.bounds,
                    self.mesh_id,
                    mesh.id
                );
                return false;
            }
            self.mesh_id = mesh.id;
            self.lod_level = Some(mesh.lod_level);
            mesh.uv_min = self.uv_min;
            mesh.uv_max = self.uv_max;
            return true;
        }

        match &mut self.children {
            Some(children) => children.iter_mut().any(|child| child.insert(mesh)),
            None => false,
        }
    }

    /// Total node count
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .map_or(0, |c| c.iter().map(QuadTreeBuildNode::node_count).sum())
    }

    fn to_node(&self, cell_index: i32) -> QuadTreeNode {
        QuadTreeNode::new(
            self.bounds,
            self.mesh_id,
            cell_index,
            self.lod_level.unwrap_or(NO_LOD),
            Vec::new(),
        )
    }

    /// Flatten breadth-first; the root is node 0 and every node's
    /// `cell_index` is its position in the returned list.
    pub fn flatten(&self) -> Vec<QuadTreeNode> {
        let mut nodes = vec![self.to_node(0)];
        let mut queue = VecDeque::from([(self, 0usize)]);

        while let Some((build, index)) = queue.pop_front() {
            let Some(children) = build.children() else {
                continue;
            };
            let mut ids = Vec::with_capacity(4);
            for child in children {
                let id = nodes.len();
                nodes.push(child.to_node(id as i32));
                ids.push(id as i32);
                queue.push_back((child, id));
            }
            nodes[index].children = ids;
        }
        nodes
    }
}

/// Build a tree over `bounds` and insert every mesh. Returns the tree and the
/// ids of meshes no node accepted.
pub fn build_tree(depth: u32, bounds: Aabb, meshes: &mut [TileMesh]) -> (QuadTreeBuildNode, Vec<i32>) {
    let mut root = QuadTreeBuildNode::new(depth, bounds, Vec2::ZERO, Vec2::ONE);
    let mut rejected = Vec::new();
    for mesh in meshes.iter_mut() {
        if !root.insert(mesh) {
            log::error!("{}", crate::core::Error::Insertion(mesh.id));
            rejected.push(mesh.id);
        }
    }
    (root, rejected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;

    fn world() -> Aabb {
        Aabb::new(Vec3::ZERO, Vec3::new(100.0, 20.0, 100.0))
    }

    fn mesh(id: i32, lod: u8, min: Vec2, size: f32) -> TileMesh {
        TileMesh {
            id,
            lod_level: lod,
            bounds: Aabb::new(
                Vec3::new(min.x, 0.0, min.y),
                Vec3::new(min.x + size, 20.0, min.y + size),
            ),
            ..Default::default()
        }
    }

    #[test]
    fn test_node_count() {
        let root = QuadTreeBuildNode::new(2, world(), Vec2::ZERO, Vec2::ONE);
        assert_eq!(root.node_count(), 21);
        assert_eq!(root.flatten().len(), 21);
    }

    #[test]
    fn test_insert_by_size() {
        let mut root = QuadTreeBuildNode::new(2, world(), Vec2::ZERO, Vec2::ONE);
        let mut fine = mesh(0, 0, Vec2::new(75.0, 0.0), 25.0);
        let mut coarse = mesh(1, 1, Vec2::new(0.0, 50.0), 50.0);
        assert!(root.insert(&mut fine));
        assert!(root.insert(&mut coarse));

        // fine tile at (+x,-z) quadrant then its (+x,-z) child
        assert_eq!(fine.uv_min, Vec2::new(0.75, 0.0));
        assert_eq!(fine.uv_max, Vec2::new(1.0, 0.25));
        assert_eq!(coarse.uv_min, Vec2::new(0.0, 0.5));
        assert_eq!(coarse.uv_max, Vec2::new(0.5, 1.0));

        let children = root.children().unwrap();
        assert_eq!(children[2].mesh_id, 1);
        assert_eq!(children[1].children().unwrap()[1].mesh_id, 0);
    }

    #[test]
    fn test_insert_outside_or_occupied_fails() {
        let mut root = QuadTreeBuildNode::new(1, world(), Vec2::ZERO, Vec2::ONE);
        let mut outside = mesh(0, 0, Vec2::new(200.0, 0.0), 50.0);
        assert!(!root.insert(&mut outside));

        let mut a = mesh(1, 0, Vec2::ZERO, 50.0);
        let mut b = mesh(2, 1, Vec2::ZERO, 50.0);
        assert!(root.insert(&mut a));
        assert!(!root.insert(&mut b));
    }

    #[test]
    fn test_flatten_is_breadth_first() {
        let mut root = QuadTreeBuildNode::new(2, world(), Vec2::ZERO, Vec2::ONE);
        let mut top = mesh(9, 2, Vec2::ZERO, 100.0);
        assert!(root.insert(&mut top));

        let nodes = root.flatten();
        assert_eq!(nodes[0].mesh_id, 9);
        assert_eq!(nodes[0].lod_level, 2);
        assert_eq!(nodes[0].children, vec![1, 2, 3, 4]);
        assert_eq!(nodes[1].children, vec![5, 6, 7, 8]);
        assert_eq!(nodes[4].children, vec![17, 18, 19, 20]);
        assert!(nodes[5].children.is_empty());
        assert_eq!(nodes[1].lod_level, NO_LOD);
        for (i, node) in nodes.iter().enumerate() {
            assert_eq!(node.cell_index, i as i32);
        }
    }

    #[test]
    fn test_build_tree_reports_rejected() {
        let mut meshes = vec![
            mesh(0, 0, Vec2::ZERO, 50.0),
            mesh(1, 0, Vec2::new(500.0, 500.0), 50.0),
        ];
        let (_, rejected) = build_tree(1, world(), &mut meshes);
        assert_eq!(rejected, vec![1]);
    }
}
