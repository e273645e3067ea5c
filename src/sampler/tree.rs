//! Full quadtree of samples over one tile, simplified bottom-up by slope

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use super::vertex::{BorderTag, SampleVertex};
use crate::core::types::{RAD_TO_DEG, Vec2, Vec3};
use crate::heightfield::HeightProvider;

/// Children of a branch, ordered (-x,-z), (+x,-z), (-x,+z), (+x,+z)
pub type Children = Box<[SamplerNode; 4]>;

/// Leaf or branch of the sampler tree
#[derive(Debug)]
pub enum NodeKind {
    Leaf,
    Branch(Children),
}

/// Node of the sampler tree. Center vertex and boundary samples are shared
/// between leaves and branches.
#[derive(Debug)]
pub struct SamplerNode {
    pub vertex: SampleVertex,
    pub boundaries: BTreeMap<BorderTag, SampleVertex>,
    pub kind: NodeKind,
}

impl SamplerNode {
    fn with_kind(center: Vec3, uv: Vec2, kind: NodeKind) -> Self {
        Self {
            vertex: SampleVertex::new(center, uv),
            boundaries: BTreeMap::new(),
            kind,
        }
    }

    /// Build a complete tree `depth` levels below this node.
    ///
    /// `size` is the XZ extent covered by the node, `uv_step` its extent in uv.
    /// A depth of 0 yields a single leaf.
    pub fn build_full(depth: u32, center: Vec3, size: Vec2, uv: Vec2, uv_step: Vec2) -> Self {
        if depth == 0 {
            return Self::with_kind(center, uv, NodeKind::Leaf);
        }

        let offset = size * 0.25;
        let uv_offset = uv_step * 0.25;
        let child = |index: usize| {
            let sx = if index & 1 == 0 { -1.0 } else { 1.0 };
            let sz = if index & 2 == 0 { -1.0 } else { 1.0 };
            let sign = Vec2::new(sx, sz);
            let c = center + Vec3::new(sign.x * offset.x, 0.0, sign.y * offset.y);
            SamplerNode::build_full(depth - 1, c, size * 0.5, uv + sign * uv_offset, uv_step * 0.5)
        };

        let children = Box::new([child(0), child(1), child(2), child(3)]);
        Self::with_kind(center, uv, NodeKind::Branch(children))
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf)
    }

    /// Sample every vertex in the subtree at its own XZ position
    pub fn run_sample(&mut self, provider: &dyn HeightProvider) {
        let (height, normal) = provider.sample(self.vertex.position);
        self.vertex.position.y = height;
        self.vertex.normal = normal;

        if let NodeKind::Branch(children) = &mut self.kind {
            for child in children.iter_mut() {
                child.run_sample(provider);
            }
        }
    }

    /// Attach a border sample to the leaf covering finest-grid cell (x, z).
    ///
    /// `level` is the depth of the subtree below this node, so `x` and `z` are
    /// in `0..2^level`.
    pub fn add_boundary(&mut self, level: u32, x: u32, z: u32, tag: BorderTag, vertex: SampleVertex) {
        match &mut self.kind {
            NodeKind::Leaf => {
                self.boundaries.insert(tag, vertex);
            }
            NodeKind::Branch(children) => {
                let half = 1u32 << level.saturating_sub(1);
                let index = ((z / half).min(1) * 2 + (x / half).min(1)) as usize;
                children[index].add_boundary(level.saturating_sub(1), x % half, z % half, tag, vertex);
            }
        }
    }

    /// Collapse flat subtrees bottom-up.
    ///
    /// A branch whose children are all leaves becomes a leaf when every child
    /// normal is within `angle_err` degrees of the branch normal.
    pub fn combine(&mut self, angle_err: f32) {
        let NodeKind::Branch(children) = &mut self.kind else {
            return;
        };
        for child in children.iter_mut() {
            child.combine(angle_err);
        }
        self.try_collapse(angle_err);
    }

    fn try_collapse(&mut self, angle_err: f32) -> bool {
        let NodeKind::Branch(children) = &self.kind else {
            return false;
        };
        if !children.iter().all(SamplerNode::is_leaf) {
            return false;
        }

        let normal = self.vertex.normal.normalize_or(Vec3::Y);
        let flat = children.iter().all(|child| {
            let dot = child.vertex.normal.normalize_or(Vec3::Y).dot(normal).clamp(-1.0, 1.0);
            dot.acos() * RAD_TO_DEG < angle_err
        });
        if !flat {
            return false;
        }

        if let NodeKind::Branch(children) = std::mem::replace(&mut self.kind, NodeKind::Leaf) {
            let children: [SamplerNode; 4] = *children;
            for child in children {
                for (tag, vertex) in child.boundaries {
                    match self.boundaries.entry(tag) {
                        Entry::Occupied(mut existing) => existing.get_mut().merge(&vertex),
                        Entry::Vacant(slot) => {
                            slot.insert(vertex);
                        }
                    }
                }
            }
        }
        true
    }

    /// Append leaf center vertices and every boundary sample to the outputs
    pub fn collect(
        &self,
        vertices: &mut Vec<SampleVertex>,
        boundaries: &mut BTreeMap<BorderTag, Vec<SampleVertex>>,
    ) {
        match &self.kind {
            NodeKind::Leaf => vertices.push(self.vertex),
            NodeKind::Branch(children) => {
                for child in children.iter() {
                    child.collect(vertices, boundaries);
                }
            }
        }
        for (tag, vertex) in &self.boundaries {
            boundaries.entry(*tag).or_default().push(*vertex);
        }
    }

    /// Number of leaves in the subtree
    pub fn leaf_count(&self) -> usize {
        match &self.kind {
            NodeKind::Leaf => 1,
            NodeKind::Branch(children) => children.iter().map(SamplerNode::leaf_count).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightfield::FnHeightField;
    use crate::math::Aabb;

    fn tree(depth: u32) -> SamplerNode {
        SamplerNode::build_full(
            depth,
            Vec3::new(8.0, 0.0, 8.0),
            Vec2::splat(16.0),
            Vec2::splat(0.5),
            Vec2::ONE,
        )
    }

    fn field<F: Fn(f32, f32) -> f32>(f: F) -> FnHeightField<F> {
        FnHeightField::new(
            Aabb::new(Vec3::ZERO, Vec3::new(16.0, 100.0, 16.0)),
            0.01,
            f,
        )
    }

    #[test]
    fn test_build_full_leaf_count() {
        assert_eq!(tree(0).leaf_count(), 1);
        assert_eq!(tree(1).leaf_count(), 4);
        assert_eq!(tree(3).leaf_count(), 64);
    }

    #[test]
    fn test_child_order_and_uv() {
        let root = tree(1);
        let NodeKind::Branch(children) = &root.kind else {
            panic!("expected branch");
        };
        assert_eq!(children[0].vertex.position, Vec3::new(4.0, 0.0, 4.0));
        assert_eq!(children[1].vertex.position, Vec3::new(12.0, 0.0, 4.0));
        assert_eq!(children[2].vertex.position, Vec3::new(4.0, 0.0, 12.0));
        assert_eq!(children[3].vertex.position, Vec3::new(12.0, 0.0, 12.0));
        assert_eq!(children[3].vertex.uv, Vec2::splat(0.75));
    }

    #[test]
    fn test_flat_field_collapses_to_single_leaf() {
        let mut root = tree(3);
        root.run_sample(&field(|_, _| 5.0));
        root.combine(1.0);
        assert!(root.is_leaf());
        assert_eq!(root.vertex.position.y, 5.0);
    }

    #[test]
    fn test_steep_field_keeps_detail() {
        let mut root = tree(2);
        root.run_sample(&field(|x, _| (x * 0.8).sin() * 10.0));
        root.combine(1.0);
        assert!(root.leaf_count() > 1);
    }

    #[test]
    fn test_zero_angle_never_collapses() {
        let mut root = tree(2);
        root.run_sample(&field(|_, _| 1.0));
        root.combine(0.0);
        assert_eq!(root.leaf_count(), 16);
    }

    #[test]
    fn test_add_boundary_routes_to_cell() {
        let mut root = tree(2);
        let v = SampleVertex::new(Vec3::new(16.0, 0.0, 4.0), Vec2::ZERO);
        root.add_boundary(2, 3, 1, BorderTag::Right, v);

        let NodeKind::Branch(children) = &root.kind else {
            panic!("expected branch");
        };
        let NodeKind::Branch(grand) = &children[1].kind else {
            panic!("expected branch");
        };
        assert_eq!(grand[3].boundaries.get(&BorderTag::Right), Some(&v));
    }

    #[test]
    fn test_collapse_averages_colliding_boundaries() {
        let mut root = tree(1);
        let a = SampleVertex::new(Vec3::new(4.0, 0.0, 0.0), Vec2::ZERO);
        let b = SampleVertex::new(Vec3::new(8.0, 2.0, 0.0), Vec2::ZERO);
        root.add_boundary(1, 0, 0, BorderTag::Bottom, a);
        root.add_boundary(1, 1, 0, BorderTag::Bottom, b);
        root.run_sample(&field(|_, _| 0.0));
        root.combine(5.0);

        assert!(root.is_leaf());
        let merged = root.boundaries[&BorderTag::Bottom];
        assert_eq!(merged.position, Vec3::new(6.0, 1.0, 0.0));
    }

    #[test]
    fn test_collect_groups_by_tag() {
        let mut root = tree(1);
        root.add_boundary(1, 0, 0, BorderTag::LeftBottom, SampleVertex::new(Vec3::ZERO, Vec2::ZERO));
        root.add_boundary(1, 1, 0, BorderTag::Bottom, SampleVertex::new(Vec3::X, Vec2::ZERO));

        let mut vertices = Vec::new();
        let mut boundaries = BTreeMap::new();
        root.collect(&mut vertices, &mut boundaries);
        assert_eq!(vertices.len(), 4);
        assert_eq!(boundaries[&BorderTag::LeftBottom].len(), 1);
        assert_eq!(boundaries[&BorderTag::Bottom].len(), 1);
        assert!(!boundaries.contains_key(&BorderTag::Top));
    }
}
