//! Per-frame frustum cull and LOD selection over the flattened quadtree

use super::node::QuadTreeNode;
use super::set::FixedSet;
use crate::core::types::{Mat4, Vec3};
use crate::math::{Aabb, Frustum};
use crate::streaming::lod::LodPolicy;

/// Camera state for one cull pass
#[derive(Clone, Copy, Debug)]
pub struct CullParams {
    pub view_center: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub screen_w: f32,
    pub screen_h: f32,
    pub view: Mat4,
    pub proj: Mat4,
}

/// Walks the tree breadth-first and diffs the visible set against the
/// previous pass.
#[derive(Debug)]
pub struct CullWalker {
    nodes: Vec<QuadTreeNode>,
    candidates: Vec<usize>,
    active: FixedSet,
    visible: FixedSet,
    min_cell_size: f32,
}

impl CullWalker {
    pub fn new(nodes: Vec<QuadTreeNode>) -> Self {
        let min_cell_size = nodes
            .iter()
            .map(|n| {
                let size = n.bounds.size();
                size.x.min(size.z)
            })
            .fold(f32::MAX, f32::min);
        let count = nodes.len();
        Self {
            nodes,
            candidates: Vec::with_capacity(count),
            active: FixedSet::new(count),
            visible: FixedSet::new(count),
            min_cell_size,
        }
    }

    pub fn nodes(&self) -> &[QuadTreeNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&QuadTreeNode> {
        self.nodes.get(index)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Smallest node footprint side
    pub fn min_cell_size(&self) -> f32 {
        self.min_cell_size
    }

    /// Root bounds, `None` for an empty tree
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|n| n.bounds)
    }

    /// Node indices currently shown
    pub fn active(&self) -> &[usize] {
        self.active.as_slice()
    }

    /// Drop one node from the shown set so the next cull activates it again
    pub fn forget(&mut self, index: usize) -> bool {
        self.active.remove(index)
    }

    /// Forget everything shown; the next cull activates from scratch
    pub fn reset(&mut self) {
        self.candidates.clear();
        self.active.reset();
        self.visible.reset();
    }

    /// Select the visible nodes for this view.
    ///
    /// Newly visible node indices are appended to `activate`, no longer
    /// visible ones to `deactivate`. A mesh node whose LOD is at or below the
    /// policy level for its screen size is shown and its subtree skipped.
    pub fn cull(
        &mut self,
        params: &CullParams,
        policy: &LodPolicy,
        activate: &mut Vec<usize>,
        deactivate: &mut Vec<usize>,
    ) {
        if self.nodes.is_empty() {
            return;
        }
        let frustum = Frustum::from_matrices(&params.proj, &params.view);

        self.visible.reset();
        self.candidates.clear();
        self.candidates.push(0);

        let mut start = 0;
        for _ in 0..self.nodes.len() {
            let end = self.candidates.len();
            for c in start..end {
                let node = &self.nodes[self.candidates[c]];
                if node.has_mesh() {
                    let pixel_size = node.pixel_size(params.view_center, params.fov, params.screen_h);
                    if node.lod_level <= policy.level_for(pixel_size, params.screen_w) {
                        self.visible.insert(self.candidates[c]);
                        continue;
                    }
                }
                for &child in &node.children {
                    let child = child as usize;
                    if self
                        .nodes
                        .get(child)
                        .is_some_and(|n| frustum.intersects_aabb(&n.bounds))
                    {
                        self.candidates.push(child);
                    }
                }
            }
            if self.candidates.len() == end {
                break;
            }
            start = end;
        }

        activate.extend(self.visible.iter().filter(|&i| !self.active.contains(i)));
        deactivate.extend(self.active.iter().filter(|&i| !self.visible.contains(i)));
        std::mem::swap(&mut self.active, &mut self.visible);

        log::trace!(
            "Cull: {} candidates, {} visible, +{} -{}",
            self.candidates.len(),
            self.active.len(),
            activate.len(),
            deactivate.len()
        );
    }
}

/// Remembers the last view matrix so culling runs only on camera change
#[derive(Clone, Copy, Debug, Default)]
pub struct ViewTracker {
    last: Option<Mat4>,
}

impl ViewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when `view` differs from the last one seen, and records it
    pub fn changed(&mut self, view: Mat4) -> bool {
        if self.last == Some(view) {
            return false;
        }
        self.last = Some(view);
        true
    }

    /// Force the next check to report a change
    pub fn invalidate(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;
    use crate::mesh::TileMesh;
    use crate::quadtree::QuadTreeBuildNode;
    use crate::quadtree::node::NO_LOD;

    fn params(eye: Vec3, target: Vec3) -> CullParams {
        CullParams {
            view_center: eye,
            fov: 60.0,
            screen_w: 1920.0,
            screen_h: 1080.0,
            view: Mat4::look_at_rh(eye, target, Vec3::Y),
            proj: Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 5000.0),
        }
    }

    fn single_leaf() -> CullWalker {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::new(100.0, 10.0, 100.0));
        CullWalker::new(vec![QuadTreeNode::new(bounds, 0, 0, 0, Vec::new())])
    }

    /// Depth-1 tree: LOD 1 mesh at the root, LOD 0 meshes in the four children
    fn two_level() -> CullWalker {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::new(100.0, 10.0, 100.0));
        let mut root = QuadTreeBuildNode::new(1, bounds, Vec2::ZERO, Vec2::ONE);
        for (id, quadrant) in (0..4u8).enumerate() {
            let mut mesh = TileMesh {
                id: id as i32,
                lod_level: 0,
                bounds: bounds.child_quadrant(quadrant),
                ..Default::default()
            };
            assert!(root.insert(&mut mesh));
        }
        let mut top = TileMesh {
            id: 4,
            lod_level: 1,
            bounds,
            ..Default::default()
        };
        assert!(root.insert(&mut top));
        CullWalker::new(root.flatten())
    }

    #[test]
    fn test_single_leaf_activates_once() {
        let mut walker = single_leaf();
        let p = params(Vec3::new(50.0, 50.0, 200.0), Vec3::new(50.0, 0.0, 50.0));
        let (mut on, mut off) = (Vec::new(), Vec::new());
        walker.cull(&p, &LodPolicy::default(), &mut on, &mut off);
        assert_eq!(on, vec![0]);
        assert!(off.is_empty());

        on.clear();
        walker.cull(&p, &LodPolicy::default(), &mut on, &mut off);
        assert!(on.is_empty());
        assert!(off.is_empty());
        assert_eq!(walker.active(), &[0]);
    }

    #[test]
    fn test_forgotten_node_activates_again() {
        let mut walker = single_leaf();
        let p = params(Vec3::new(50.0, 50.0, 200.0), Vec3::new(50.0, 0.0, 50.0));
        let (mut on, mut off) = (Vec::new(), Vec::new());
        walker.cull(&p, &LodPolicy::default(), &mut on, &mut off);
        assert_eq!(on, vec![0]);

        assert!(walker.forget(0));
        assert!(walker.active().is_empty());
        on.clear();
        walker.cull(&p, &LodPolicy::default(), &mut on, &mut off);
        assert_eq!(on, vec![0]);
        assert!(off.is_empty());
    }

    #[test]
    fn test_far_view_picks_coarse_root() {
        let mut walker = two_level();
        let policy = LodPolicy::new(vec![0.5, 0.0]);
        let far = params(Vec3::new(50.0, 2000.0, 50.01), Vec3::new(50.0, 0.0, 50.0));
        let (mut on, mut off) = (Vec::new(), Vec::new());
        walker.cull(&far, &policy, &mut on, &mut off);
        assert_eq!(on, vec![0]);
        assert_eq!(walker.nodes()[0].mesh_id, 4);
    }

    #[test]
    fn test_near_view_switches_to_children() {
        let mut walker = two_level();
        let policy = LodPolicy::new(vec![0.5, 0.0]);
        let (mut on, mut off) = (Vec::new(), Vec::new());

        let far = params(Vec3::new(50.0, 2000.0, 50.01), Vec3::new(50.0, 0.0, 50.0));
        walker.cull(&far, &policy, &mut on, &mut off);

        on.clear();
        let near = params(Vec3::new(50.0, 60.0, 50.01), Vec3::new(50.0, 0.0, 50.0));
        walker.cull(&near, &policy, &mut on, &mut off);
        let mut activated = on.clone();
        activated.sort();
        assert_eq!(activated, vec![1, 2, 3, 4]);
        assert_eq!(off, vec![0]);
    }

    #[test]
    fn test_children_outside_frustum_skipped() {
        let mut walker = two_level();
        let policy = LodPolicy::new(vec![0.5, 0.0]);
        // low camera looking along +x over the -z half only
        let p = params(Vec3::new(-10.0, 5.0, 10.0), Vec3::new(40.0, 5.0, 10.0));
        let mut p = p;
        p.proj = Mat4::perspective_rh(20f32.to_radians(), 1.0, 0.1, 5000.0);
        let (mut on, mut off) = (Vec::new(), Vec::new());
        walker.cull(&p, &policy, &mut on, &mut off);
        assert!(!on.is_empty());
        for &i in &on {
            assert!(walker.nodes()[i].bounds.min.z < 50.0);
        }
    }

    #[test]
    fn test_reset_reactivates() {
        let mut walker = single_leaf();
        let p = params(Vec3::new(50.0, 50.0, 200.0), Vec3::new(50.0, 0.0, 50.0));
        let (mut on, mut off) = (Vec::new(), Vec::new());
        walker.cull(&p, &LodPolicy::default(), &mut on, &mut off);
        walker.reset();
        on.clear();
        walker.cull(&p, &LodPolicy::default(), &mut on, &mut off);
        assert_eq!(on, vec![0]);
    }

    #[test]
    fn test_structural_nodes_never_visible() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::new(100.0, 10.0, 100.0));
        let root = QuadTreeBuildNode::new(1, bounds, Vec2::ZERO, Vec2::ONE);
        let mut walker = CullWalker::new(root.flatten());
        assert_eq!(walker.nodes()[0].lod_level, NO_LOD);
        let p = params(Vec3::new(50.0, 50.0, 200.0), Vec3::new(50.0, 0.0, 50.0));
        let (mut on, mut off) = (Vec::new(), Vec::new());
        walker.cull(&p, &LodPolicy::default(), &mut on, &mut off);
        assert!(on.is_empty());
        assert_eq!(walker.min_cell_size(), 50.0);
    }

    #[test]
    fn test_view_tracker() {
        let mut tracker = ViewTracker::new();
        let view = Mat4::look_at_rh(Vec3::ONE, Vec3::ZERO, Vec3::Y);
        assert!(tracker.changed(view));
        assert!(!tracker.changed(view));
        tracker.invalidate();
        assert!(tracker.changed(view));
    }
}
