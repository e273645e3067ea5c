//! One sampled tile: its tree, flattened vertices and per-tag border lists

use std::collections::BTreeMap;

use super::border_index::BorderIndex;
use super::tree::SamplerNode;
use super::vertex::{BorderTag, SampleVertex};
use crate::core::types::{Result, Vec2, Vec3};
use crate::core::Error;
use crate::heightfield::HeightProvider;
use crate::math::Aabb;

/// A tile of one LOD grid
#[derive(Debug)]
pub struct SamplerTile {
    root: SamplerNode,
    subdivision: u32,
    pub bounds: Aabb,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
    pub vertices: Vec<SampleVertex>,
    pub boundaries: BTreeMap<BorderTag, Vec<SampleVertex>>,
    stitched: u8,
    border_index: BTreeMap<BorderTag, BorderIndex>,
}

impl SamplerTile {
    /// Tile with a full sampler tree of depth `subdivision` over `bounds`
    pub fn new(bounds: Aabb, subdivision: u32, uv_min: Vec2, uv_max: Vec2) -> Self {
        let size = bounds.size();
        let center = Vec3::new(bounds.center().x, bounds.max.y, bounds.center().z);
        let root = SamplerNode::build_full(
            subdivision,
            center,
            Vec2::new(size.x, size.z),
            0.5 * (uv_min + uv_max),
            uv_max - uv_min,
        );
        Self {
            root,
            subdivision,
            bounds,
            uv_min,
            uv_max,
            vertices: Vec::new(),
            boundaries: BTreeMap::new(),
            stitched: 0,
            border_index: BTreeMap::new(),
        }
    }

    pub fn subdivision(&self) -> u32 {
        self.subdivision
    }

    /// Number of finest cells per tile side
    pub fn detail(&self) -> u32 {
        1 << self.subdivision
    }

    pub fn root(&self) -> &SamplerNode {
        &self.root
    }

    pub fn run_sampler(&mut self, provider: &dyn HeightProvider) {
        self.root.run_sample(provider);
    }

    /// Attach a border sample to finest cell (x, z) of this tile
    pub fn add_boundary(&mut self, x: u32, z: u32, tag: BorderTag, vertex: SampleVertex) {
        self.root.add_boundary(self.subdivision, x, z, tag, vertex);
    }

    /// Reset border lists before merging samples from a finer LOD
    pub fn init_boundary(&mut self, cell_size: f32) {
        self.boundaries.clear();
        self.border_index.clear();
        for tag in BorderTag::ALL {
            self.boundaries.insert(tag, Vec::new());
            self.border_index.insert(tag, BorderIndex::new(cell_size));
        }
    }

    /// Merge border samples into `tag`, skipping points within `min_dist` of
    /// one already present.
    pub fn merge_boundary(&mut self, tag: BorderTag, min_dist: f32, src: &[SampleVertex]) -> Result<()> {
        let (Some(list), Some(index)) = (self.boundaries.get_mut(&tag), self.border_index.get_mut(&tag)) else {
            log::error!("Merge into uninitialised border {:?} of tile {:?}", tag, self.bounds);
            return Err(Error::Topology(format!("border {:?} not initialised", tag)));
        };

        for vertex in src {
            let p = vertex.xz();
            if index.contains_within(p, min_dist) {
                continue;
            }
            index.insert(p);
            list.push(*vertex);
        }
        Ok(())
    }

    /// Simplify the tree (when `angle_err > 0`) and flatten it into
    /// `vertices` and the border lists.
    pub fn fill_data(&mut self, angle_err: f32) {
        if angle_err > 0.0 {
            self.root.combine(angle_err);
        }
        self.vertices.clear();
        self.root.collect(&mut self.vertices, &mut self.boundaries);
    }

    pub fn is_stitched(&self, tag: BorderTag) -> bool {
        self.stitched & (1 << tag.code()) != 0
    }

    fn mark_stitched(&mut self, tag: BorderTag) {
        self.stitched |= 1 << tag.code();
    }

    /// Make this tile's `tag` edge and the neighbour's `neighbour_tag` edge
    /// identical. The side with more samples is copied onto the other.
    pub fn stitch_border(
        &mut self,
        tag: BorderTag,
        neighbour: &mut SamplerTile,
        neighbour_tag: BorderTag,
    ) -> Result<()> {
        if tag.is_corner() || neighbour_tag.is_corner() {
            return Err(Error::Topology(format!(
                "corner tags {:?}/{:?} are not stitched as edges",
                tag, neighbour_tag
            )));
        }
        if self.is_stitched(tag) && neighbour.is_stitched(neighbour_tag) {
            return Ok(());
        }

        let (Some(mine), Some(theirs)) = (
            self.boundaries.get(&tag),
            neighbour.boundaries.get(&neighbour_tag),
        ) else {
            log::error!(
                "Stitch {:?}/{:?} between {:?} and {:?}: border missing",
                tag,
                neighbour_tag,
                self.bounds,
                neighbour.bounds
            );
            return Err(Error::Topology(format!("border {:?}/{:?} missing", tag, neighbour_tag)));
        };

        if mine.len() > theirs.len() {
            let copy = mine.clone();
            neighbour.boundaries.insert(neighbour_tag, copy);
        } else {
            let copy = theirs.clone();
            self.boundaries.insert(tag, copy);
        }

        self.mark_stitched(tag);
        neighbour.mark_stitched(neighbour_tag);
        Ok(())
    }

    /// Append border samples to the vertex list, dropping any within
    /// `min_dist` of a border sample already appended.
    pub fn append_boundaries(&mut self, min_dist: f32) {
        let mut index = BorderIndex::new(min_dist);
        for list in self.boundaries.values() {
            for vertex in list {
                let p = vertex.xz();
                if index.contains_within(p, min_dist) {
                    continue;
                }
                index.insert(p);
                self.vertices.push(*vertex);
            }
        }
    }
}
