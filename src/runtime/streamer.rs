//! Per-frame terrain streaming
//!
//! Culls the quadtree when the camera moves, fetches meshes for newly visible
//! tiles from the pool, releases hidden ones, and keeps each active tile's
//! baked texture matched to its projected size.

use std::collections::HashMap;
use std::sync::Arc;

use crate::bake::{
    BakeBackend, BakeConfig, BakePipeline, BakeStepStats, TextureSet, TileKey, TileTexture, texture_size_for,
};
use crate::build::DatasetDir;
use crate::core::types::{Mat4, Result, Vec3};
use crate::mesh::TileMesh;
use crate::quadtree::{CullParams, CullWalker, QuadTreeNode, ViewTracker};
use crate::streaming::{FilePackLoader, LodPolicy, MeshPackLoader, MeshPool};

/// Camera state supplied by the host each frame
#[derive(Clone, Copy, Debug)]
pub struct FrameView {
    pub view_center: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub screen_w: f32,
    pub screen_h: f32,
    pub view: Mat4,
    pub proj: Mat4,
}

impl From<&FrameView> for CullParams {
    fn from(frame: &FrameView) -> Self {
        CullParams {
            view_center: frame.view_center,
            fov: frame.fov,
            screen_w: frame.screen_w,
            screen_h: frame.screen_h,
            view: frame.view,
            proj: frame.proj,
        }
    }
}

/// What changed during one [`TerrainStreamer::update`]
#[derive(Clone, Debug, Default)]
pub struct FrameUpdate {
    /// Whether the quadtree was culled this frame
    pub culled: bool,
    /// Mesh ids that became visible, in activation order
    pub activated: Vec<i32>,
    /// Mesh ids hidden this frame
    pub deactivated: Vec<i32>,
    /// Visible mesh ids the pool could not provide
    pub missing: Vec<i32>,
    pub bakes: BakeStepStats,
}

struct ActiveTile {
    node: usize,
    mesh: Arc<TileMesh>,
}

pub struct TerrainStreamer<L: MeshPackLoader, B: BakeBackend> {
    walker: CullWalker,
    tracker: ViewTracker,
    policy: LodPolicy,
    pool: MeshPool<L>,
    bake: BakePipeline<B>,
    tiles: HashMap<i32, ActiveTile>,
    textures: HashMap<TileKey, TileTexture>,
    activate: Vec<usize>,
    deactivate: Vec<usize>,
}

impl<L: MeshPackLoader, B: BakeBackend> TerrainStreamer<L, B> {
    pub fn new(nodes: Vec<QuadTreeNode>, policy: LodPolicy, pool: MeshPool<L>, bake: BakePipeline<B>) -> Self {
        Self {
            walker: CullWalker::new(nodes),
            tracker: ViewTracker::new(),
            policy,
            pool,
            bake,
            tiles: HashMap::new(),
            textures: HashMap::new(),
            activate: Vec::new(),
            deactivate: Vec::new(),
        }
    }

    pub fn walker(&self) -> &CullWalker {
        &self.walker
    }

    pub fn pool(&self) -> &MeshPool<L> {
        &self.pool
    }

    pub fn bake(&self) -> &BakePipeline<B> {
        &self.bake
    }

    pub fn active_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn active_ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.tiles.keys().copied()
    }

    pub fn mesh(&self, id: i32) -> Option<&Arc<TileMesh>> {
        self.tiles.get(&id).map(|t| &t.mesh)
    }

    pub fn texture(&self, id: i32) -> Option<&TileTexture> {
        self.textures.get(&id)
    }

    /// Baked textures of an active tile, if any
    pub fn textures_of(&self, id: i32) -> Option<&TextureSet> {
        self.textures.get(&id).and_then(TileTexture::textures)
    }

    pub fn update(&mut self, frame: &FrameView) -> FrameUpdate {
        let mut update = FrameUpdate::default();

        if self.tracker.changed(frame.view) {
            update.culled = true;
            self.activate.clear();
            self.deactivate.clear();
            self.walker
                .cull(&CullParams::from(frame), &self.policy, &mut self.activate, &mut self.deactivate);

            // Replacements are in place before anything is released
            for i in 0..self.activate.len() {
                let node = self.activate[i];
                self.activate_node(node, &mut update);
            }
            for i in 0..self.deactivate.len() {
                let node = self.deactivate[i];
                self.deactivate_node(node, &mut update);
            }

            self.request_textures(frame);
        }

        update.bakes = self.bake.step(&mut self.textures);
        update
    }

    fn activate_node(&mut self, node: usize, update: &mut FrameUpdate) {
        let Some(id) = self.walker.node(node).map(|n| n.mesh_id) else {
            return;
        };
        match self.pool.get_mesh(id) {
            Ok(mesh) => {
                self.textures
                    .insert(id, TileTexture::new(id, mesh.uv_min, mesh.uv_max));
                self.tiles.insert(id, ActiveTile { node, mesh });
                update.activated.push(id);
            }
            Err(err) => {
                // Unshown so a later cull retries it
                log::warn!("Skipping tile {}: {}", id, err);
                self.walker.forget(node);
                self.tracker.invalidate();
                update.missing.push(id);
            }
        }
    }

    fn deactivate_node(&mut self, node: usize, update: &mut FrameUpdate) {
        let Some(id) = self.walker.node(node).map(|n| n.mesh_id) else {
            return;
        };
        if let Some(mut texture) = self.textures.remove(&id) {
            self.bake.deactivate(&mut texture);
        }
        if self.tiles.remove(&id).is_some() {
            self.pool.release(id);
            update.deactivated.push(id);
        }
    }

    fn request_textures(&mut self, frame: &FrameView) {
        for (id, texture) in self.textures.iter_mut() {
            let Some(node) = self.tiles.get(id).and_then(|t| self.walker.node(t.node)) else {
                continue;
            };
            let size = texture_size_for(
                frame.view_center,
                frame.fov,
                frame.screen_h,
                node.diameter(),
                node.bounds.center(),
            );
            self.bake.request(texture, size);
        }
    }

    /// Hide everything; the next update culls from scratch
    pub fn reset(&mut self) {
        for (_, mut texture) in self.textures.drain() {
            self.bake.deactivate(&mut texture);
        }
        for (id, _) in self.tiles.drain() {
            self.pool.release(id);
        }
        self.walker.reset();
        self.tracker.invalidate();
    }
}

/// Open a dataset directory for streaming
pub async fn open_dataset<B: BakeBackend>(
    dir: &DatasetDir,
    offset: Vec3,
    backend: B,
    bake_config: BakeConfig,
) -> Result<TerrainStreamer<FilePackLoader, B>> {
    let nodes = dir.read_tree(offset).await?;
    let pool = MeshPool::new(dir.pack_loader(), dir.header.mesh_prefix.clone(), dir.header.pack_size);
    log::info!("Opened dataset {:?} with {} nodes", dir.path(), nodes.len());
    Ok(TerrainStreamer::new(
        nodes,
        dir.header.lod_policy.clone(),
        pool,
        BakePipeline::new(backend, bake_config),
    ))
}
