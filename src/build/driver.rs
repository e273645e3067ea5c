//! Cooperative dataset build
//!
//! [`DatasetBuilder::step`] advances one unit of work: one sampled tile, one
//! assembled mesh, the quadtree index, or one packed mesh. Dropping the
//! builder between steps cancels the build.

use super::config::BuildConfig;
use super::dataset::{Dataset, DatasetHeader};
use crate::core::types::Result;
use crate::core::Error;
use crate::heightfield::{HeightMap, HeightProvider};
use crate::math::Aabb;
use crate::mesh::{TessellationJob, TileMesh};
use crate::quadtree;
use crate::sampler::BuildJob;
use crate::streaming::MeshPackWriter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildPhase {
    Scanning,
    Tessellating,
    Indexing,
    Packing,
    Done,
    /// A step returned an error; the builder accepts no more work
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BuildProgress {
    pub phase: BuildPhase,
    /// Completion of the current phase in [0, 1]
    pub fraction: f32,
}

enum Stage {
    Scanning(BuildJob),
    Tessellating(TessellationJob),
    Indexing(Vec<TileMesh>),
    Packing {
        meshes: Vec<TileMesh>,
        writer: MeshPackWriter,
        next: usize,
    },
    Done(Dataset),
    Failed,
}

pub struct DatasetBuilder<'a> {
    config: BuildConfig,
    provider: &'a dyn HeightProvider,
    bounds: Aabb,
    min_triangle_area: f32,
    lod_count: usize,
    stage: Stage,
    tree_bytes: Vec<u8>,
    node_count: usize,
    rejected: Vec<i32>,
    stitch_failures: usize,
}

impl<'a> DatasetBuilder<'a> {
    pub fn new(config: BuildConfig, provider: &'a dyn HeightProvider) -> Result<Self> {
        if let Err(err) = config.validate() {
            log::error!("Invalid build config: {}", err);
            return Err(err);
        }
        let bounds = provider.bounds();
        let job = BuildJob::new(bounds, config.depth, &config.lods, config.lod_merge_distance(&bounds))?;
        let min_triangle_area = config.min_triangle_area(&bounds);

        log::info!(
            "Building {}x{} tiles over {:?}..{:?}, {} LODs, min triangle area {:.4}",
            config.slices(),
            config.slices(),
            bounds.min,
            bounds.max,
            config.lods.len(),
            min_triangle_area
        );

        Ok(Self {
            lod_count: config.lods.len(),
            config,
            provider,
            bounds,
            min_triangle_area,
            stage: Stage::Scanning(job),
            tree_bytes: Vec::new(),
            node_count: 0,
            rejected: Vec::new(),
            stitch_failures: 0,
        })
    }

    pub fn phase(&self) -> BuildPhase {
        match &self.stage {
            Stage::Scanning(_) => BuildPhase::Scanning,
            Stage::Tessellating(_) => BuildPhase::Tessellating,
            Stage::Indexing(_) => BuildPhase::Indexing,
            Stage::Packing { .. } => BuildPhase::Packing,
            Stage::Done(_) => BuildPhase::Done,
            Stage::Failed => BuildPhase::Failed,
        }
    }

    pub fn is_done(&self) -> bool {
        self.phase() == BuildPhase::Done
    }

    pub fn is_failed(&self) -> bool {
        self.phase() == BuildPhase::Failed
    }

    pub fn progress(&self) -> BuildProgress {
        let fraction = match &self.stage {
            Stage::Scanning(job) => job.progress(),
            Stage::Tessellating(job) => job.progress(),
            Stage::Indexing(_) => 0.0,
            Stage::Packing { meshes, next, .. } => {
                if meshes.is_empty() {
                    1.0
                } else {
                    *next as f32 / meshes.len() as f32
                }
            }
            Stage::Done(_) => 1.0,
            Stage::Failed => 0.0,
        };
        BuildProgress {
            phase: self.phase(),
            fraction,
        }
    }

    /// Tiles no quadtree node accepted
    pub fn rejected(&self) -> &[i32] {
        &self.rejected
    }

    pub fn stitch_failures(&self) -> usize {
        self.stitch_failures
    }

    /// Advance one unit of work
    ///
    /// An error aborts the build: the builder moves to [`BuildPhase::Failed`]
    /// and every later step fails.
    pub fn step(&mut self) -> Result<BuildProgress> {
        let stage = std::mem::replace(&mut self.stage, Stage::Failed);
        match self.advance(stage) {
            Ok(next) => self.stage = next,
            Err(err) => {
                log::error!("Build aborted: {}", err);
                return Err(err);
            }
        }
        Ok(self.progress())
    }

    fn advance(&mut self, stage: Stage) -> Result<Stage> {
        let next = match stage {
            Stage::Scanning(mut job) => {
                job.step(self.provider);
                if job.is_done() {
                    self.stitch_failures = job.end_process();
                    if self.stitch_failures > 0 {
                        log::warn!("{} border stitches failed", self.stitch_failures);
                    }
                    let job = TessellationJob::new(job.into_lods(), self.min_triangle_area);
                    log::info!("Sampling done, assembling {} tiles", job.tile_count());
                    Stage::Tessellating(job)
                } else {
                    Stage::Scanning(job)
                }
            }
            Stage::Tessellating(mut job) => {
                job.step()?;
                if job.is_done() {
                    Stage::Indexing(job.into_meshes())
                } else {
                    Stage::Tessellating(job)
                }
            }
            Stage::Indexing(mut meshes) => {
                // Insertion assigns each mesh its uv rect, so it precedes packing
                let (root, rejected) = quadtree::build_tree(self.config.depth, self.bounds, &mut meshes);
                let nodes = root.flatten();
                self.tree_bytes = quadtree::encode(&nodes);
                self.node_count = nodes.len();
                self.rejected = rejected;
                if !self.rejected.is_empty() {
                    log::warn!("{} tiles missing from the quadtree", self.rejected.len());
                }
                log::info!("Indexed {} nodes", self.node_count);
                Stage::Packing {
                    meshes,
                    writer: MeshPackWriter::new(self.config.mesh_prefix.clone(), self.config.pack_size),
                    next: 0,
                }
            }
            Stage::Packing {
                meshes,
                mut writer,
                next,
            } => match meshes.get(next) {
                Some(mesh) => {
                    writer.push(mesh)?;
                    Stage::Packing {
                        meshes,
                        writer,
                        next: next + 1,
                    }
                }
                None => Stage::Done(self.finish(meshes.len(), writer)),
            },
            Stage::Done(dataset) => Stage::Done(dataset),
            Stage::Failed => {
                return Err(Error::Config("build already failed".into()));
            }
        };
        Ok(next)
    }

    fn finish(&mut self, tile_count: usize, writer: MeshPackWriter) -> Dataset {
        let packs = writer.finish();
        let (height_map_bytes, height_map_scale) =
            HeightMap::export(self.provider, self.config.height_map_resolution);
        log::info!("Packed {} tiles into {} packs", tile_count, packs.len());

        Dataset {
            header: DatasetHeader {
                pack_size: self.config.pack_size,
                mesh_prefix: self.config.mesh_prefix.clone(),
                bounds: self.bounds,
                height_map_resolution: self.config.height_map_resolution,
                height_map_scale,
                node_count: self.node_count,
                tile_count,
                lod_count: self.lod_count,
                lod_policy: self.config.lod_policy.clone(),
            },
            tree_bytes: std::mem::take(&mut self.tree_bytes),
            packs,
            height_map_bytes,
        }
    }

    /// Take the finished dataset
    pub fn into_dataset(self) -> Result<Dataset> {
        match self.stage {
            Stage::Done(dataset) => Ok(dataset),
            Stage::Failed => Err(Error::Config("build failed".into())),
            _ => Err(Error::Config("build not finished".into())),
        }
    }
}

/// Run a build to completion
pub fn build_dataset(config: BuildConfig, provider: &dyn HeightProvider) -> Result<Dataset> {
    let mut builder = DatasetBuilder::new(config, provider)?;
    while !builder.is_done() {
        builder.step()?;
    }
    builder.into_dataset()
}
