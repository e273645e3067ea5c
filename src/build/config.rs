//! Offline build configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::core::Error;
use crate::math::Aabb;
use crate::sampler::{LodSetting, MAX_SUBDIVISION};
use crate::streaming::LodPolicy;

/// Largest supported grid depth (2^10 tiles per side)
pub const MAX_GRID_DEPTH: u32 = 10;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// LOD 0 grid depth; the dataset is cut into 2^depth tiles per side
    pub depth: u32,
    /// Sampling settings, finest LOD first
    pub lods: Vec<LodSetting>,
    /// Meshes per pack file
    pub pack_size: usize,
    /// Pack key prefix
    pub mesh_prefix: String,
    /// Overrides the derived minimum triangle area
    pub min_triangle_area: Option<f32>,
    /// Samples per side of the exported height map
    pub height_map_resolution: usize,
    /// Runtime LOD selection written to the dataset header
    pub lod_policy: LodPolicy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            depth: 3,
            lods: vec![
                LodSetting { subdivision: 3, slope_angle_error: 5.0 },
                LodSetting { subdivision: 3, slope_angle_error: 8.0 },
                LodSetting { subdivision: 2, slope_angle_error: 12.0 },
            ],
            pack_size: 16,
            mesh_prefix: "terrain".into(),
            min_triangle_area: None,
            height_map_resolution: 257,
            lod_policy: LodPolicy::default(),
        }
    }
}

impl BuildConfig {
    pub fn validate(&self) -> Result<()> {
        if self.depth == 0 || self.depth > MAX_GRID_DEPTH {
            return Err(Error::Config(format!(
                "grid depth {} outside 1..={}",
                self.depth, MAX_GRID_DEPTH
            )));
        }
        if self.lods.is_empty() {
            return Err(Error::Config("no LOD settings".into()));
        }
        if let Some(setting) = self.lods.iter().find(|l| l.subdivision > MAX_SUBDIVISION) {
            return Err(Error::Config(format!(
                "subdivision {} outside 1..={}",
                setting.subdivision, MAX_SUBDIVISION
            )));
        }
        let levels = self.lod_policy.level_count();
        if levels > 0 && self.lods.len() > levels {
            log::warn!(
                "{} LODs built but the policy selects only {}",
                self.lods.len(),
                levels
            );
        }
        if self.pack_size == 0 {
            return Err(Error::Config("pack size must be positive".into()));
        }
        if self.mesh_prefix.is_empty() {
            return Err(Error::Config("mesh prefix is empty".into()));
        }
        if self.height_map_resolution < 2 {
            return Err(Error::Config("height map resolution must be at least 2".into()));
        }
        Ok(())
    }

    /// Tiles per side at LOD 0
    pub fn slices(&self) -> u32 {
        1 << self.depth.min(MAX_GRID_DEPTH)
    }

    /// Finest sample spacing over `bounds`
    pub fn min_edge(&self, bounds: &Aabb) -> f32 {
        let size = bounds.size();
        let sub = self.lods.first().map_or(0, |l| l.subdivision);
        size.x.max(size.z) / (self.slices() as f32 * 2f32.powi(sub.min(MAX_SUBDIVISION) as i32))
    }

    pub fn min_triangle_area(&self, bounds: &Aabb) -> f32 {
        self.min_triangle_area.unwrap_or_else(|| {
            let edge = self.min_edge(bounds);
            edge * edge / 8.0
        })
    }

    /// Dedupe distance for cross-LOD boundary merging
    pub fn lod_merge_distance(&self, bounds: &Aabb) -> f32 {
        self.min_edge(bounds) / 4.0
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
