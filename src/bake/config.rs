//! Bake pipeline configuration

use serde::{Deserialize, Serialize};

use super::backend::LayerId;

/// Global texture resolution scale
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextureQuality {
    #[default]
    Full,
    Half,
    Quarter,
}

impl TextureQuality {
    /// Right shift applied to requested resolutions
    pub fn shift(self) -> u32 {
        match self {
            TextureQuality::Full => 0,
            TextureQuality::Half => 1,
            TextureQuality::Quarter => 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BakeConfig {
    pub min_resolution: u32,
    pub max_resolution: u32,
    /// Bakes executed per pipeline step
    pub max_bakes_per_step: usize,
    pub quality: TextureQuality,
    /// Source layers composited into every bake
    pub layers: Vec<LayerId>,
}

impl Default for BakeConfig {
    fn default() -> Self {
        Self {
            min_resolution: 128,
            max_resolution: 2048,
            max_bakes_per_step: 8,
            quality: TextureQuality::Full,
            layers: vec![0],
        }
    }
}

impl BakeConfig {
    /// Clamp to the configured range and round up to a power of two
    pub fn quantize(&self, resolution: u32) -> u32 {
        let lo = self.min_resolution.max(1);
        let hi = self.max_resolution.max(lo);
        resolution.clamp(lo, hi).next_power_of_two().min(hi.next_power_of_two())
    }

    /// Allocated texture size for a requested resolution
    pub fn texture_size(&self, resolution: u32) -> u32 {
        (resolution >> self.quality.shift()).max(1)
    }
}
