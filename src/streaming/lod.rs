//! Screen-coverage LOD selection
//!
//! A tile's projected size in pixels, divided by the screen width, is its
//! screen coverage. The policy maps coverage to a LOD level using one
//! threshold per level, finest first.

use serde::{Deserialize, Serialize};

/// Default coverage thresholds for three LOD levels
pub const DEFAULT_SCREEN_COVER: [f32; 3] = [0.25, 0.1, 0.0];

/// Per-level screen coverage thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodPolicy {
    /// Coverage at or above `screen_cover[i]` selects LOD `i`
    pub screen_cover: Vec<f32>,
}

impl Default for LodPolicy {
    fn default() -> Self {
        Self {
            screen_cover: DEFAULT_SCREEN_COVER.to_vec(),
        }
    }
}

impl LodPolicy {
    pub fn new(screen_cover: Vec<f32>) -> Self {
        Self { screen_cover }
    }

    /// LOD level for a node of `pixel_size` on a screen `screen_w` wide
    ///
    /// Returns the first level whose threshold the coverage reaches, or 0 when
    /// none does.
    ///
    /// # Examples
    /// ```
    /// use terramesh::streaming::lod::LodPolicy;
    ///
    /// let policy = LodPolicy::new(vec![0.5, 0.2, 0.05]);
    /// assert_eq!(policy.level_for(800.0, 1000.0), 0);
    /// assert_eq!(policy.level_for(300.0, 1000.0), 1);
    /// assert_eq!(policy.level_for(60.0, 1000.0), 2);
    /// assert_eq!(policy.level_for(10.0, 1000.0), 0); // below every threshold
    /// ```
    pub fn level_for(&self, pixel_size: f32, screen_w: f32) -> u8 {
        if screen_w <= 0.0 {
            return 0;
        }
        let rate = pixel_size / screen_w;
        self.screen_cover
            .iter()
            .position(|&threshold| rate >= threshold)
            .map_or(0, |level| level.min(u8::MAX as usize) as u8)
    }

    pub fn level_count(&self) -> usize {
        self.screen_cover.len()
    }
}
