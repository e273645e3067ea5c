//! Cooperative multi-LOD sampling job

use serde::{Deserialize, Serialize};

use super::lod_stitch::stitch_lod;
use super::scanner::LodScanner;
use crate::core::types::Result;
use crate::core::Error;
use crate::heightfield::HeightProvider;
use crate::math::Aabb;

/// Deepest sampler tree per tile; 4^8 leaves already exceed 16-bit indices
pub const MAX_SUBDIVISION: u32 = 7;

/// Sampling parameters of one LOD
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LodSetting {
    /// Sampler tree depth per tile
    pub subdivision: u32,
    /// Max normal deviation in degrees for collapsing a subtree
    pub slope_angle_error: f32,
}

impl Default for LodSetting {
    fn default() -> Self {
        Self {
            subdivision: 3,
            slope_angle_error: 5.0,
        }
    }
}

/// Samples every LOD one tile per [`step`](Self::step), then stitches them
/// in [`end_process`](Self::end_process). Drop the job to cancel.
#[derive(Debug)]
pub struct BuildJob {
    lods: Vec<LodScanner>,
    current: usize,
    lod_merge_distance: f32,
}

impl BuildJob {
    /// `depth` is the LOD 0 grid depth (2^depth tiles per side). Coarser LODs
    /// drop `max(1, depth / lod_count)` levels each, never below depth 1.
    pub fn new(bounds: Aabb, depth: u32, settings: &[LodSetting], lod_merge_distance: f32) -> Result<Self> {
        if settings.is_empty() {
            log::error!("Build job needs at least one LOD setting");
            return Err(Error::Config("no LOD settings".into()));
        }
        if let Some(setting) = settings.iter().find(|s| s.subdivision > MAX_SUBDIVISION) {
            log::error!("Subdivision {} exceeds {}", setting.subdivision, MAX_SUBDIVISION);
            return Err(Error::Config(format!(
                "subdivision {} outside 1..={}",
                setting.subdivision, MAX_SUBDIVISION
            )));
        }

        let stride = (depth / settings.len() as u32).max(1);
        let lods = settings
            .iter()
            .enumerate()
            .map(|(i, setting)| {
                let lod_depth = depth.saturating_sub(i as u32 * stride).max(1);
                let slices = 1u32 << lod_depth;
                log::debug!(
                    "LOD {}: {}x{} tiles, subdivision {}",
                    i,
                    slices,
                    slices,
                    setting.subdivision
                );
                LodScanner::new(
                    bounds,
                    setting.subdivision,
                    setting.slope_angle_error,
                    slices,
                    slices,
                    i == 0,
                )
            })
            .collect();

        Ok(Self {
            lods,
            current: 0,
            lod_merge_distance,
        })
    }

    pub fn is_done(&self) -> bool {
        self.current >= self.lods.len()
    }

    /// Fraction of tiles sampled across all LODs
    pub fn progress(&self) -> f32 {
        if self.is_done() {
            return 1.0;
        }
        (self.current as f32 + self.lods[self.current].progress()) / self.lods.len() as f32
    }

    /// Sample one tile of the current LOD
    pub fn step(&mut self, provider: &dyn HeightProvider) {
        let Some(scanner) = self.lods.get_mut(self.current) else {
            return;
        };
        scanner.step(provider);
        if scanner.is_done() {
            log::debug!("LOD {} sampled", self.current);
            self.current += 1;
        }
    }

    /// Fill LOD 0, then each coarser LOD from the one before it.
    ///
    /// Returns the number of stitching failures across all LODs.
    pub fn end_process(&mut self) -> usize {
        let mut failures = 0;
        for i in 0..self.lods.len() {
            if i > 0 {
                let (finer, coarser) = self.lods.split_at_mut(i);
                failures += stitch_lod(&mut coarser[0], &finer[i - 1], self.lod_merge_distance);
            }
            failures += self.lods[i].fill_data();
        }
        failures
    }

    pub fn lods(&self) -> &[LodScanner] {
        &self.lods
    }

    pub fn into_lods(self) -> Vec<LodScanner> {
        self.lods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec3;
    use crate::heightfield::FnHeightField;

    fn bounds() -> Aabb {
        Aabb::new(Vec3::ZERO, Vec3::new(64.0, 30.0, 64.0))
    }

    #[test]
    fn test_empty_settings_rejected() {
        assert!(matches!(BuildJob::new(bounds(), 2, &[], 0.5), Err(Error::Config(_))));
    }

    #[test]
    fn test_deep_subdivision_rejected() {
        crate::core::logging::init_test();
        let settings = [LodSetting {
            subdivision: MAX_SUBDIVISION + 1,
            slope_angle_error: 5.0,
        }];
        assert!(matches!(BuildJob::new(bounds(), 2, &settings, 0.5), Err(Error::Config(_))));
    }

    #[test]
    fn test_lod_grid_depths() {
        let settings = [LodSetting::default(); 3];
        let job = BuildJob::new(bounds(), 3, &settings, 0.5).unwrap();
        let grids: Vec<_> = job.lods().iter().map(|l| l.grid()).collect();
        assert_eq!(grids, vec![(8, 8), (4, 4), (2, 2)]);

        let job = BuildJob::new(bounds(), 1, &settings, 0.5).unwrap();
        assert!(job.lods().iter().all(|l| l.grid() == (2, 2)));
    }

    #[test]
    fn test_run_to_completion() {
        let field = FnHeightField::new(bounds(), 0.05, |x: f32, z: f32| (x * 0.2).sin() * 3.0 + z * 0.05);
        let settings = [
            LodSetting { subdivision: 2, slope_angle_error: 2.0 },
            LodSetting { subdivision: 2, slope_angle_error: 6.0 },
        ];
        let mut job = BuildJob::new(bounds(), 2, &settings, 0.5).unwrap();

        let mut last = job.progress();
        while !job.is_done() {
            job.step(&field);
            assert!(job.progress() >= last);
            last = job.progress();
        }
        assert_eq!(job.progress(), 1.0);
        assert_eq!(job.end_process(), 0);

        let lods = job.into_lods();
        assert_eq!(lods[0].tiles().len(), 16);
        assert_eq!(lods[1].tiles().len(), 4);
        assert!(lods[1].tiles().iter().all(|t| t.vertices.len() >= 3));
    }
}
