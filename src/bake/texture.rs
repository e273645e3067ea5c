//! Per-tile texture receiver

use std::collections::HashMap;

use super::backend::TextureSet;
use super::pool::TexturePool;
use super::request::{BakeRequest, BakeResult, TileKey};
use crate::core::types::Vec2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureState {
    /// No textures and nothing requested
    Idle,
    /// A bake is queued or in flight
    PendingBake,
    /// Textures adopted, nothing outstanding
    Baked,
}

/// Texture state of one active tile
///
/// At most one request is awaited at a time. A new request made while the
/// awaited one is still queued replaces it; one made while it executes is
/// parked and issued when the result arrives.
#[derive(Debug)]
pub struct TileTexture {
    tile: TileKey,
    uv_min: Vec2,
    uv_max: Vec2,
    resolution: Option<u32>,
    awaited: Option<u64>,
    executing: bool,
    pending: Option<BakeRequest>,
    textures: Option<TextureSet>,
}

impl TileTexture {
    pub fn new(tile: TileKey, uv_min: Vec2, uv_max: Vec2) -> Self {
        Self {
            tile,
            uv_min,
            uv_max,
            resolution: None,
            awaited: None,
            executing: false,
            pending: None,
            textures: None,
        }
    }

    pub fn tile(&self) -> TileKey {
        self.tile
    }

    pub fn uv_rect(&self) -> (Vec2, Vec2) {
        (self.uv_min, self.uv_max)
    }

    pub fn state(&self) -> TextureState {
        if self.awaited.is_some() {
            TextureState::PendingBake
        } else if self.textures.is_some() {
            TextureState::Baked
        } else {
            TextureState::Idle
        }
    }

    /// Last requested (quantized) resolution
    pub fn resolution(&self) -> Option<u32> {
        self.resolution
    }

    pub fn textures(&self) -> Option<&TextureSet> {
        self.textures.as_ref()
    }

    pub fn awaited(&self) -> Option<u64> {
        self.awaited
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether `resolution` differs from the current bucket
    pub(crate) fn needs(&self, resolution: u32) -> bool {
        self.resolution != Some(resolution)
    }

    /// Register a new request; returns it if the pipeline should queue it now
    pub(crate) fn submit(&mut self, request: BakeRequest) -> Option<BakeRequest> {
        self.resolution = Some(request.resolution);
        if self.awaited.is_some() && self.executing {
            if let Some(old) = self.pending.replace(request) {
                log::trace!("Tile {} dropped parked bake {}", self.tile, old.id);
            }
            return None;
        }
        if let Some(old) = self.awaited.replace(request.id) {
            log::trace!("Tile {} superseded queued bake {}", self.tile, old);
        }
        self.executing = false;
        Some(request)
    }

    /// Claim a dequeued request for execution
    ///
    /// False when this receiver no longer awaits `id`.
    pub(crate) fn begin(&mut self, id: u64) -> bool {
        if self.awaited == Some(id) && !self.executing {
            self.executing = true;
            true
        } else {
            false
        }
    }

    /// Accept a finished bake; returns a parked request to queue next
    pub(crate) fn complete(&mut self, result: BakeResult, pool: &mut TexturePool) -> Option<BakeRequest> {
        if self.awaited != Some(result.id) {
            log::debug!("Tile {} discarded stale bake {}", self.tile, result.id);
            pool.push(result.textures);
            return None;
        }
        if let Some(old) = self.textures.replace(result.textures) {
            pool.push(old);
        }
        self.awaited = None;
        self.executing = false;
        let next = self.pending.take()?;
        self.awaited = Some(next.id);
        Some(next)
    }

    /// Return textures to the pool and forget outstanding requests
    pub fn deactivate(&mut self, pool: &mut TexturePool) {
        if let Some(set) = self.textures.take() {
            pool.push(set);
        }
        self.pending = None;
        self.awaited = None;
        self.executing = false;
        self.resolution = None;
    }
}

/// Lookup of texture receivers by tile
pub trait TextureReceivers {
    fn receiver_mut(&mut self, tile: TileKey) -> Option<&mut TileTexture>;
}

impl TextureReceivers for HashMap<TileKey, TileTexture> {
    fn receiver_mut(&mut self, tile: TileKey) -> Option<&mut TileTexture> {
        self.get_mut(&tile)
    }
}
