//! Queued texture baking with channel delivery

use std::collections::VecDeque;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use super::backend::BakeBackend;
use super::config::BakeConfig;
use super::pool::TexturePool;
use super::request::{BakeRequest, BakeResult, RequestIdGenerator};
use super::texture::{TextureReceivers, TileTexture};
use crate::core::types::{RAD_TO_DEG, Vec3};

/// Desired texture resolution for a tile seen from `view_center`
///
/// Projected pixel extent of the tile footprint, rounded up. `fov` is the
/// vertical field of view in degrees.
pub fn texture_size_for(view_center: Vec3, fov: f32, screen_h: f32, diameter: f32, center: Vec3) -> u32 {
    let distance = view_center.distance(center).max(f32::EPSILON);
    let px = diameter * RAD_TO_DEG * screen_h / (distance * fov.max(f32::EPSILON));
    if px.is_finite() { px.ceil().max(0.0) as u32 } else { u32::MAX }
}

/// Work done by one [`BakePipeline::step`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BakeStepStats {
    pub delivered: usize,
    pub executed: usize,
    pub dropped: usize,
}

pub struct BakePipeline<B: BakeBackend> {
    backend: B,
    config: BakeConfig,
    pool: TexturePool,
    ids: RequestIdGenerator,
    queue: VecDeque<BakeRequest>,
    results_tx: UnboundedSender<BakeResult>,
    results_rx: UnboundedReceiver<BakeResult>,
}

impl<B: BakeBackend> BakePipeline<B> {
    pub fn new(backend: B, config: BakeConfig) -> Self {
        let (results_tx, results_rx) = unbounded_channel();
        Self {
            backend,
            config,
            pool: TexturePool::new(),
            ids: RequestIdGenerator::new(),
            queue: VecDeque::new(),
            results_tx,
            results_rx,
        }
    }

    pub fn config(&self) -> &BakeConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn pool(&self) -> &TexturePool {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut TexturePool {
        &mut self.pool
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Sender for results produced outside [`Self::step`]
    pub fn result_sender(&self) -> UnboundedSender<BakeResult> {
        self.results_tx.clone()
    }

    /// Ask for `resolution` on `texture`
    ///
    /// Returns false when the quantized size matches the current request.
    pub fn request(&mut self, texture: &mut TileTexture, resolution: u32) -> bool {
        let resolution = self.config.quantize(resolution);
        if !texture.needs(resolution) {
            return false;
        }
        let (uv_min, uv_max) = texture.uv_rect();
        let request = BakeRequest {
            id: self.ids.next_id(),
            resolution,
            uv_min,
            uv_max,
            tile: texture.tile(),
        };
        log::trace!("Bake request {} for tile {} at {}", request.id, request.tile, resolution);
        if let Some(request) = texture.submit(request) {
            self.queue.push_back(request);
        }
        true
    }

    /// Release a receiver's textures back to the pool
    pub fn deactivate(&mut self, texture: &mut TileTexture) {
        texture.deactivate(&mut self.pool);
    }

    /// Deliver finished bakes, then execute up to `max_bakes_per_step` queued requests
    pub fn step<R: TextureReceivers + ?Sized>(&mut self, receivers: &mut R) -> BakeStepStats {
        let mut stats = BakeStepStats::default();

        while let Ok(result) = self.results_rx.try_recv() {
            stats.delivered += 1;
            match receivers.receiver_mut(result.tile) {
                Some(receiver) => {
                    if let Some(next) = receiver.complete(result, &mut self.pool) {
                        self.queue.push_back(next);
                    }
                }
                None => self.pool.push(result.textures),
            }
        }

        while stats.executed < self.config.max_bakes_per_step {
            let Some(request) = self.queue.pop_front() else {
                break;
            };
            let claimed = receivers
                .receiver_mut(request.tile)
                .is_some_and(|receiver| receiver.begin(request.id));
            if !claimed {
                stats.dropped += 1;
                continue;
            }

            let size = self.config.texture_size(request.resolution);
            let mut target = self.pool.pop(size, &mut self.backend);
            self.backend.execute(size, request.uv_min, request.uv_max, &self.config.layers, &mut target);
            stats.executed += 1;

            let result = BakeResult {
                id: request.id,
                tile: request.tile,
                textures: target,
            };
            if let Err(err) = self.results_tx.send(result) {
                self.pool.push(err.0.textures);
            }
        }

        if stats.dropped > 0 {
            log::debug!("Dropped {} superseded bake requests", stats.dropped);
        }
        stats
    }

    /// Drop queued work and release pooled textures
    pub fn clear(&mut self) {
        self.queue.clear();
        while let Ok(result) = self.results_rx.try_recv() {
            self.pool.push(result.textures);
        }
        self.pool.clear(&mut self.backend);
    }
}
