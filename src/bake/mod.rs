//! Virtual-texture baking for active tiles
//!
//! Tiles own a [`TileTexture`] receiver; the [`BakePipeline`] queues their
//! requests, runs a bounded number per step through a [`BakeBackend`] and
//! delivers results over a channel on the following step.

pub mod backend;
pub mod config;
pub mod pipeline;
pub mod pool;
pub mod request;
pub mod texture;

pub use backend::{BAKE_TARGETS, BakeBackend, HeadlessBackend, LayerId, TextureHandle, TextureSet};
pub use config::{BakeConfig, TextureQuality};
pub use pipeline::{BakePipeline, BakeStepStats, texture_size_for};
pub use pool::TexturePool;
pub use request::{BakeRequest, BakeResult, RequestIdGenerator, TileKey};
pub use texture::{TextureReceivers, TextureState, TileTexture};
