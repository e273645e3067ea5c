//! Runtime side: per-frame culling, mesh streaming and texture baking

pub mod streamer;

pub use streamer::{open_dataset, FrameUpdate, FrameView, TerrainStreamer};
