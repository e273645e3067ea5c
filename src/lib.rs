//! Terramesh - adaptive terrain tiles with quadtree LOD streaming

pub mod core;
pub mod math;
pub mod heightfield;
pub mod sampler;
pub mod mesh;
pub mod quadtree;
pub mod streaming;
pub mod bake;
pub mod build;
pub mod runtime;
