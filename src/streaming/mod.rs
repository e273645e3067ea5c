//! Mesh pack format, pack loading and the runtime mesh pool

pub mod wire;
pub mod lod;
pub mod pack;
pub mod loader;
pub mod pool;

pub use lod::{LodPolicy, DEFAULT_SCREEN_COVER};
pub use pack::{
    MeshPackWriter,
    pack_key, pack_start, encode_mesh, decode_mesh, read_offsets, read_mesh,
};
pub use loader::{FilePackLoader, MemoryPackLoader, MeshPackLoader, PACK_EXTENSION};
pub use pool::{MeshPool, PoolStats};
