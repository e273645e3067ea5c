//! Tile triangulation and mesh assembly

pub mod triangulator;
pub mod tile_mesh;
pub mod assembler;

pub use triangulator::{DelaunayTriangulator, Triangulation, Triangulator};
pub use tile_mesh::TileMesh;
pub use assembler::{TessellationJob, TileAssembler, MAX_TILE_VERTICES};
