//! Error types for terramesh

use thiserror::Error;

/// Main error type for the tile pipeline
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed data: {0}")]
    Format(String),

    /// Stitching or LOD grid topology mismatch.
    #[error("Topology error: {0}")]
    Topology(String),

    /// No quadtree node accepted the tile.
    #[error("Tile {0} can't be inserted into the quadtree")]
    Insertion(i32),

    /// 16-bit index limit exceeded by a tile mesh.
    #[error("Tile {tile_id} has {count} vertices, more than 16-bit indices can address")]
    VertexOverflow { tile_id: i32, count: usize },

    #[error("Mesh {0} not found")]
    NotFound(i32),

    #[error("Config error: {0}")]
    Config(String),
}
