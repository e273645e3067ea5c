//! Adaptive height-field sampling into seam-free tile point sets

pub mod vertex;
pub mod tree;
pub mod border_index;
pub mod tile;
pub mod scanner;
pub mod lod_stitch;
pub mod job;

pub use vertex::{BorderTag, SampleVertex, Side};
pub use tree::{NodeKind, SamplerNode};
pub use border_index::BorderIndex;
pub use tile::SamplerTile;
pub use scanner::LodScanner;
pub use lod_stitch::{stitch_lod, Placement};
pub use job::{BuildJob, LodSetting, MAX_SUBDIVISION};
