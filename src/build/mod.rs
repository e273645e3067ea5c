//! Offline dataset build: sampling, tessellation, indexing and packing

pub mod config;
pub mod dataset;
pub mod driver;

pub use config::{BuildConfig, MAX_GRID_DEPTH};
pub use dataset::{Dataset, DatasetDir, DatasetHeader, HEADER_FILE, HEIGHT_MAP_FILE, TREE_FILE};
pub use driver::{build_dataset, BuildPhase, BuildProgress, DatasetBuilder};
