//! Height field sources consumed by the adaptive sampler
//!
//! A [`HeightProvider`] answers "how high is the ground here and which way does
//! it face". Three sources are provided: the 2-byte encoded [`HeightMap`] that
//! ships with a dataset, a procedural [`NoiseHeightField`], and a closure-backed
//! [`FnHeightField`] mostly useful in tests.

pub mod provider;
pub mod height_map;
pub mod registry;
pub mod noise_field;

pub use provider::{HeightProvider, FnHeightField, normal_from_heights};
pub use height_map::HeightMap;
pub use registry::HeightMapRegistry;
pub use noise_field::{NoiseHeightField, NoiseParams};
