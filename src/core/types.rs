//! Core type aliases and re-exports

pub use glam::{
    Vec2, Vec3, Vec4,
    Mat4,
};

/// Standard Result type for terramesh
pub type Result<T> = std::result::Result<T, crate::core::error::Error>;

/// Degrees per radian, used by slope and pixel size math.
pub const RAD_TO_DEG: f32 = 180.0 / std::f32::consts::PI;
