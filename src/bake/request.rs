//! Bake requests and their results

use super::backend::TextureSet;
use crate::core::types::Vec2;

/// Tiles are identified by their mesh id
pub type TileKey = i32;

#[derive(Clone, Debug, PartialEq)]
pub struct BakeRequest {
    pub id: u64,
    pub resolution: u32,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
    pub tile: TileKey,
}

/// Completed bake, matched to its request by `id` only
#[derive(Debug)]
pub struct BakeResult {
    pub id: u64,
    pub tile: TileKey,
    pub textures: TextureSet,
}

/// Monotonic request ids starting at 1
#[derive(Clone, Debug, Default)]
pub struct RequestIdGenerator {
    last: u64,
}

impl RequestIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one() {
        let mut ids = RequestIdGenerator::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);

        let mut other = RequestIdGenerator::new();
        assert_eq!(other.next_id(), 1);
    }
}
