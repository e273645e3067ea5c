//! Resolution-bucketed texture pool

use std::collections::HashMap;

use super::backend::{BAKE_TARGETS, BakeBackend, TextureSet};

#[derive(Debug, Default)]
pub struct TexturePool {
    buckets: HashMap<u32, Vec<TextureSet>>,
}

impl TexturePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse a pooled set of `resolution` or allocate one
    pub fn pop(&mut self, resolution: u32, backend: &mut dyn BakeBackend) -> TextureSet {
        if let Some(set) = self.buckets.get_mut(&resolution).and_then(Vec::pop) {
            return set;
        }
        backend.allocate(resolution, BAKE_TARGETS)
    }

    pub fn push(&mut self, set: TextureSet) {
        self.buckets.entry(set.resolution).or_default().push(set);
    }

    /// Pooled sets of `resolution`
    pub fn available(&self, resolution: u32) -> usize {
        self.buckets.get(&resolution).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every pooled set through the backend
    pub fn clear(&mut self, backend: &mut dyn BakeBackend) {
        for (_, sets) in self.buckets.drain() {
            for set in sets {
                backend.release(set);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bake::backend::HeadlessBackend;

    #[test]
    fn test_pop_reuses_same_bucket() {
        let mut backend = HeadlessBackend::default();
        let mut pool = TexturePool::new();

        let set = pool.pop(256, &mut backend);
        assert_eq!(set.handles.len(), BAKE_TARGETS);
        let handles = set.handles.clone();
        pool.push(set);

        assert_eq!(pool.available(256), 1);
        assert_eq!(pool.pop(512, &mut backend).resolution, 512);
        assert_eq!(pool.pop(256, &mut backend).handles, handles);
        assert_eq!(backend.allocated, 2);
    }

    #[test]
    fn test_clear_releases() {
        let mut backend = HeadlessBackend::default();
        let mut pool = TexturePool::new();
        let a = pool.pop(128, &mut backend);
        let b = pool.pop(128, &mut backend);
        pool.push(a);
        pool.push(b);
        pool.clear(&mut backend);
        assert!(pool.is_empty());
        assert_eq!(backend.released, 2);
    }
}
