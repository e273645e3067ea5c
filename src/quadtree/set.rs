//! Fixed-capacity index set with O(1) membership

/// Set of indices below a fixed capacity.
///
/// Insertion order is kept in a dense list; membership is a bitset.
#[derive(Clone, Debug, Default)]
pub struct FixedSet {
    bits: Vec<u64>,
    items: Vec<usize>,
    capacity: usize,
}

impl FixedSet {
    pub fn new(capacity: usize) -> Self {
        Self {
            bits: vec![0; capacity.div_ceil(64)],
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add `index`; returns false if it was already present or out of range
    pub fn insert(&mut self, index: usize) -> bool {
        if index >= self.capacity {
            log::warn!("FixedSet index {} out of capacity {}", index, self.capacity);
            return false;
        }
        let (word, bit) = (index / 64, 1u64 << (index % 64));
        if self.bits[word] & bit != 0 {
            return false;
        }
        self.bits[word] |= bit;
        self.items.push(index);
        true
    }

    /// Drop `index`; returns false if it was absent
    pub fn remove(&mut self, index: usize) -> bool {
        if !self.contains(index) {
            return false;
        }
        self.bits[index / 64] &= !(1u64 << (index % 64));
        if let Some(pos) = self.items.iter().position(|&i| i == index) {
            self.items.remove(pos);
        }
        true
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.capacity && self.bits[index / 64] & (1u64 << (index % 64)) != 0
    }

    /// Clear membership; only touches words holding current items
    pub fn reset(&mut self) {
        for &index in &self.items {
            self.bits[index / 64] = 0;
        }
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in insertion order
    pub fn as_slice(&self) -> &[usize] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.items.iter().copied()
    }
}
