//! Grid hash over XZ points for near-duplicate rejection

use std::collections::HashMap;

use crate::core::types::Vec2;

/// Uniform grid bucketing of 2D points
#[derive(Debug, Clone)]
pub struct BorderIndex {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<Vec2>>,
    len: usize,
}

impl BorderIndex {
    /// `cell_size` should be close to the usual query radius
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            cells: HashMap::new(),
            len: 0,
        }
    }

    fn cell(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.cell_size).floor() as i32,
            (p.y / self.cell_size).floor() as i32,
        )
    }

    pub fn insert(&mut self, p: Vec2) {
        let key = self.cell(p);
        self.cells.entry(key).or_default().push(p);
        self.len += 1;
    }

    /// Distance to the closest stored point within `radius`, if any
    pub fn nearest_within(&self, p: Vec2, radius: f32) -> Option<f32> {
        let (cx, cz) = self.cell(p);
        let reach = (radius / self.cell_size).ceil().max(1.0) as i32;
        let mut best: Option<f32> = None;
        for dz in -reach..=reach {
            for dx in -reach..=reach {
                let Some(points) = self.cells.get(&(cx + dx, cz + dz)) else {
                    continue;
                };
                for q in points {
                    let d = q.distance(p);
                    if d <= radius && best.is_none_or(|b| d < b) {
                        best = Some(d);
                    }
                }
            }
        }
        best
    }

    pub fn contains_within(&self, p: Vec2, radius: f32) -> bool {
        self.nearest_within(p, radius).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
