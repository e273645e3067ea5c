//! 2D triangulation seam

use crate::core::types::Vec2;

/// Output of a triangulator. Triangle corners index into `vertices`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Triangulation {
    pub vertices: Vec<Vec2>,
    pub triangles: Vec<[usize; 3]>,
}

/// Triangulates a planar point set
pub trait Triangulator {
    fn triangulate(&self, points: &[Vec2]) -> Triangulation;
}

/// Delaunay triangulation backed by the `delaunator` crate.
///
/// Input order is preserved, so vertex `i` of the output is input point `i`.
/// Duplicate points stay in the vertex list but are not referenced.
#[derive(Clone, Copy, Debug, Default)]
pub struct DelaunayTriangulator;

impl Triangulator for DelaunayTriangulator {
    fn triangulate(&self, points: &[Vec2]) -> Triangulation {
        let input: Vec<delaunator::Point> = points
            .iter()
            .map(|p| delaunator::Point {
                x: p.x as f64,
                y: p.y as f64,
            })
            .collect();
        let result = delaunator::triangulate(&input);

        Triangulation {
            vertices: points.to_vec(),
            triangles: result
                .triangles
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect(),
        }
    }
}
