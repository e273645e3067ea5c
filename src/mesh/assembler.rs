//! Turns sampled tile point sets into indexed triangle meshes

use super::tile_mesh::TileMesh;
use super::triangulator::{DelaunayTriangulator, Triangulator};
use crate::core::types::{Result, Vec2, Vec3};
use crate::core::Error;
use crate::sampler::{LodScanner, SampleVertex, SamplerTile};

/// Largest vertex count addressable by 16-bit indices
pub const MAX_TILE_VERTICES: usize = u16::MAX as usize;

/// Unsigned shoelace area
fn triangle_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    ((c.x - a.x) * (b.y - a.y) - (b.x - a.x) * (c.y - a.y)).abs() * 0.5
}

/// Triangulates sample points in XZ and attaches their height, normal and uv
#[derive(Clone, Debug, Default)]
pub struct TileAssembler<T: Triangulator = DelaunayTriangulator> {
    triangulator: T,
}

impl<T: Triangulator> TileAssembler<T> {
    pub fn new(triangulator: T) -> Self {
        Self { triangulator }
    }

    /// Build the mesh body for tile `id`. Identity fields other than `id` are
    /// left for the caller.
    ///
    /// Triangles with XZ area below `min_triangle_area` are dropped and kept
    /// triangles are emitted with reversed corner order.
    pub fn assemble(&self, id: i32, samples: &[SampleVertex], min_triangle_area: f32) -> Result<TileMesh> {
        let mut mesh = TileMesh {
            id,
            ..Default::default()
        };
        if samples.len() < 3 {
            log::error!("Tile {} has {} samples, nothing to triangulate", id, samples.len());
            return Ok(mesh);
        }

        let points: Vec<Vec2> = samples.iter().map(SampleVertex::xz).collect();
        let triangulation = self.triangulator.triangulate(&points);
        if triangulation.vertices.len() != samples.len() {
            log::warn!(
                "Tile {}: triangulator returned {} vertices for {} samples",
                id,
                triangulation.vertices.len(),
                samples.len()
            );
        }

        let count = triangulation.vertices.len();
        if count > MAX_TILE_VERTICES {
            log::error!("Tile {} has {} vertices", id, count);
            return Err(Error::VertexOverflow { tile_id: id, count });
        }

        mesh.vertices.reserve(count);
        mesh.normals.reserve(count);
        mesh.uvs.reserve(count);
        for (i, p) in triangulation.vertices.iter().enumerate() {
            // attributes come from the sample with the same index when present
            let sample = samples.get(i);
            let height = sample.map_or(0.0, |s| s.position.y);
            mesh.vertices.push(Vec3::new(p.x, height, p.y));
            mesh.normals.push(sample.map_or(Vec3::Y, |s| s.normal));
            mesh.uvs.push(sample.map_or(Vec2::ZERO, |s| s.uv));
        }

        let mut dropped = 0usize;
        for [p0, p1, p2] in &triangulation.triangles {
            let (Some(a), Some(b), Some(c)) = (
                triangulation.vertices.get(*p0),
                triangulation.vertices.get(*p1),
                triangulation.vertices.get(*p2),
            ) else {
                dropped += 1;
                continue;
            };
            if triangle_area(*a, *b, *c) < min_triangle_area {
                dropped += 1;
                continue;
            }
            mesh.indices.extend_from_slice(&[*p2 as u16, *p1 as u16, *p0 as u16]);
        }
        if dropped > 0 {
            log::trace!("Tile {}: dropped {} degenerate triangles", id, dropped);
        }
        Ok(mesh)
    }

    /// Assemble a sampled tile, copying its bounds and uv rect
    pub fn assemble_tile(&self, id: i32, lod_level: u8, tile: &SamplerTile, min_triangle_area: f32) -> Result<TileMesh> {
        let mut mesh = self.assemble(id, &tile.vertices, min_triangle_area)?;
        mesh.lod_level = lod_level;
        mesh.bounds = tile.bounds;
        mesh.uv_min = tile.uv_min;
        mesh.uv_max = tile.uv_max;
        Ok(mesh)
    }
}

/// Assembles every tile of every LOD, one per [`step`](Self::step).
///
/// Tile ids run across LODs, LOD 0 first.
pub struct TessellationJob<T: Triangulator = DelaunayTriangulator> {
    assembler: TileAssembler<T>,
    tiles: Vec<(u8, SamplerTile)>,
    meshes: Vec<TileMesh>,
    min_triangle_area: f32,
}

impl TessellationJob<DelaunayTriangulator> {
    pub fn new(lods: Vec<LodScanner>, min_triangle_area: f32) -> Self {
        Self::with_assembler(TileAssembler::default(), lods, min_triangle_area)
    }
}

impl<T: Triangulator> TessellationJob<T> {
    pub fn with_assembler(assembler: TileAssembler<T>, lods: Vec<LodScanner>, min_triangle_area: f32) -> Self {
        let tiles: Vec<(u8, SamplerTile)> = lods
            .into_iter()
            .enumerate()
            .flat_map(|(lod, scanner)| {
                let lod = lod.min(u8::MAX as usize) as u8;
                scanner.into_tiles().into_iter().map(move |tile| (lod, tile))
            })
            .collect();
        Self {
            assembler,
            meshes: Vec::with_capacity(tiles.len()),
            tiles,
            min_triangle_area,
        }
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_done(&self) -> bool {
        self.meshes.len() >= self.tiles.len()
    }

    pub fn progress(&self) -> f32 {
        if self.tiles.is_empty() {
            return 1.0;
        }
        self.meshes.len() as f32 / self.tiles.len() as f32
    }

    /// Assemble the next tile
    pub fn step(&mut self) -> Result<()> {
        let index = self.meshes.len();
        let Some((lod, tile)) = self.tiles.get(index) else {
            return Ok(());
        };
        let mesh = self
            .assembler
            .assemble_tile(index as i32, *lod, tile, self.min_triangle_area)?;
        self.meshes.push(mesh);
        Ok(())
    }

    pub fn meshes(&self) -> &[TileMesh] {
        &self.meshes
    }

    pub fn into_meshes(self) -> Vec<TileMesh> {
        self.meshes
    }
}
