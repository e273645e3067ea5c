//! Mesh pack format
//!
//! A pack holds up to `pack_size` consecutive tile meshes. It starts with
//! `pack_size` little-endian i32 byte offsets, one per slot, followed by the
//! mesh records. Unused slots keep offset 0.
//!
//! Record: `vec2 uv_min, vec2 uv_max, i32 n, vec3 × n (positions), i32 n,
//! vec3 × n (normals), i32 n, vec2 × n (uvs), i32 n, u16 × n (indices)`.

use super::wire::{self, ByteReader};
use crate::core::types::{Result, Vec3};
use crate::core::Error;
use crate::math::Aabb;
use crate::mesh::{MAX_TILE_VERTICES, TileMesh};

/// First mesh id stored in the pack holding `id`
///
/// # Examples
/// ```
/// use terramesh::streaming::pack::pack_start;
///
/// assert_eq!(pack_start(0, 16), 0);
/// assert_eq!(pack_start(17, 16), 16);
/// assert_eq!(pack_start(31, 16), 16);
/// ```
pub fn pack_start(id: i32, pack_size: usize) -> i32 {
    let size = pack_size.max(1) as i32;
    id.div_euclid(size) * size
}

/// Pack key for the pack starting at `start`
pub fn pack_key(prefix: &str, start: i32) -> String {
    format!("{}_{}", prefix, start)
}

/// Append one mesh record
pub fn encode_mesh(out: &mut Vec<u8>, mesh: &TileMesh) -> Result<()> {
    if mesh.vertices.len() > MAX_TILE_VERTICES {
        return Err(Error::VertexOverflow {
            tile_id: mesh.id,
            count: mesh.vertices.len(),
        });
    }

    wire::write_vec2(out, mesh.uv_min);
    wire::write_vec2(out, mesh.uv_max);
    wire::write_i32(out, mesh.vertices.len() as i32);
    for v in &mesh.vertices {
        wire::write_vec3(out, *v);
    }
    wire::write_i32(out, mesh.normals.len() as i32);
    for n in &mesh.normals {
        wire::write_vec3(out, *n);
    }
    wire::write_i32(out, mesh.uvs.len() as i32);
    for uv in &mesh.uvs {
        wire::write_vec2(out, *uv);
    }
    wire::write_i32(out, mesh.indices.len() as i32);
    for &i in &mesh.indices {
        wire::write_u16(out, i);
    }
    Ok(())
}

/// Read one mesh record. Bounds are recomputed from the positions.
pub fn decode_mesh(reader: &mut ByteReader<'_>, id: i32) -> Result<TileMesh> {
    let uv_min = reader.read_vec2()?;
    let uv_max = reader.read_vec2()?;

    let count = reader.read_count(12)?;
    let vertices = (0..count).map(|_| reader.read_vec3()).collect::<Result<Vec<_>>>()?;
    let count = reader.read_count(12)?;
    let normals = (0..count).map(|_| reader.read_vec3()).collect::<Result<Vec<_>>>()?;
    let count = reader.read_count(8)?;
    let uvs = (0..count).map(|_| reader.read_vec2()).collect::<Result<Vec<_>>>()?;
    let count = reader.read_count(2)?;
    let indices = (0..count).map(|_| reader.read_u16()).collect::<Result<Vec<_>>>()?;

    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        return Err(Error::Format(format!(
            "mesh {} index {} out of {} vertices",
            id,
            bad,
            vertices.len()
        )));
    }

    let bounds = vertices
        .iter()
        .fold(None, |acc: Option<Aabb>, &v| match acc {
            None => Some(Aabb::new(v, v)),
            Some(b) => Some(Aabb::new(b.min.min(v), b.max.max(v))),
        })
        .unwrap_or(Aabb::new(Vec3::ZERO, Vec3::ZERO));

    Ok(TileMesh {
        id,
        lod_level: 0,
        bounds,
        uv_min,
        uv_max,
        vertices,
        normals,
        uvs,
        indices,
    })
}

/// Offset table of a pack
pub fn read_offsets(bytes: &[u8], pack_size: usize) -> Result<Vec<i32>> {
    let mut reader = ByteReader::new(bytes);
    (0..pack_size).map(|_| reader.read_i32()).collect()
}

/// Decode mesh `id` from a loaded pack
pub fn read_mesh(bytes: &[u8], offsets: &[i32], id: i32) -> Result<TileMesh> {
    let slot = id.rem_euclid(offsets.len().max(1) as i32) as usize;
    let offset = offsets.get(slot).copied().unwrap_or(0);
    if offset <= 0 {
        return Err(Error::NotFound(id));
    }
    let mut reader = ByteReader::at(bytes, offset as usize)?;
    decode_mesh(&mut reader, id)
}

/// Groups meshes, in id order, into packs of `pack_size`
#[derive(Debug)]
pub struct MeshPackWriter {
    prefix: String,
    pack_size: usize,
    packs: Vec<(String, Vec<u8>)>,
    current: Vec<u8>,
    start_id: i32,
    packed: usize,
}

impl MeshPackWriter {
    pub fn new(prefix: impl Into<String>, pack_size: usize) -> Self {
        Self {
            prefix: prefix.into(),
            pack_size: pack_size.max(1),
            packs: Vec::new(),
            current: Vec::new(),
            start_id: -1,
            packed: 0,
        }
    }

    pub fn pack_size(&self) -> usize {
        self.pack_size
    }

    fn flush(&mut self) {
        if self.current.is_empty() || self.start_id < 0 {
            return;
        }
        let key = pack_key(&self.prefix, self.start_id);
        log::debug!("Pack {} holds {} meshes, {} bytes", key, self.packed, self.current.len());
        self.packs.push((key, std::mem::take(&mut self.current)));
    }

    /// Append a mesh. Meshes must arrive with consecutive ids.
    pub fn push(&mut self, mesh: &TileMesh) -> Result<()> {
        let mut record = Vec::new();
        encode_mesh(&mut record, mesh)?;

        if self.packed % self.pack_size == 0 {
            self.flush();
            self.packed = 0;
            self.start_id = mesh.id;
            self.current = vec![0u8; self.pack_size * 4];
        }

        let offset = self.current.len();
        self.current.extend_from_slice(&record);
        wire::patch_i32(&mut self.current, self.packed * 4, offset as i32);
        self.packed += 1;
        Ok(())
    }

    /// Finished packs as `(key, bytes)`
    pub fn finish(mut self) -> Vec<(String, Vec<u8>)> {
        self.flush();
        self.packs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Vec2;

    fn tri_mesh(id: i32) -> TileMesh {
        TileMesh {
            id,
            uv_min: Vec2::new(0.0, 0.25),
            uv_max: Vec2::new(0.5, 0.75),
            vertices: vec![
                Vec3::new(id as f32, 1.0, 0.0),
                Vec3::new(id as f32 + 1.0, 2.0, 0.0),
                Vec3::new(id as f32, 3.0, 1.0),
            ],
            normals: vec![Vec3::Y; 3],
            uvs: vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            indices: vec![2, 1, 0],
            ..Default::default()
        }
    }

    #[test]
    fn test_pack_key() {
        assert_eq!(pack_key("hills", 32), "hills_32");
    }

    #[test]
    fn test_writer_groups_by_pack_size() {
        let mut writer = MeshPackWriter::new("t", 4);
        for id in 0..10 {
            writer.push(&tri_mesh(id)).unwrap();
        }
        let packs = writer.finish();
        let keys: Vec<_> = packs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["t_0", "t_4", "t_8"]);

        let offsets = read_offsets(&packs[2].1, 4).unwrap();
        assert_eq!(offsets[0], 16);
        assert!(offsets[1] > offsets[0]);
        assert_eq!(&offsets[2..], &[0, 0]);
    }

    #[test]
    fn test_read_mesh_from_pack() {
        let mut writer = MeshPackWriter::new("t", 4);
        for id in 0..4 {
            writer.push(&tri_mesh(id)).unwrap();
        }
        let packs = writer.finish();
        let bytes = &packs[0].1;
        let offsets = read_offsets(bytes, 4).unwrap();

        let mesh = read_mesh(bytes, &offsets, 2).unwrap();
        let expected = tri_mesh(2);
        assert_eq!(mesh.id, 2);
        assert_eq!(mesh.vertices, expected.vertices);
        assert_eq!(mesh.indices, expected.indices);
        assert_eq!(mesh.uv_max, expected.uv_max);
        assert_eq!(mesh.bounds.min, Vec3::new(2.0, 1.0, 0.0));
        assert_eq!(mesh.bounds.max, Vec3::new(3.0, 3.0, 1.0));
    }

    #[test]
    fn test_empty_slot_is_not_found() {
        let mut writer = MeshPackWriter::new("t", 4);
        writer.push(&tri_mesh(0)).unwrap();
        let packs = writer.finish();
        let offsets = read_offsets(&packs[0].1, 4).unwrap();
        assert!(matches!(read_mesh(&packs[0].1, &offsets, 3), Err(Error::NotFound(3))));
    }

    #[test]
    fn test_bad_index_is_format_error() {
        let mut mesh = tri_mesh(0);
        mesh.indices = vec![0, 1, 9];
        let mut out = Vec::new();
        encode_mesh(&mut out, &mesh).unwrap();
        assert!(matches!(decode_mesh(&mut ByteReader::new(&out), 0), Err(Error::Format(_))));
    }

    #[test]
    fn test_overflow_rejected() {
        let mesh = TileMesh {
            id: 5,
            vertices: vec![Vec3::ZERO; MAX_TILE_VERTICES + 1],
            ..Default::default()
        };
        let mut writer = MeshPackWriter::new("t", 2);
        assert!(matches!(writer.push(&mesh), Err(Error::VertexOverflow { tile_id: 5, .. })));
        assert!(writer.finish().is_empty());
    }

    #[test]
    fn test_empty_writer() {
        assert!(MeshPackWriter::new("t", 4).finish().is_empty());
    }
}
