//! Binary tree format
//!
//! Little-endian: `i32 node_count`, then per node `vec3 center, vec3 size,
//! i32 mesh_id, i32 cell_index, u8 lod, i32 child_count, i32 × child_count`.

use super::node::QuadTreeNode;
use crate::core::types::{Result, Vec3};
use crate::core::Error;
use crate::math::Aabb;
use crate::streaming::wire::{self, ByteReader};

/// Smallest encoded node: two vec3, three i32 and one u8
const MIN_NODE_BYTES: usize = 24 + 12 + 1;

pub fn encode(nodes: &[QuadTreeNode]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + nodes.len() * (MIN_NODE_BYTES + 16));
    wire::write_i32(&mut out, nodes.len() as i32);
    for node in nodes {
        wire::write_vec3(&mut out, node.bounds.center());
        wire::write_vec3(&mut out, node.bounds.size());
        wire::write_i32(&mut out, node.mesh_id);
        wire::write_i32(&mut out, node.cell_index);
        out.push(node.lod_level);
        wire::write_i32(&mut out, node.children.len() as i32);
        for &child in &node.children {
            wire::write_i32(&mut out, child);
        }
    }
    out
}

/// Decode a tree, translating every node's bounds by `offset`.
///
/// Child indices must point inside the node array.
pub fn decode(bytes: &[u8], offset: Vec3) -> Result<Vec<QuadTreeNode>> {
    let mut reader = ByteReader::new(bytes);
    let count = reader.read_count(MIN_NODE_BYTES)?;
    let mut nodes = Vec::with_capacity(count);

    for _ in 0..count {
        let center = reader.read_vec3()?;
        let size = reader.read_vec3()?;
        let mesh_id = reader.read_i32()?;
        let cell_index = reader.read_i32()?;
        let lod_level = reader.read_u8()?;
        let child_count = reader.read_count(4)?;
        let mut children = Vec::with_capacity(child_count);
        for _ in 0..child_count {
            let child = reader.read_i32()?;
            if child < 0 || child as usize >= count {
                return Err(Error::Format(format!(
                    "child index {} outside {} nodes",
                    child, count
                )));
            }
            children.push(child);
        }
        let bounds = Aabb::from_center_size(center + offset, size);
        nodes.push(QuadTreeNode::new(bounds, mesh_id, cell_index, lod_level, children));
    }

    if reader.remaining() > 0 {
        log::warn!("Tree data has {} trailing bytes", reader.remaining());
    }
    Ok(nodes)
}
