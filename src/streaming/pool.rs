//! Streaming tile mesh pool
//!
//! Meshes are parsed on first request from the pack containing them. A pack
//! stays resident until every slot has been parsed once, then the loader is
//! told to unload it. Parsed meshes stay cached until released.

use std::collections::HashMap;
use std::sync::Arc;

use super::loader::MeshPackLoader;
use super::pack::{pack_key, pack_start, read_mesh, read_offsets};
use crate::core::types::Result;
use crate::core::Error;
use crate::mesh::TileMesh;

/// A loaded pack and how many of its slots were parsed
struct PackStream {
    bytes: Vec<u8>,
    offsets: Vec<i32>,
    used: usize,
}

impl PackStream {
    fn is_obsolete(&self) -> bool {
        self.used >= self.offsets.len()
    }
}

/// Pool counters
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub pack_loads: usize,
    pub pack_evictions: usize,
    pub cached_meshes: usize,
    pub resident_packs: usize,
}

/// Mesh cache in front of a pack loader
pub struct MeshPool<L: MeshPackLoader> {
    loader: L,
    prefix: String,
    pack_size: usize,
    parsed: HashMap<i32, Arc<TileMesh>>,
    streams: HashMap<String, PackStream>,
    pack_loads: usize,
    pack_evictions: usize,
}

impl<L: MeshPackLoader> MeshPool<L> {
    pub fn new(loader: L, prefix: impl Into<String>, pack_size: usize) -> Self {
        Self {
            loader,
            prefix: prefix.into(),
            pack_size: pack_size.max(1),
            parsed: HashMap::new(),
            streams: HashMap::new(),
            pack_loads: 0,
            pack_evictions: 0,
        }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    pub fn contains(&self, id: i32) -> bool {
        self.parsed.contains_key(&id)
    }

    /// Get mesh `id`, loading its pack if needed
    pub fn get_mesh(&mut self, id: i32) -> Result<Arc<TileMesh>> {
        if id < 0 {
            return Err(Error::NotFound(id));
        }
        if let Some(mesh) = self.parsed.get(&id) {
            return Ok(Arc::clone(mesh));
        }

        let key = pack_key(&self.prefix, pack_start(id, self.pack_size));
        if !self.streams.contains_key(&key) {
            let bytes = self.loader.load(&key)?;
            let offsets = read_offsets(&bytes, self.pack_size)?;
            self.pack_loads += 1;
            self.streams.insert(key.clone(), PackStream { bytes, offsets, used: 0 });
        }

        let Some(stream) = self.streams.get_mut(&key) else {
            return Err(Error::NotFound(id));
        };
        let mesh = Arc::new(read_mesh(&stream.bytes, &stream.offsets, id)?);
        stream.used += 1;
        let obsolete = stream.is_obsolete();

        self.parsed.insert(id, Arc::clone(&mesh));
        if obsolete {
            self.streams.remove(&key);
            self.loader.unload(&key);
            self.pack_evictions += 1;
            log::debug!("Pack {} fully parsed, unloaded", key);
        }
        Ok(mesh)
    }

    /// Drop the cached copy of mesh `id`
    pub fn release(&mut self, id: i32) -> Option<Arc<TileMesh>> {
        self.parsed.remove(&id)
    }

    /// Unload every resident pack and drop all cached meshes
    pub fn clear(&mut self) {
        for key in self.streams.keys() {
            self.loader.unload(key);
        }
        self.streams.clear();
        self.parsed.clear();
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            pack_loads: self.pack_loads,
            pack_evictions: self.pack_evictions,
            cached_meshes: self.parsed.len(),
            resident_packs: self.streams.len(),
        }
    }
}
