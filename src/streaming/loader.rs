//! Mesh pack sources

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::types::Result;
use crate::core::Error;

/// File extension of pack files
pub const PACK_EXTENSION: &str = "bytes";

/// Fetches raw pack bytes by key
pub trait MeshPackLoader {
    fn load(&mut self, key: &str) -> Result<Vec<u8>>;

    /// Called once the pool no longer needs the pack
    fn unload(&mut self, key: &str);
}

/// Reads `<dir>/<key>.bytes`
#[derive(Clone, Debug)]
pub struct FilePackLoader {
    dir: PathBuf,
}

impl FilePackLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn pack_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", key, PACK_EXTENSION))
    }
}

impl MeshPackLoader for FilePackLoader {
    fn load(&mut self, key: &str) -> Result<Vec<u8>> {
        let path = self.pack_path(key);
        log::debug!("Loading pack {}", path.display());
        Ok(std::fs::read(path)?)
    }

    fn unload(&mut self, key: &str) {
        log::trace!("Released pack {}", key);
    }
}

/// In-memory packs with per-key load/unload counters
#[derive(Clone, Debug, Default)]
pub struct MemoryPackLoader {
    packs: HashMap<String, Vec<u8>>,
    loads: HashMap<String, usize>,
    unloads: HashMap<String, usize>,
}

impl MemoryPackLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader over `(key, bytes)` pairs, as produced by the pack writer
    pub fn from_packs(packs: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        Self {
            packs: packs.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, bytes: Vec<u8>) {
        self.packs.insert(key.into(), bytes);
    }

    pub fn load_count(&self, key: &str) -> usize {
        self.loads.get(key).copied().unwrap_or(0)
    }

    pub fn unload_count(&self, key: &str) -> usize {
        self.unloads.get(key).copied().unwrap_or(0)
    }

    pub fn total_loads(&self) -> usize {
        self.loads.values().sum()
    }
}

impl MeshPackLoader for MemoryPackLoader {
    fn load(&mut self, key: &str) -> Result<Vec<u8>> {
        let bytes = self
            .packs
            .get(key)
            .cloned()
            .ok_or_else(|| Error::Config(format!("no pack named {}", key)))?;
        *self.loads.entry(key.to_string()).or_default() += 1;
        Ok(bytes)
    }

    fn unload(&mut self, key: &str) {
        *self.unloads.entry(key.to_string()).or_default() += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_loader_counts() {
        let mut loader = MemoryPackLoader::from_packs([("a_0".to_string(), vec![1, 2, 3])]);
        assert_eq!(loader.load("a_0").unwrap(), vec![1, 2, 3]);
        assert!(loader.load("a_4").is_err());
        loader.unload("a_0");
        assert_eq!(loader.load_count("a_0"), 1);
        assert_eq!(loader.load_count("a_4"), 0);
        assert_eq!(loader.unload_count("a_0"), 1);
    }

    #[test]
    fn test_file_loader_reads_key() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hills_16.bytes"), [9u8, 8]).unwrap();

        let mut loader = FilePackLoader::new(dir.path());
        assert_eq!(loader.load("hills_16").unwrap(), vec![9, 8]);
        assert!(matches!(loader.load("hills_32"), Err(Error::Io(_))));
    }
}
