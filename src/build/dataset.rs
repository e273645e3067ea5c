//! Built dataset and its on-disk layout
//!
//! A dataset directory holds `header.json`, `tree.bytes`, `heightmap.bytes`
//! and one `<prefix>_<start>.bytes` file per mesh pack.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::types::{Result, Vec3};
use crate::heightfield::HeightMap;
use crate::math::Aabb;
use crate::quadtree::{self, QuadTreeNode};
use crate::streaming::{FilePackLoader, LodPolicy, PACK_EXTENSION};

pub const HEADER_FILE: &str = "header.json";
pub const TREE_FILE: &str = "tree.bytes";
pub const HEIGHT_MAP_FILE: &str = "heightmap.bytes";

/// Everything the runtime needs to open a dataset besides the binary files
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetHeader {
    pub pack_size: usize,
    pub mesh_prefix: String,
    pub bounds: Aabb,
    pub height_map_resolution: usize,
    pub height_map_scale: Vec3,
    pub node_count: usize,
    pub tile_count: usize,
    pub lod_count: usize,
    pub lod_policy: LodPolicy,
}

impl DatasetHeader {
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let json = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Output of a finished build
#[derive(Clone, Debug)]
pub struct Dataset {
    pub header: DatasetHeader,
    pub tree_bytes: Vec<u8>,
    /// `(key, bytes)` per mesh pack
    pub packs: Vec<(String, Vec<u8>)>,
    pub height_map_bytes: Vec<u8>,
}

impl Dataset {
    pub async fn write_to(&self, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(dir.join(TREE_FILE), &self.tree_bytes).await?;
        for (key, bytes) in &self.packs {
            tokio::fs::write(dir.join(format!("{}.{}", key, PACK_EXTENSION)), bytes).await?;
        }
        tokio::fs::write(dir.join(HEIGHT_MAP_FILE), &self.height_map_bytes).await?;
        self.header.save(&dir.join(HEADER_FILE)).await?;

        log::info!(
            "Wrote dataset to {:?}: {} tiles in {} packs, {} nodes",
            dir,
            self.header.tile_count,
            self.packs.len(),
            self.header.node_count
        );
        Ok(())
    }

    pub fn height_map(&self) -> Result<HeightMap> {
        HeightMap::from_bytes(
            self.header.bounds,
            self.header.height_map_resolution,
            self.header.height_map_scale,
            self.height_map_bytes.clone(),
        )
    }
}

/// Read side of a dataset directory
#[derive(Clone, Debug)]
pub struct DatasetDir {
    dir: PathBuf,
    pub header: DatasetHeader,
}

impl DatasetDir {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        let header = DatasetHeader::load(&dir.join(HEADER_FILE)).await?;
        Ok(Self { dir, header })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Decode the quadtree, shifted by a world `offset`
    pub async fn read_tree(&self, offset: Vec3) -> Result<Vec<QuadTreeNode>> {
        let bytes = tokio::fs::read(self.dir.join(TREE_FILE)).await?;
        quadtree::decode(&bytes, offset)
    }

    pub async fn read_height_map(&self) -> Result<HeightMap> {
        let bytes = tokio::fs::read(self.dir.join(HEIGHT_MAP_FILE)).await?;
        HeightMap::from_bytes(
            self.header.bounds,
            self.header.height_map_resolution,
            self.header.height_map_scale,
            bytes,
        )
    }

    pub fn pack_loader(&self) -> FilePackLoader {
        FilePackLoader::new(&self.dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> DatasetHeader {
        DatasetHeader {
            pack_size: 4,
            mesh_prefix: "t".into(),
            bounds: Aabb::new(Vec3::ZERO, Vec3::new(10.0, 2.0, 10.0)),
            height_map_resolution: 2,
            height_map_scale: Vec3::new(10.0, 2.0, 10.0),
            node_count: 0,
            tile_count: 0,
            lod_count: 1,
            lod_policy: LodPolicy::default(),
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn test_header_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(HEADER_FILE);
        runtime().block_on(async {
            header().save(&path).await.unwrap();
            assert_eq!(DatasetHeader::load(&path).await.unwrap(), header());
        });
    }

    #[test]
    fn test_write_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Dataset {
            header: header(),
            tree_bytes: quadtree::encode(&[]),
            packs: vec![("t_0".into(), vec![1, 2, 3])],
            height_map_bytes: HeightMap::encode(&[0.0, 0.5, 0.5, 1.0], 2),
        };

        runtime().block_on(async {
            dataset.write_to(dir.path()).await.unwrap();
            let opened = DatasetDir::open(dir.path()).await.unwrap();
            assert_eq!(opened.header, header());
            assert!(opened.read_tree(Vec3::ZERO).await.unwrap().is_empty());
            let map = opened.read_height_map().await.unwrap();
            assert_eq!(map.resolution(), 2);
        });
        assert!(dir.path().join("t_0.bytes").exists());
        assert_eq!(
            crate::streaming::MeshPackLoader::load(&mut FilePackLoader::new(dir.path()), "t_0").unwrap(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_open_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = runtime().block_on(DatasetDir::open(dir.path().join("absent")));
        assert!(matches!(result, Err(crate::core::Error::Io(_))));
    }
}
