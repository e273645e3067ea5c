//! Tile quadtree: build-time placement, binary format and runtime culling

pub mod node;
pub mod builder;
pub mod codec;
pub mod set;
pub mod walker;

pub use node::{QuadTreeNode, NO_LOD, NO_MESH};
pub use builder::{build_tree, QuadTreeBuildNode};
pub use codec::{decode, encode};
pub use set::FixedSet;
pub use walker::{CullParams, CullWalker, ViewTracker};
