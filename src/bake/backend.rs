//! Texture baking backend seam

use crate::core::types::Vec2;

/// Source material layer id
pub type LayerId = u32;

/// Opaque texture handle owned by a backend
pub type TextureHandle = u64;

/// Output textures written per bake: diffuse and normal
pub const BAKE_TARGETS: usize = 2;

/// Textures produced by one bake, all at `resolution`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureSet {
    pub resolution: u32,
    pub handles: Vec<TextureHandle>,
}

impl TextureSet {
    pub fn diffuse(&self) -> Option<TextureHandle> {
        self.handles.first().copied()
    }

    pub fn normal(&self) -> Option<TextureHandle> {
        self.handles.get(1).copied()
    }
}

/// Renders source layers over a uv rect into textures
pub trait BakeBackend {
    /// Create `count` textures of `resolution`
    fn allocate(&mut self, resolution: u32, count: usize) -> TextureSet;

    /// Composite `layers` over `[uv_min, uv_max]` into `target`
    fn execute(&mut self, resolution: u32, uv_min: Vec2, uv_max: Vec2, layers: &[LayerId], target: &mut TextureSet);

    /// Destroy textures that leave the pool
    fn release(&mut self, _set: TextureSet) {}
}

/// Backend without a renderer: hands out sequential handles and counts work
#[derive(Clone, Debug, Default)]
pub struct HeadlessBackend {
    next_handle: TextureHandle,
    pub allocated: usize,
    pub executed: usize,
    pub released: usize,
    pub last_uv: Option<(Vec2, Vec2)>,
}

impl BakeBackend for HeadlessBackend {
    fn allocate(&mut self, resolution: u32, count: usize) -> TextureSet {
        let handles = (0..count)
            .map(|_| {
                self.next_handle += 1;
                self.next_handle
            })
            .collect();
        self.allocated += 1;
        TextureSet { resolution, handles }
    }

    fn execute(&mut self, _resolution: u32, uv_min: Vec2, uv_max: Vec2, _layers: &[LayerId], _target: &mut TextureSet) {
        self.executed += 1;
        self.last_uv = Some((uv_min, uv_max));
    }

    fn release(&mut self, _set: TextureSet) {
        self.released += 1;
    }
}
