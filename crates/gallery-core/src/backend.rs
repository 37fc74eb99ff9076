//! The seam between the gallery core and whatever draws it.

use crate::assets::CardTexture;
use crate::picking::{nearest_hit, PickCandidate, PickHit, Ray};
use crate::state::{Camera, Viewport};
use crate::Result;
use fnv::FnvHashSet;
use glam::{Mat4, Quat, Vec3};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u32);

/// Anything the backend allocated on the gallery's behalf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Surface(SurfaceHandle),
    Texture(TextureHandle),
    Mesh(MeshHandle),
}

/// Geometry of one card quad in scene-local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardDescriptor {
    pub index: usize,
    pub position: Vec3,
    pub orientation: Quat,
    pub width: f32,
    pub height: f32,
}

/// Per-frame scene parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneFrame {
    pub rotation: Quat,
    pub scale: f32,
    pub background: [f32; 3],
}

impl SceneFrame {
    /// World-from-scene transform.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), self.rotation, Vec3::ZERO)
    }
}

pub trait RenderBackend {
    fn create_surface(&mut self, viewport: Viewport) -> Result<SurfaceHandle>;
    fn resize_surface(&mut self, _viewport: Viewport) {}
    fn create_texture(&mut self, texture: &CardTexture) -> Result<TextureHandle>;
    fn create_card(&mut self, card: &CardDescriptor, texture: TextureHandle) -> Result<MeshHandle>;
    fn set_card_texture(&mut self, mesh: MeshHandle, texture: TextureHandle) -> Result<()>;
    /// Nearest card under `ray`; the ray is already in scene-local space.
    fn raycast(&self, ray: &Ray, candidates: &[PickCandidate]) -> Option<PickHit> {
        nearest_hit(ray, candidates)
    }
    fn present(&mut self, frame: &SceneFrame, camera: &Camera) -> Result<()>;
    fn dispose(&mut self, resource: Resource);
}

/// Every live backend resource the gallery owns.
#[derive(Debug, Default)]
pub struct ResourceLedger {
    live: FnvHashSet<Resource>,
}

impl ResourceLedger {
    pub fn track(&mut self, resource: Resource) {
        self.live.insert(resource);
    }

    pub fn contains(&self, resource: Resource) -> bool {
        self.live.contains(&resource)
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Dispose one resource if it is still tracked.
    pub fn release(&mut self, resource: Resource, backend: &mut dyn RenderBackend) {
        if self.live.remove(&resource) {
            backend.dispose(resource);
        }
    }

    /// Dispose everything: meshes first, then textures, then surfaces.
    pub fn dispose_all(&mut self, backend: &mut dyn RenderBackend) {
        let mut all: Vec<Resource> = self.live.drain().collect();
        all.sort_by_key(|r| match r {
            Resource::Mesh(h) => (0, h.0),
            Resource::Texture(h) => (1, h.0),
            Resource::Surface(h) => (2, h.0),
        });
        let count = all.len();
        for r in all {
            backend.dispose(r);
        }
        log::info!("[backend] disposed {count} resource(s)");
    }
}
