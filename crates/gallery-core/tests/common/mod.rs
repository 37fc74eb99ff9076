// Shared fixtures: an in-memory render backend and a few asset sources.

#![allow(dead_code)]

use gallery_core::*;
use instant::Instant;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::time::Duration;

pub const FRAME: Duration = Duration::from_millis(16);

#[derive(Default)]
pub struct MockBackend {
    next_id: u32,
    pub surfaces: HashSet<u32>,
    pub textures: HashSet<u32>,
    pub meshes: HashMap<u32, u32>,
    pub flat_textures: usize,
    pub presents: usize,
    pub disposed: Vec<Resource>,
    pub last_scene: Option<SceneFrame>,
    /// Refuse image textures, as a device out of memory would.
    pub reject_images: bool,
    /// Refuse every card mesh.
    pub reject_cards: bool,
}

impl MockBackend {
    fn id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn live(&self) -> usize {
        self.surfaces.len() + self.textures.len() + self.meshes.len()
    }
}

impl RenderBackend for MockBackend {
    fn create_surface(&mut self, _viewport: Viewport) -> Result<SurfaceHandle> {
        let id = self.id();
        self.surfaces.insert(id);
        Ok(SurfaceHandle(id))
    }

    fn create_texture(&mut self, texture: &CardTexture) -> Result<TextureHandle> {
        if self.reject_images && matches!(texture, CardTexture::Image(_)) {
            return Err(GalleryError::backend("texture allocation failed"));
        }
        if matches!(texture, CardTexture::Flat(_)) {
            self.flat_textures += 1;
        }
        let id = self.id();
        self.textures.insert(id);
        Ok(TextureHandle(id))
    }

    fn create_card(
        &mut self,
        _card: &CardDescriptor,
        texture: TextureHandle,
    ) -> Result<MeshHandle> {
        if self.reject_cards {
            return Err(GalleryError::backend("mesh allocation failed"));
        }
        let id = self.id();
        self.meshes.insert(id, texture.0);
        Ok(MeshHandle(id))
    }

    fn set_card_texture(&mut self, mesh: MeshHandle, texture: TextureHandle) -> Result<()> {
        match self.meshes.get_mut(&mesh.0) {
            Some(t) => {
                *t = texture.0;
                Ok(())
            }
            None => Err(GalleryError::backend("unknown mesh")),
        }
    }

    fn present(&mut self, frame: &SceneFrame, _camera: &Camera) -> Result<()> {
        self.presents += 1;
        self.last_scene = Some(*frame);
        Ok(())
    }

    fn dispose(&mut self, resource: Resource) {
        match resource {
            Resource::Surface(h) => {
                self.surfaces.remove(&h.0);
            }
            Resource::Texture(h) => {
                self.textures.remove(&h.0);
            }
            Resource::Mesh(h) => {
                self.meshes.remove(&h.0);
            }
        }
        self.disposed.push(resource);
    }
}

pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_fn(8, 8, |x, y| {
        image::Rgba([x as u8 * 30, y as u8 * 30, 90, 255])
    });
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Serves the same small PNG for every reference.
pub struct PngSource {
    bytes: Vec<u8>,
}

impl PngSource {
    pub fn new() -> Self {
        Self { bytes: png_bytes() }
    }
}

impl AssetSource for PngSource {
    fn fetch<'a>(&'a self, _image_ref: &'a str) -> FetchFuture<'a> {
        Box::pin(async move { Ok(self.bytes.clone()) })
    }
}

/// Every fetch fails, like a dead image host.
pub struct FailingSource;

impl AssetSource for FailingSource {
    fn fetch<'a>(&'a self, image_ref: &'a str) -> FetchFuture<'a> {
        Box::pin(async move { Err(GalleryError::fetch(image_ref, "HTTP 404")) })
    }
}

/// Returns bytes that are not an image.
pub struct GarbageSource;

impl AssetSource for GarbageSource {
    fn fetch<'a>(&'a self, _image_ref: &'a str) -> FetchFuture<'a> {
        Box::pin(async move { Ok(b"definitely not a jpeg".to_vec()) })
    }
}

/// Run one gallery frame and resolve every request it hands out.
pub fn pump<S: AssetSource>(
    gallery: &mut Gallery,
    backend: &mut MockBackend,
    source: &S,
    now: Instant,
) -> Vec<AssetRequest> {
    let requests = gallery.frame(now, backend);
    if let Some(tx) = gallery.asset_sender() {
        for req in requests.iter().cloned() {
            pollster::block_on(deliver(source, &SoftwareRaster, req, tx.clone()));
        }
    }
    requests.into_vec()
}

/// Step frames until the first stage is complete and nothing is left to
/// request. Returns the time of the last frame.
pub fn settle<S: AssetSource>(
    gallery: &mut Gallery,
    backend: &mut MockBackend,
    source: &S,
    mut now: Instant,
) -> Instant {
    let mut idle_frames = 0;
    for _ in 0..2_000 {
        let issued = pump(gallery, backend, source, now);
        if gallery.assets().is_fully_loaded() && issued.is_empty() {
            idle_frames += 1;
            if idle_frames > 3 {
                break;
            }
        } else {
            idle_frames = 0;
        }
        now += FRAME;
    }
    // one more frame applies anything posted by the last pump
    gallery.frame(now, backend);
    now
}

pub fn small_config(background_upgrade: bool) -> GalleryConfig {
    let mut cfg = GalleryConfig::default();
    cfg.loading.background_upgrade = background_upgrade;
    cfg
}

pub fn down(id: i32, x: f32, y: f32, at: Instant) -> InputEvent {
    InputEvent::Down(sample(id, x, y, at))
}

pub fn mv(id: i32, x: f32, y: f32, at: Instant) -> InputEvent {
    InputEvent::Move(sample(id, x, y, at))
}

pub fn up(id: i32, x: f32, y: f32, at: Instant) -> InputEvent {
    InputEvent::Up(sample(id, x, y, at))
}

pub fn touch_down(id: i32, x: f32, y: f32, at: Instant) -> InputEvent {
    InputEvent::Down(sample_on(DeviceClass::Touch, id, x, y, at))
}

pub fn touch_mv(id: i32, x: f32, y: f32, at: Instant) -> InputEvent {
    InputEvent::Move(sample_on(DeviceClass::Touch, id, x, y, at))
}

pub fn touch_up(id: i32, x: f32, y: f32, at: Instant) -> InputEvent {
    InputEvent::Up(sample_on(DeviceClass::Touch, id, x, y, at))
}

pub fn sample(id: i32, x: f32, y: f32, at: Instant) -> PointerSample {
    sample_on(DeviceClass::Pointer, id, x, y, at)
}

pub fn sample_on(device: DeviceClass, id: i32, x: f32, y: f32, at: Instant) -> PointerSample {
    PointerSample {
        id,
        position: glam::Vec2::new(x, y),
        device,
        primary: true,
        at,
    }
}
