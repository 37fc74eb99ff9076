//! The gallery: placed items, the rotation model, the camera, the asset
//! pipeline and every backend resource, stepped together once per frame.

use crate::assets::{
    AssetMessage, AssetOutcome, AssetPipeline, AssetRequest, CardTexture, Fidelity, LoadState,
};
use crate::backend::{
    CardDescriptor, MeshHandle, RenderBackend, Resource, ResourceLedger, SceneFrame,
    TextureHandle,
};
use crate::camera::CameraRig;
use crate::config::GalleryConfig;
use crate::constants::{
    BACKGROUND_INSIDE, BACKGROUND_OUTSIDE, FLAT_CARD_COLOR, PULSE_AMPLITUDE, PULSE_RATE,
};
use crate::interaction::{InputEvent, InteractionContext, InteractionOutcome};
use crate::item::{sanitize, GalleryItem};
use crate::layout::{layout_with, LayoutParams};
use crate::picking::{screen_to_world_ray, PickCandidate};
use crate::state::{elapsed, Camera, Mode, RotationState, Viewport};
use crate::Result;
use glam::{Quat, Vec2, Vec3};
use instant::Instant;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::mpsc::Sender;

/// One catalog record with its place on the sphere.
#[derive(Clone, Debug)]
pub struct PlacedItem {
    pub item: GalleryItem,
    pub position: Vec3,
    pub orientation: Quat,
    pub width: f32,
    pub height: f32,
    pub load_state: LoadState,
    mesh: Option<MeshHandle>,
    texture: Option<TextureHandle>,
}

impl PlacedItem {
    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    pub fn texture(&self) -> Option<TextureHandle> {
        self.texture
    }

    pub fn descriptor(&self, index: usize) -> CardDescriptor {
        CardDescriptor {
            index,
            position: self.position,
            orientation: self.orientation,
            width: self.width,
            height: self.height,
        }
    }
}

/// Read-only view for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GallerySnapshot {
    pub loading_percent: u8,
    pub fully_loaded: bool,
    pub mode: Mode,
    pub selected_item: Option<GalleryItem>,
}

fn place(items: Vec<GalleryItem>, config: &GalleryConfig) -> Vec<PlacedItem> {
    let items = sanitize(items);
    let placements = layout_with(items.len(), LayoutParams::from(&config.layout));
    let aspect = config.layout.card_aspect;
    items
        .into_iter()
        .zip(placements)
        .map(|(item, p)| PlacedItem {
            item,
            position: p.position,
            orientation: p.orientation,
            width: p.size,
            height: p.size * aspect,
            load_state: LoadState::Pending,
            mesh: None,
            texture: None,
        })
        .collect()
}

pub struct Gallery {
    config: GalleryConfig,
    items: Vec<PlacedItem>,
    interaction: InteractionContext,
    camera: CameraRig,
    assets: AssetPipeline,
    ledger: ResourceLedger,
    viewport: Viewport,
    input: SmallVec<[InputEvent; 8]>,
    selected: Option<usize>,
    built_at: Instant,
    last_frame: Option<Instant>,
    torn_down: bool,
}

impl Gallery {
    pub fn new(
        items: Vec<GalleryItem>,
        config: GalleryConfig,
        mode: Mode,
        viewport: Viewport,
        now: Instant,
    ) -> Self {
        let config = config.sanitized();
        let items = place(items, &config);
        let assets = AssetPipeline::new(
            items.len(),
            mode,
            config.loading.clone(),
            config.layout.card_aspect,
            now,
        );
        log::info!("[gallery] built {} cards in {mode:?} mode", items.len());
        Self {
            interaction: InteractionContext::new(config.motion.clone(), mode),
            camera: CameraRig::new(config.camera.clone(), mode, viewport),
            config,
            items,
            assets,
            ledger: ResourceLedger::default(),
            viewport,
            input: SmallVec::new(),
            selected: None,
            built_at: now,
            last_frame: None,
            torn_down: false,
        }
    }

    /// Allocate the drawing surface.
    pub fn attach(&mut self, backend: &mut dyn RenderBackend) -> Result<()> {
        let surface = backend.create_surface(self.viewport)?;
        self.ledger.track(Resource::Surface(surface));
        Ok(())
    }

    /// Replace the catalog: old cards are disposed, a new pipeline generation
    /// starts, rotation and mode carry over.
    pub fn rebuild(
        &mut self,
        items: Vec<GalleryItem>,
        backend: &mut dyn RenderBackend,
        now: Instant,
    ) {
        self.assets.close();
        for placed in &mut self.items {
            if let Some(mesh) = placed.mesh.take() {
                self.ledger.release(Resource::Mesh(mesh), backend);
            }
            if let Some(texture) = placed.texture.take() {
                self.ledger.release(Resource::Texture(texture), backend);
            }
        }
        self.items = place(items, &self.config);
        self.selected = None;
        self.assets = AssetPipeline::new(
            self.items.len(),
            self.interaction.mode(),
            self.config.loading.clone(),
            self.config.layout.card_aspect,
            now,
        );
        self.built_at = now;
        log::info!("[gallery] rebuilt with {} cards", self.items.len());
    }

    pub fn items(&self) -> &[PlacedItem] {
        &self.items
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.interaction.mode()
    }

    pub fn rotation(&self) -> &RotationState {
        &self.interaction.rotation
    }

    pub fn interaction(&self) -> &InteractionContext {
        &self.interaction
    }

    pub fn camera(&self) -> &Camera {
        self.camera.camera()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn assets(&self) -> &AssetPipeline {
        &self.assets
    }

    pub fn selected(&self) -> Option<&PlacedItem> {
        self.selected.and_then(|i| self.items.get(i))
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Channel end for spawned acquisitions; `None` once torn down.
    pub fn asset_sender(&self) -> Option<Sender<AssetMessage>> {
        self.assets.sender()
    }

    pub fn snapshot(&self) -> GallerySnapshot {
        GallerySnapshot {
            loading_percent: self.assets.loading_percent(),
            fully_loaded: self.assets.is_fully_loaded(),
            mode: self.mode(),
            selected_item: self.selected().map(|p| p.item.clone()),
        }
    }

    pub fn push_input(&mut self, event: InputEvent) {
        if !self.torn_down {
            self.input.push(event);
        }
    }

    pub fn resize(&mut self, viewport: Viewport, backend: &mut dyn RenderBackend) {
        self.viewport = viewport;
        self.camera.set_viewport(viewport);
        backend.resize_surface(viewport);
    }

    fn change_mode(&mut self, mode: Mode, now: Instant) {
        if self.interaction.set_mode(mode) {
            self.camera.retarget(mode, now);
        }
        if mode == Mode::Outside {
            self.selected = None;
        }
    }

    pub fn enter_gallery(&mut self, now: Instant) {
        self.change_mode(Mode::Inside, now);
    }

    pub fn exit_gallery(&mut self, now: Instant) {
        self.change_mode(Mode::Outside, now);
    }

    /// Select by catalog id. Returns false for an unknown id.
    pub fn select_item(&mut self, id: u32) -> bool {
        match self.items.iter().position(|p| p.item.id == id) {
            Some(index) => {
                self.select_index(index);
                true
            }
            None => {
                log::warn!("[gallery] select: no item #{id}");
                false
            }
        }
    }

    pub fn close_selection(&mut self) {
        self.selected = None;
    }

    fn select_index(&mut self, index: usize) {
        let Some(placed) = self.items.get(index) else {
            return;
        };
        log::info!("[gallery] selected #{} {:?}", placed.item.id, placed.item.title);
        self.assets.request_upgrade(index, placed.load_state);
        self.selected = Some(index);
    }

    /// Scene transform for `now`: rotation plus the outside "breathing" pulse.
    pub fn scene_frame(&self, now: Instant) -> SceneFrame {
        let (scale, background) = match self.mode() {
            Mode::Outside => {
                let t = elapsed(self.built_at, now).as_secs_f32();
                (1.0 + (t * PULSE_RATE).sin() * PULSE_AMPLITUDE, BACKGROUND_OUTSIDE)
            }
            Mode::Inside => (1.0, BACKGROUND_INSIDE),
        };
        SceneFrame {
            rotation: self.interaction.rotation.quat(),
            scale,
            background,
        }
    }

    /// Item index under the surface pixel `px`. Only cards that have a mesh count.
    pub fn pick(&self, px: Vec2, now: Instant, backend: &dyn RenderBackend) -> Option<usize> {
        let ray = screen_to_world_ray(self.camera.camera(), self.viewport, px);
        let local = ray.to_local(self.scene_frame(now).transform());
        let candidates: SmallVec<[PickCandidate; 32]> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, p)| p.mesh.is_some())
            .map(|(index, p)| PickCandidate {
                index,
                center: p.position,
                orientation: p.orientation,
                half_extents: Vec2::new(p.width, p.height) * 0.5,
            })
            .collect();
        backend.raycast(&local, &candidates).map(|hit| hit.index)
    }

    /// One frame: apply finished loads, handle input, step motion and the
    /// camera, then draw. Returns the asset requests to spawn.
    pub fn frame(
        &mut self,
        now: Instant,
        backend: &mut dyn RenderBackend,
    ) -> SmallVec<[AssetRequest; 8]> {
        if self.torn_down {
            return SmallVec::new();
        }

        for msg in self.assets.drain() {
            self.apply_asset(msg, backend, now);
        }

        for event in std::mem::take(&mut self.input) {
            match self.interaction.handle(event) {
                InteractionOutcome::None => {}
                InteractionOutcome::ModeChanged(mode) => self.camera.retarget(mode, now),
                InteractionOutcome::Pick(px) => {
                    if let Some(index) = self.pick(px, now, backend) {
                        self.select_index(index);
                    }
                }
            }
        }

        let dt = self
            .last_frame
            .map(|t| elapsed(t, now))
            .unwrap_or_default();
        self.last_frame = Some(now);
        self.interaction.step(dt, now, self.assets.fully_loaded_at());
        self.camera.step(now);

        let requests = self.assets.poll(now, &mut self.items);

        let scene = self.scene_frame(now);
        if let Err(e) = backend.present(&scene, self.camera.camera()) {
            log::warn!("[gallery] present failed: {e}");
        }
        requests
    }

    fn apply_asset(&mut self, msg: AssetMessage, backend: &mut dyn RenderBackend, now: Instant) {
        let Some(previous) = self.items.get(msg.index).map(|p| p.load_state) else {
            return;
        };
        let accepted = match msg.fidelity {
            Fidelity::Low => !previous.is_settled(),
            Fidelity::High => previous == LoadState::LowFidelity,
        };
        if accepted {
            let state = msg.resulting_state();
            if let (Some(state), Some(texture)) = (state, outcome_texture(&msg.outcome)) {
                let installed =
                    self.install_or_degrade(msg.index, msg.fidelity, state, texture, backend);
                if let Some(state) = installed {
                    self.items[msg.index].load_state = state;
                }
            }
        }
        self.assets.settle(&msg, previous, now);
    }

    /// Install `texture`, returning the state the item ends in. A failed first
    /// stage falls back to a flat card; a failed upgrade keeps the current one.
    fn install_or_degrade(
        &mut self,
        index: usize,
        fidelity: Fidelity,
        state: LoadState,
        texture: &CardTexture,
        backend: &mut dyn RenderBackend,
    ) -> Option<LoadState> {
        let Err(e) = self.install_texture(index, texture, backend) else {
            return Some(state);
        };
        log::warn!("[gallery] texture for index {index}: {e}");
        match fidelity {
            Fidelity::High => None,
            Fidelity::Low => {
                let flat = CardTexture::Flat(FLAT_CARD_COLOR);
                if *texture != flat {
                    if let Err(e) = self.install_texture(index, &flat, backend) {
                        log::warn!("[gallery] flat card for index {index}: {e}");
                    }
                }
                Some(LoadState::Placeholder)
            }
        }
    }

    fn install_texture(
        &mut self,
        index: usize,
        texture: &CardTexture,
        backend: &mut dyn RenderBackend,
    ) -> Result<()> {
        let handle = backend.create_texture(texture)?;
        self.ledger.track(Resource::Texture(handle));
        let placed = &mut self.items[index];
        match placed.mesh {
            Some(mesh) => {
                if let Err(e) = backend.set_card_texture(mesh, handle) {
                    self.ledger.release(Resource::Texture(handle), backend);
                    return Err(e);
                }
                // the superseded texture goes away with the swap
                if let Some(old) = placed.texture.replace(handle) {
                    self.ledger.release(Resource::Texture(old), backend);
                }
            }
            None => {
                let mesh = match backend.create_card(&placed.descriptor(index), handle) {
                    Ok(mesh) => mesh,
                    Err(e) => {
                        self.ledger.release(Resource::Texture(handle), backend);
                        return Err(e);
                    }
                };
                self.ledger.track(Resource::Mesh(mesh));
                placed.mesh = Some(mesh);
                placed.texture = Some(handle);
            }
        }
        Ok(())
    }

    /// Dispose every backend resource and close the completion channel.
    /// Idempotent.
    pub fn teardown(&mut self, backend: &mut dyn RenderBackend) {
        if self.torn_down {
            return;
        }
        self.assets.close();
        self.ledger.dispose_all(backend);
        for placed in &mut self.items {
            placed.mesh = None;
            placed.texture = None;
        }
        self.input.clear();
        self.selected = None;
        self.torn_down = true;
        log::info!("[gallery] torn down");
    }
}

fn outcome_texture(outcome: &AssetOutcome) -> Option<&CardTexture> {
    match outcome {
        AssetOutcome::Ready(t) | AssetOutcome::Placeholder(t) => Some(t),
        AssetOutcome::Unchanged => None,
    }
}
