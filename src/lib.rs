#![cfg(target_arch = "wasm32")]
use gallery_core::constants::DEFAULT_ITEM_COUNT;
use gallery_core::{
    default_catalog, Gallery, GalleryConfig, GalleryItem, Mode, SoftwareRaster, Viewport,
};
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

mod assets;
mod constants;
mod dom;
mod events;
mod frame;
mod input;
mod overlay;
mod render;

use events::Listener;

thread_local! {
    // the page-level gallery mounted at startup, if the page has a canvas for it
    static MOUNTED: RefCell<Option<GalleryHandle>> = const { RefCell::new(None) };
}

struct Mounted {
    gallery: Rc<RefCell<Gallery>>,
    frame_ctx: Rc<RefCell<frame::FrameContext>>,
    frame_loop: frame::FrameLoop,
    listeners: RefCell<Vec<Listener>>,
}

/// JS-facing control surface for one mounted gallery.
#[wasm_bindgen]
#[derive(Clone)]
pub struct GalleryHandle {
    inner: Rc<Mounted>,
}

impl GalleryHandle {
    fn with_gallery<T>(&self, f: impl FnOnce(&mut Gallery) -> T) -> T {
        f(&mut self.inner.gallery.borrow_mut())
    }
}

#[wasm_bindgen]
impl GalleryHandle {
    pub fn enter_gallery(&self) {
        self.with_gallery(|g| g.enter_gallery(Instant::now()));
    }

    pub fn exit_gallery(&self) {
        self.with_gallery(|g| g.exit_gallery(Instant::now()));
    }

    /// Returns false when no item has this id.
    pub fn select_item(&self, id: u32) -> bool {
        self.with_gallery(|g| g.select_item(id))
    }

    pub fn close_selection(&self) {
        self.with_gallery(|g| g.close_selection());
    }

    pub fn loading_percent(&self) -> u8 {
        self.with_gallery(|g| g.snapshot().loading_percent)
    }

    pub fn is_inside(&self) -> bool {
        self.with_gallery(|g| g.mode() == Mode::Inside)
    }

    pub fn selected_item_id(&self) -> Option<u32> {
        self.with_gallery(|g| g.selected().map(|p| p.item.id))
    }

    /// The full snapshot as JSON.
    pub fn snapshot_json(&self) -> String {
        let snap = self.with_gallery(|g| g.snapshot());
        serde_json::to_string(&snap).unwrap_or_default()
    }

    /// Swap in a new catalog given as a JSON array of items.
    pub fn set_catalog_json(&self, json: &str) -> Result<(), JsValue> {
        let items: Vec<GalleryItem> =
            serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let mut ctx = self.inner.frame_ctx.borrow_mut();
        let ctx = &mut *ctx;
        let Some(gpu) = ctx.gpu.as_mut() else {
            return Err(JsValue::from_str("gallery destroyed"));
        };
        ctx.gallery.borrow_mut().rebuild(items, gpu, Instant::now());
        Ok(())
    }

    /// Stop the frame loop, unhook listeners and release every GPU resource,
    /// the device and surface included.
    pub fn destroy(&self) {
        if !self.inner.frame_loop.is_running() && self.inner.listeners.borrow().is_empty() {
            return;
        }
        self.inner.frame_loop.stop();
        self.inner.listeners.borrow_mut().clear();
        self.inner.frame_ctx.borrow_mut().teardown();
        MOUNTED.with(|m| {
            let mut m = m.borrow_mut();
            if m.as_ref().is_some_and(|h| Rc::ptr_eq(&h.inner, &self.inner)) {
                *m = None;
            }
        });
        log::info!("[gallery] destroyed");
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    spawn_local(async move {
        if let Err(e) = init().await {
            log::error!("init error: {:?}", e);
        }
    });
}

/// Mount a gallery on the canvas with `canvas_id`.
#[wasm_bindgen]
pub async fn mount(canvas_id: String) -> Result<GalleryHandle, JsValue> {
    mount_on(&canvas_id)
        .await
        .map_err(|e| JsValue::from_str(&format!("{e:#}")))
}

/// The gallery mounted at startup.
#[wasm_bindgen]
pub fn gallery() -> Option<GalleryHandle> {
    MOUNTED.with(|m| m.borrow().clone())
}

async fn init() -> anyhow::Result<()> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    if document.get_element_by_id(constants::CANVAS_ID).is_none() {
        log::info!("[gallery] no #{} canvas; waiting for mount()", constants::CANVAS_ID);
        return Ok(());
    }
    let handle = mount_on(constants::CANVAS_ID).await?;
    for l in wire_overlay_buttons(&document, &handle.inner.gallery) {
        handle.inner.listeners.borrow_mut().push(l);
    }
    MOUNTED.with(|m| *m.borrow_mut() = Some(handle));
    Ok(())
}

fn read_catalog(document: &web::Document) -> Vec<GalleryItem> {
    dom::read_json_script(document, constants::CATALOG_SCRIPT_ID)
        .unwrap_or_else(|| default_catalog(DEFAULT_ITEM_COUNT))
}

async fn mount_on(canvas_id: &str) -> anyhow::Result<GalleryHandle> {
    let document = dom::window_document().ok_or_else(|| anyhow::anyhow!("no document"))?;
    let canvas: web::HtmlCanvasElement = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| anyhow::anyhow!("missing #{canvas_id}"))?
        .dyn_into()
        .map_err(|_| anyhow::anyhow!("#{canvas_id} is not a canvas"))?;

    let (w, h) = dom::sync_canvas_backing_size(&canvas);
    let config: GalleryConfig =
        dom::read_json_script(&document, constants::CONFIG_SCRIPT_ID).unwrap_or_default();
    let items = read_catalog(&document);

    let mut gpu = render::GpuState::new(&canvas).await?;
    let viewport = Viewport::new(w, h);
    let mut gallery = Gallery::new(items, config, Mode::Outside, viewport, Instant::now());
    gallery
        .attach(&mut gpu)
        .map_err(|e| anyhow::anyhow!("attach surface: {e}"))?;
    let gallery = Rc::new(RefCell::new(gallery));

    let mut listeners = events::wire_pointer_input(events::pointer::InputWiring {
        canvas: canvas.clone(),
        gallery: gallery.clone(),
    });
    listeners.extend(events::wire_global_keydown(gallery.clone()));

    let frame_ctx = Rc::new(RefCell::new(frame::FrameContext {
        gallery: gallery.clone(),
        gpu: Some(gpu),
        canvas,
        document,
        source: Rc::new(assets::FetchSource),
        raster: Rc::new(SoftwareRaster),
        last_size: (w, h),
        last_snapshot: None,
    }));
    let frame_loop = frame::start_loop(frame_ctx.clone());

    Ok(GalleryHandle {
        inner: Rc::new(Mounted {
            gallery,
            frame_ctx,
            frame_loop,
            listeners: RefCell::new(listeners),
        }),
    })
}

fn wire_overlay_buttons(
    document: &web::Document,
    gallery: &Rc<RefCell<Gallery>>,
) -> Vec<Listener> {
    let mut out = Vec::new();
    let g = gallery.clone();
    out.extend(dom::add_click_listener(document, constants::ENTER_BUTTON_ID, move |_| {
        g.borrow_mut().enter_gallery(Instant::now());
    }));
    let g = gallery.clone();
    out.extend(dom::add_click_listener(document, constants::EXIT_BUTTON_ID, move |_| {
        g.borrow_mut().exit_gallery(Instant::now());
    }));
    let g = gallery.clone();
    out.extend(dom::add_click_listener(document, constants::CLOSE_SELECTION_ID, move |_| {
        g.borrow_mut().close_selection();
    }));
    out
}
