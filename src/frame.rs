use crate::assets::FetchSource;
use crate::dom;
use crate::overlay;
use crate::render::GpuState;
use gallery_core::{deliver, AssetRequest, Gallery, GallerySnapshot, SoftwareRaster, Viewport};
use instant::Instant;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys as web;

pub struct FrameContext {
    pub gallery: Rc<RefCell<Gallery>>,
    /// Dropped on teardown, which releases the surface and the device.
    pub gpu: Option<GpuState>,
    pub canvas: web::HtmlCanvasElement,
    pub document: web::Document,
    pub source: Rc<FetchSource>,
    pub raster: Rc<SoftwareRaster>,
    pub last_size: (u32, u32),
    pub last_snapshot: Option<GallerySnapshot>,
}

impl FrameContext {
    pub fn frame(&mut self) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let now = Instant::now();
        let size = dom::sync_canvas_backing_size(&self.canvas);
        if size != self.last_size {
            self.last_size = size;
            self.gallery
                .borrow_mut()
                .resize(Viewport::new(size.0, size.1), gpu);
        }

        let requests = self.gallery.borrow_mut().frame(now, gpu);
        self.spawn_requests(requests);

        let snap = self.gallery.borrow().snapshot();
        if self.last_snapshot.as_ref() != Some(&snap) {
            overlay::sync(&self.document, &snap);
            self.last_snapshot = Some(snap);
        }
    }

    fn spawn_requests(&self, requests: impl IntoIterator<Item = AssetRequest>) {
        let Some(tx) = self.gallery.borrow().asset_sender() else {
            return;
        };
        for request in requests {
            let source = self.source.clone();
            let raster = self.raster.clone();
            let tx = tx.clone();
            spawn_local(async move {
                deliver(&*source, &*raster, request, tx).await;
            });
        }
    }

    pub fn teardown(&mut self) {
        if let Some(mut gpu) = self.gpu.take() {
            self.gallery.borrow_mut().teardown(&mut gpu);
        }
    }
}

/// Handle to a running requestAnimationFrame loop.
pub struct FrameLoop {
    running: Rc<Cell<bool>>,
    raf_id: Rc<Cell<Option<i32>>>,
    tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
}

impl FrameLoop {
    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Stop scheduling frames. Safe to call more than once.
    pub fn stop(&self) {
        self.running.set(false);
        if let (Some(id), Some(w)) = (self.raf_id.take(), web::window()) {
            _ = w.cancel_animation_frame(id);
        }
        // the closure holds a clone of `tick`; dropping it breaks the cycle
        self.tick.borrow_mut().take();
    }
}

fn request_frame(
    tick: &Rc<RefCell<Option<Closure<dyn FnMut()>>>>,
    raf_id: &Rc<Cell<Option<i32>>>,
) {
    let Some(w) = web::window() else {
        return;
    };
    if let Some(cb) = tick.borrow().as_ref() {
        raf_id.set(w.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
    }
}

pub fn start_loop(frame_ctx: Rc<RefCell<FrameContext>>) -> FrameLoop {
    let tick: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
    let running = Rc::new(Cell::new(true));
    let raf_id = Rc::new(Cell::new(None));

    let tick_clone = tick.clone();
    let running_tick = running.clone();
    let raf_tick = raf_id.clone();
    *tick.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        raf_tick.set(None);
        if !running_tick.get() {
            return;
        }
        frame_ctx.borrow_mut().frame();
        request_frame(&tick_clone, &raf_tick);
    }) as Box<dyn FnMut()>));
    request_frame(&tick, &raf_id);

    FrameLoop {
        running,
        raf_id,
        tick,
    }
}
