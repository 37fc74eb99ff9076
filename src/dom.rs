use crate::constants::MAX_DEVICE_PIXEL_RATIO;
use crate::events::Listener;
use serde::de::DeserializeOwned;
use web_sys as web;

pub fn window_document() -> Option<web::Document> {
    web::window().and_then(|w| w.document())
}

/// Keep the canvas backing store in step with its CSS size. Returns the new
/// backing size in physical pixels.
pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) -> (u32, u32) {
    let dpr = web::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .clamp(1.0, MAX_DEVICE_PIXEL_RATIO);
    let rect = canvas.get_bounding_client_rect();
    let w = ((rect.width() * dpr).round() as u32).max(1);
    let h = ((rect.height() * dpr).round() as u32).max(1);
    if canvas.width() != w || canvas.height() != h {
        canvas.set_width(w);
        canvas.set_height(h);
    }
    (w, h)
}

pub fn viewport_css_width() -> f32 {
    web::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(1024.0) as f32
}

/// Parse the JSON body of an inline `<script type="application/json">`.
/// Missing elements are `None`; malformed JSON is logged and also `None`.
pub fn read_json_script<T: DeserializeOwned>(document: &web::Document, id: &str) -> Option<T> {
    let text = document.get_element_by_id(id)?.text_content()?;
    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("[dom] ignoring #{id}: {e}");
            None
        }
    }
}

pub fn add_click_listener(
    document: &web::Document,
    id: &str,
    handler: impl FnMut(web::Event) + 'static,
) -> Option<Listener> {
    let el = document.get_element_by_id(id)?;
    Some(Listener::new(el.into(), "click", handler))
}
