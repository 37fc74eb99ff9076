use gallery_core::constants::TOUCH_VIEWPORT_MAX_WIDTH;
use gallery_core::{DeviceClass, Mode, PointerSample};
use glam::Vec2;
use instant::Instant;
use web_sys as web;

/// Device class from the event's `pointerType`, falling back to a viewport
/// width guess when the browser leaves it empty.
#[inline]
pub fn device_class_for(pointer_type: &str, viewport_css_width: f32) -> DeviceClass {
    match pointer_type {
        "touch" => DeviceClass::Touch,
        "mouse" | "pen" => DeviceClass::Pointer,
        _ if viewport_css_width <= TOUCH_VIEWPORT_MAX_WIDTH => DeviceClass::Touch,
        _ => DeviceClass::Pointer,
    }
}

/// Map a CSS-pixel offset inside an element of `css_size` onto a backing
/// store of `backing_size` physical pixels.
#[inline]
pub fn css_to_backing(offset_css: Vec2, css_size: Vec2, backing_size: Vec2) -> Vec2 {
    if css_size.x <= 0.0 || css_size.y <= 0.0 {
        return Vec2::ZERO;
    }
    offset_css / css_size * backing_size
}

#[inline]
pub fn pointer_canvas_px(ev: &web::PointerEvent, canvas: &web::HtmlCanvasElement) -> Vec2 {
    let rect = canvas.get_bounding_client_rect();
    let offset = Vec2::new(
        ev.client_x() as f32 - rect.left() as f32,
        ev.client_y() as f32 - rect.top() as f32,
    );
    css_to_backing(
        offset,
        Vec2::new(rect.width() as f32, rect.height() as f32),
        Vec2::new(canvas.width() as f32, canvas.height() as f32),
    )
}

pub fn pointer_sample(
    ev: &web::PointerEvent,
    canvas: &web::HtmlCanvasElement,
    viewport_css_width: f32,
) -> PointerSample {
    PointerSample {
        id: ev.pointer_id(),
        position: pointer_canvas_px(ev, canvas),
        device: device_class_for(&ev.pointer_type(), viewport_css_width),
        primary: ev.is_primary(),
        at: Instant::now(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    EnterGallery,
    ExitGallery,
    CloseSelection,
}

/// Escape backs out one level: selection first, then the gallery itself.
#[inline]
pub fn action_for_key(key: &str, mode: Mode, has_selection: bool) -> Option<KeyAction> {
    match (key, mode) {
        ("Escape", _) if has_selection => Some(KeyAction::CloseSelection),
        ("Escape", Mode::Inside) => Some(KeyAction::ExitGallery),
        ("Enter", Mode::Outside) => Some(KeyAction::EnterGallery),
        _ => None,
    }
}
