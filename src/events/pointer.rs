use super::Listener;
use crate::dom;
use crate::input;
use gallery_core::{Gallery, InputEvent, PointerSample};
use std::cell::RefCell;
use std::rc::Rc;
use web_sys as web;

#[derive(Clone)]
pub struct InputWiring {
    pub canvas: web::HtmlCanvasElement,
    pub gallery: Rc<RefCell<Gallery>>,
}

impl InputWiring {
    fn sample(&self, ev: &web::PointerEvent) -> PointerSample {
        input::pointer_sample(ev, &self.canvas, dom::viewport_css_width())
    }

    fn push(&self, event: InputEvent) {
        self.gallery.borrow_mut().push_input(event);
    }
}

/// Pointer events become queued gallery input; the frame loop consumes them.
pub fn wire_pointer_input(w: InputWiring) -> Vec<Listener> {
    let target: web::EventTarget = w.canvas.clone().into();
    vec![
        wire_pointerdown(&w, &target),
        wire_pointermove(&w, &target),
        wire_pointerup(&w, &target),
        wire_pointer_abort(&w, &target, "pointercancel"),
        wire_pointer_abort(&w, &target, "pointerleave"),
    ]
}

fn wire_pointerdown(w: &InputWiring, target: &web::EventTarget) -> Listener {
    let w = w.clone();
    Listener::new(target.clone(), "pointerdown", move |ev: web::PointerEvent| {
        // keep receiving moves when the drag leaves the canvas
        _ = w.canvas.set_pointer_capture(ev.pointer_id());
        ev.prevent_default();
        w.push(InputEvent::Down(w.sample(&ev)));
    })
}

fn wire_pointermove(w: &InputWiring, target: &web::EventTarget) -> Listener {
    let w = w.clone();
    Listener::new(target.clone(), "pointermove", move |ev: web::PointerEvent| {
        w.push(InputEvent::Move(w.sample(&ev)));
    })
}

fn wire_pointerup(w: &InputWiring, target: &web::EventTarget) -> Listener {
    let w = w.clone();
    Listener::new(target.clone(), "pointerup", move |ev: web::PointerEvent| {
        if w.canvas.has_pointer_capture(ev.pointer_id()) {
            _ = w.canvas.release_pointer_capture(ev.pointer_id());
        }
        w.push(InputEvent::Up(w.sample(&ev)));
    })
}

fn wire_pointer_abort(w: &InputWiring, target: &web::EventTarget, kind: &'static str) -> Listener {
    let w = w.clone();
    Listener::new(target.clone(), kind, move |ev: web::PointerEvent| {
        // a captured pointer still reports leave on some browsers; ignore it
        if kind == "pointerleave" && w.canvas.has_pointer_capture(ev.pointer_id()) {
            return;
        }
        w.push(InputEvent::Cancel(w.sample(&ev)));
    })
}
