use super::Listener;
use crate::input::{action_for_key, KeyAction};
use gallery_core::Gallery;
use instant::Instant;
use std::cell::RefCell;
use std::rc::Rc;
use web_sys as web;

pub fn apply_key_action(gallery: &mut Gallery, action: KeyAction, now: Instant) {
    match action {
        KeyAction::EnterGallery => gallery.enter_gallery(now),
        KeyAction::ExitGallery => gallery.exit_gallery(now),
        KeyAction::CloseSelection => gallery.close_selection(),
    }
}

pub fn wire_global_keydown(gallery: Rc<RefCell<Gallery>>) -> Option<Listener> {
    let window = web::window()?;
    Some(Listener::new(
        window.into(),
        "keydown",
        move |ev: web::KeyboardEvent| {
            if ev.repeat() {
                return;
            }
            let mut g = gallery.borrow_mut();
            let action = action_for_key(&ev.key(), g.mode(), g.selected().is_some());
            if let Some(action) = action {
                ev.prevent_default();
                log::debug!("[keys] {action:?}");
                apply_key_action(&mut g, action, Instant::now());
            }
        },
    ))
}
