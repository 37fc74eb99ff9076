use crate::constants::{
    LOADING_ID, OVERLAY_ROOT_ID, SELECTION_PANEL_ID, SELECTION_TITLE_ID,
};
use gallery_core::{GalleryItem, GallerySnapshot, Mode};
use web_sys as web;

#[inline]
pub fn mode_attr(mode: Mode) -> &'static str {
    match mode {
        Mode::Outside => "outside",
        Mode::Inside => "inside",
    }
}

#[inline]
pub fn loading_label(percent: u8) -> String {
    format!("Loading {}%", percent.min(100))
}

pub fn selection_label(item: &GalleryItem) -> String {
    format!("#{} {}", item.id, item.title)
}

#[inline]
fn set_hidden(el: &web::Element, hidden: bool) {
    let cl = el.class_list();
    if hidden {
        _ = cl.add_1("hidden");
        _ = el.set_attribute("style", "display:none");
    } else {
        _ = cl.remove_1("hidden");
        _ = el.set_attribute("style", "");
    }
}

/// Mirror the gallery snapshot into the page chrome.
pub fn sync(document: &web::Document, snap: &GallerySnapshot) {
    if let Some(root) = document.get_element_by_id(OVERLAY_ROOT_ID) {
        _ = root.set_attribute("data-mode", mode_attr(snap.mode));
        _ = root.set_attribute("data-loaded", if snap.fully_loaded { "true" } else { "false" });
    }
    if let Some(el) = document.get_element_by_id(LOADING_ID) {
        el.set_text_content(Some(&loading_label(snap.loading_percent)));
        set_hidden(&el, snap.fully_loaded);
    }
    if let Some(panel) = document.get_element_by_id(SELECTION_PANEL_ID) {
        set_hidden(&panel, snap.selected_item.is_none());
    }
    if let Some(title) = document.get_element_by_id(SELECTION_TITLE_ID) {
        let text = snap.selected_item.as_ref().map(selection_label).unwrap_or_default();
        title.set_text_content(Some(&text));
    }
}
