// Host-side tests for pure input functions.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod input {
    include!("../src/input.rs");
}

use gallery_core::{DeviceClass, Mode};
use glam::Vec2;
use input::*;

#[test]
fn pointer_type_decides_device_class() {
    assert_eq!(device_class_for("touch", 1920.0), DeviceClass::Touch);
    assert_eq!(device_class_for("mouse", 320.0), DeviceClass::Pointer);
    assert_eq!(device_class_for("pen", 320.0), DeviceClass::Pointer);
}

#[test]
fn unknown_pointer_type_falls_back_to_viewport_width() {
    assert_eq!(device_class_for("", 768.0), DeviceClass::Touch);
    assert_eq!(device_class_for("", 375.0), DeviceClass::Touch);
    assert_eq!(device_class_for("", 769.0), DeviceClass::Pointer);
    assert_eq!(device_class_for("quill", 1440.0), DeviceClass::Pointer);
}

#[test]
fn css_offsets_scale_to_backing_pixels() {
    // 2x device pixel ratio
    let css = Vec2::new(400.0, 300.0);
    let backing = Vec2::new(800.0, 600.0);
    let px = css_to_backing(Vec2::new(100.0, 50.0), css, backing);
    assert_eq!(px, Vec2::new(200.0, 100.0));
    // corners map to corners
    let br = css_to_backing(Vec2::new(400.0, 300.0), css, backing);
    assert_eq!(br, Vec2::new(800.0, 600.0));
}

#[test]
fn zero_sized_canvas_maps_to_origin() {
    let px = css_to_backing(Vec2::new(10.0, 10.0), Vec2::ZERO, Vec2::new(800.0, 600.0));
    assert_eq!(px, Vec2::ZERO);
}

#[test]
fn escape_closes_selection_before_leaving() {
    assert_eq!(
        action_for_key("Escape", Mode::Inside, true),
        Some(KeyAction::CloseSelection)
    );
    assert_eq!(
        action_for_key("Escape", Mode::Inside, false),
        Some(KeyAction::ExitGallery)
    );
    assert_eq!(action_for_key("Escape", Mode::Outside, false), None);
}

#[test]
fn enter_only_enters_from_outside() {
    assert_eq!(
        action_for_key("Enter", Mode::Outside, false),
        Some(KeyAction::EnterGallery)
    );
    assert_eq!(action_for_key("Enter", Mode::Inside, false), None);
    assert_eq!(action_for_key("a", Mode::Outside, false), None);
}
