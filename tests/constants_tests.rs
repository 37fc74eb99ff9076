// Host-side tests for constants and their relationships.
// The main crate is wasm-only, so we include the pure-Rust modules directly.

#![allow(dead_code)]
mod constants {
    include!("../src/constants.rs");
}

use constants::*;

#[test]
#[allow(clippy::assertions_on_constants)]
fn renderer_constants_are_within_reasonable_bounds() {
    assert!(MAX_DEVICE_PIXEL_RATIO >= 1.0);
    assert!(INITIAL_INSTANCE_CAPACITY.is_power_of_two());
    // room for the default catalog without regrowing
    assert!(INITIAL_INSTANCE_CAPACITY >= gallery_core::constants::DEFAULT_ITEM_COUNT);
    assert!(ALPHA_DISCARD > 0.0 && ALPHA_DISCARD < 0.5);
}

#[test]
fn element_ids_are_distinct() {
    let ids = [
        CANVAS_ID,
        CATALOG_SCRIPT_ID,
        CONFIG_SCRIPT_ID,
        LOADING_ID,
        SELECTION_PANEL_ID,
        SELECTION_TITLE_ID,
        ENTER_BUTTON_ID,
        EXIT_BUTTON_ID,
        CLOSE_SELECTION_ID,
        OVERLAY_ROOT_ID,
    ];
    for (i, a) in ids.iter().enumerate() {
        assert!(!a.is_empty());
        for b in &ids[i + 1..] {
            assert_ne!(a, b);
        }
    }
}
