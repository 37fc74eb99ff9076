// DOM wiring and renderer tuning for the web front-end.
//
// Motion, loading and layout tuning lives in `gallery_core::constants`; this
// file only holds what the browser shell itself needs.

// Element ids
pub const CANVAS_ID: &str = "app-canvas";
pub const CATALOG_SCRIPT_ID: &str = "gallery-catalog"; // <script type="application/json">
pub const CONFIG_SCRIPT_ID: &str = "gallery-config";
pub const LOADING_ID: &str = "loading-indicator";
pub const SELECTION_PANEL_ID: &str = "selection-panel";
pub const SELECTION_TITLE_ID: &str = "selection-title";
pub const ENTER_BUTTON_ID: &str = "enter-gallery";
pub const EXIT_BUTTON_ID: &str = "exit-gallery";
pub const CLOSE_SELECTION_ID: &str = "close-selection";
pub const OVERLAY_ROOT_ID: &str = "gallery-overlay"; // carries data-mode / data-loaded

// Canvas backing store
pub const MAX_DEVICE_PIXEL_RATIO: f64 = 2.0; // cap fill-rate on dense displays

// Renderer
pub const INITIAL_INSTANCE_CAPACITY: usize = 256; // grows by doubling
pub const ALPHA_DISCARD: f32 = 0.01; // fragments below this alpha are dropped
