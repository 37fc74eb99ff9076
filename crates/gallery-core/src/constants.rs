// Shared layout/loading/motion tuning constants. `GalleryConfig::default()` is
// built from these; the per-frame motion values are defined at 60 frames/s.

// Layout
pub const SPHERE_RADIUS: f32 = 5.0; // world units
pub const MIN_SPHERE_RADIUS: f32 = 1e-3; // degenerate radii are clamped to this
pub const CARD_SHRINK_FACTOR: f32 = 0.35; // card size relative to average spacing
pub const CARD_ASPECT: f32 = 1.4; // height / width
pub const EQUATOR_SIZE_BOOST: f32 = 0.08; // +8% at the equator, -8% at the poles
pub const POLE_UP_SWITCH: f32 = 0.95; // |y|/r above which the look-at up vector becomes +Z
pub const DEFAULT_ITEM_COUNT: usize = 150;

// Loading schedule
pub const IMMEDIATE_LOAD_COUNT: usize = 30;
pub const LOAD_STAGGER_MS: u64 = 10;
pub const INSIDE_IMMEDIATE_LOAD_COUNT: usize = 100;
pub const INSIDE_LOAD_STAGGER_MS: u64 = 2;
pub const UPGRADE_STAGGER_MS: u64 = 20; // background Low -> High upgrades after full load

// Texture resolutions (width in px, height = width * CARD_ASPECT)
pub const LOW_FIDELITY_WIDTH: u32 = 32;
pub const HIGH_FIDELITY_WIDTH: u32 = 256;
pub const PLACEHOLDER_WIDTH: u32 = 128;
pub const CORNER_RADIUS_FRACTION: f32 = 0.04; // of texture width
pub const MIN_CORNER_RADIUS_PX: u32 = 2;
pub const MAX_TEXTURE_SIDE: u32 = 4096; // raster refuses larger targets

// Placeholder palette
pub const PLACEHOLDER_GRADIENT_START: [u8; 3] = [0x63, 0x66, 0xf1]; // indigo-500
pub const PLACEHOLDER_GRADIENT_END: [u8; 3] = [0x8b, 0x5c, 0xf6]; // violet-500
pub const FLAT_CARD_COLOR: [u8; 4] = [0x8b, 0x5c, 0xf6, 0xe6]; // violet, 0.9 opacity

// Rotation damping toward target (fraction per frame)
pub const DAMPING_OUTSIDE: f32 = 0.03;
pub const DAMPING_INSIDE: f32 = 0.05;

// Drag sensitivity (radians per pixel)
pub const DRAG_SENSITIVITY_OUTSIDE: f32 = 0.0025;
pub const DRAG_SENSITIVITY_INSIDE: f32 = 0.004;
pub const TOUCH_SENSITIVITY_SCALE: f32 = 0.5;
pub const DOUBLE_TAP_SENSITIVITY_SCALE: f32 = 0.5; // finer free-look

// Momentum
pub const VELOCITY_DECAY_POINTER: f32 = 0.95;
pub const VELOCITY_DECAY_TOUCH: f32 = 0.97; // touch coasts longer
pub const MOMENTUM_RETENTION_POINTER: f32 = 0.85;
pub const MOMENTUM_RETENTION_TOUCH: f32 = 1.0;
pub const VELOCITY_EPSILON: f32 = 1e-4;
pub const MAX_VELOCITY_DECAY: f32 = 0.999; // at 1.0 coasting never ends
pub const MIN_DAMPING: f32 = 0.001; // at 0 the view never follows the target

// Auto-rotation (radians per frame)
pub const AUTO_ROTATE_REVEAL: f32 = 0.005;
pub const AUTO_ROTATE_STEADY: f32 = 0.001;
pub const REVEAL_SPIN_MS: u64 = 3000;

// Gesture classification
pub const TAP_MAX_DISPLACEMENT_PX: f32 = 5.0;
pub const TAP_MAX_DURATION_MS: u64 = 250;
pub const DOUBLE_TAP_WINDOW_MS: u64 = 300;
pub const TOUCH_VIEWPORT_MAX_WIDTH: f32 = 768.0; // fallback device-class guess

// Frame-rate compensation
pub const REFERENCE_FPS: f32 = 60.0;
pub const MAX_FRAME_STEPS: f32 = 4.0; // cap catch-up after a stalled tab

// Camera
pub const FOV_OUTSIDE_DEG: f32 = 75.0;
pub const FOV_INSIDE_DEG: f32 = 100.0;
pub const CAMERA_DISTANCE_OUTSIDE: f32 = 15.0;
pub const CAMERA_DISTANCE_INSIDE: f32 = 0.0;
pub const CAMERA_TRANSITION_MS: u64 = 1000;
pub const CAMERA_NEAR: f32 = 0.1;
pub const CAMERA_FAR: f32 = 1000.0;

// Scene "breathing" while outside
pub const PULSE_AMPLITUDE: f32 = 0.02;
pub const PULSE_RATE: f32 = 0.5; // radians per second

// Clear colors per mode (linear-ish rgb, 0..1)
pub const BACKGROUND_OUTSIDE: [f32; 3] = [0.961, 0.961, 0.961]; // #f5f5f5
pub const BACKGROUND_INSIDE: [f32; 3] = [0.910, 0.910, 0.910]; // #e8e8e8
