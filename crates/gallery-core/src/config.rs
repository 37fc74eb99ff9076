//! Runtime configuration. Every field defaults to the matching constant in
//! [`crate::constants`], and every section is `#[serde(default)]` so a JSON
//! override only needs the keys it changes.

use crate::constants::*;
use crate::state::{DeviceClass, Mode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub layout: LayoutConfig,
    pub loading: LoadingConfig,
    pub motion: MotionConfig,
    pub camera: CameraConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub sphere_radius: f32,
    pub shrink_factor: f32,
    pub card_aspect: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sphere_radius: SPHERE_RADIUS,
            shrink_factor: CARD_SHRINK_FACTOR,
            card_aspect: CARD_ASPECT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    pub immediate_count: usize,
    pub stagger_ms: u64,
    pub inside_immediate_count: usize,
    pub inside_stagger_ms: u64,
    pub background_upgrade: bool,
    pub upgrade_stagger_ms: u64,
    pub low_width: u32,
    pub high_width: u32,
    pub placeholder_width: u32,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            immediate_count: IMMEDIATE_LOAD_COUNT,
            stagger_ms: LOAD_STAGGER_MS,
            inside_immediate_count: INSIDE_IMMEDIATE_LOAD_COUNT,
            inside_stagger_ms: INSIDE_LOAD_STAGGER_MS,
            background_upgrade: true,
            upgrade_stagger_ms: UPGRADE_STAGGER_MS,
            low_width: LOW_FIDELITY_WIDTH,
            high_width: HIGH_FIDELITY_WIDTH,
            placeholder_width: PLACEHOLDER_WIDTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub damping_outside: f32,
    pub damping_inside: f32,
    pub sensitivity_outside: f32,
    pub sensitivity_inside: f32,
    pub touch_sensitivity_scale: f32,
    pub double_tap_sensitivity_scale: f32,
    pub velocity_decay_pointer: f32,
    pub velocity_decay_touch: f32,
    pub momentum_retention_pointer: f32,
    pub momentum_retention_touch: f32,
    pub velocity_epsilon: f32,
    pub auto_rotate_reveal: f32,
    pub auto_rotate_steady: f32,
    pub reveal_spin_ms: u64,
    pub tap_max_displacement_px: f32,
    pub tap_max_duration_ms: u64,
    pub double_tap_window_ms: u64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            damping_outside: DAMPING_OUTSIDE,
            damping_inside: DAMPING_INSIDE,
            sensitivity_outside: DRAG_SENSITIVITY_OUTSIDE,
            sensitivity_inside: DRAG_SENSITIVITY_INSIDE,
            touch_sensitivity_scale: TOUCH_SENSITIVITY_SCALE,
            double_tap_sensitivity_scale: DOUBLE_TAP_SENSITIVITY_SCALE,
            velocity_decay_pointer: VELOCITY_DECAY_POINTER,
            velocity_decay_touch: VELOCITY_DECAY_TOUCH,
            momentum_retention_pointer: MOMENTUM_RETENTION_POINTER,
            momentum_retention_touch: MOMENTUM_RETENTION_TOUCH,
            velocity_epsilon: VELOCITY_EPSILON,
            auto_rotate_reveal: AUTO_ROTATE_REVEAL,
            auto_rotate_steady: AUTO_ROTATE_STEADY,
            reveal_spin_ms: REVEAL_SPIN_MS,
            tap_max_displacement_px: TAP_MAX_DISPLACEMENT_PX,
            tap_max_duration_ms: TAP_MAX_DURATION_MS,
            double_tap_window_ms: DOUBLE_TAP_WINDOW_MS,
        }
    }
}

fn bounded(value: f32, lo: f32, hi: f32, fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(lo, hi)
    } else {
        fallback
    }
}

impl GalleryConfig {
    /// Pull page-supplied motion values back into ranges the rotation model
    /// stays stable in.
    pub fn sanitized(mut self) -> Self {
        let motion = self.motion.clone().sanitized();
        if motion != self.motion {
            log::warn!("[config] motion values out of range were clamped");
        }
        self.motion = motion;
        self
    }
}

impl MotionConfig {
    /// Damping in (0, 1], decay below 1, retention in [0, 1], scales and
    /// rates non-negative. Non-finite values fall back to the defaults.
    pub fn sanitized(self) -> Self {
        let d = MotionConfig::default();
        Self {
            damping_outside: bounded(self.damping_outside, MIN_DAMPING, 1.0, d.damping_outside),
            damping_inside: bounded(self.damping_inside, MIN_DAMPING, 1.0, d.damping_inside),
            sensitivity_outside: bounded(
                self.sensitivity_outside,
                0.0,
                f32::MAX,
                d.sensitivity_outside,
            ),
            sensitivity_inside: bounded(
                self.sensitivity_inside,
                0.0,
                f32::MAX,
                d.sensitivity_inside,
            ),
            touch_sensitivity_scale: bounded(
                self.touch_sensitivity_scale,
                0.0,
                f32::MAX,
                d.touch_sensitivity_scale,
            ),
            double_tap_sensitivity_scale: bounded(
                self.double_tap_sensitivity_scale,
                0.0,
                f32::MAX,
                d.double_tap_sensitivity_scale,
            ),
            velocity_decay_pointer: bounded(
                self.velocity_decay_pointer,
                0.0,
                MAX_VELOCITY_DECAY,
                d.velocity_decay_pointer,
            ),
            velocity_decay_touch: bounded(
                self.velocity_decay_touch,
                0.0,
                MAX_VELOCITY_DECAY,
                d.velocity_decay_touch,
            ),
            momentum_retention_pointer: bounded(
                self.momentum_retention_pointer,
                0.0,
                1.0,
                d.momentum_retention_pointer,
            ),
            momentum_retention_touch: bounded(
                self.momentum_retention_touch,
                0.0,
                1.0,
                d.momentum_retention_touch,
            ),
            velocity_epsilon: bounded(
                self.velocity_epsilon,
                f32::MIN_POSITIVE,
                f32::MAX,
                d.velocity_epsilon,
            ),
            auto_rotate_reveal: bounded(
                self.auto_rotate_reveal,
                0.0,
                f32::MAX,
                d.auto_rotate_reveal,
            ),
            auto_rotate_steady: bounded(
                self.auto_rotate_steady,
                0.0,
                f32::MAX,
                d.auto_rotate_steady,
            ),
            tap_max_displacement_px: bounded(
                self.tap_max_displacement_px,
                0.0,
                f32::MAX,
                d.tap_max_displacement_px,
            ),
            ..self
        }
    }

    pub fn damping(&self, mode: Mode) -> f32 {
        match mode {
            Mode::Outside => self.damping_outside,
            Mode::Inside => self.damping_inside,
        }
    }

    /// Radians of rotation per dragged pixel.
    pub fn sensitivity(&self, mode: Mode, device: DeviceClass) -> f32 {
        let base = match mode {
            Mode::Outside => self.sensitivity_outside,
            Mode::Inside => self.sensitivity_inside,
        };
        match device {
            DeviceClass::Pointer => base,
            DeviceClass::Touch => base * self.touch_sensitivity_scale,
        }
    }

    pub fn velocity_decay(&self, device: DeviceClass) -> f32 {
        match device {
            DeviceClass::Pointer => self.velocity_decay_pointer,
            DeviceClass::Touch => self.velocity_decay_touch,
        }
    }

    pub fn momentum_retention(&self, device: DeviceClass) -> f32 {
        match device {
            DeviceClass::Pointer => self.momentum_retention_pointer,
            DeviceClass::Touch => self.momentum_retention_touch,
        }
    }

    pub fn tap_max_duration(&self) -> Duration {
        Duration::from_millis(self.tap_max_duration_ms)
    }

    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }

    pub fn reveal_spin(&self) -> Duration {
        Duration::from_millis(self.reveal_spin_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_outside_deg: f32,
    pub fov_inside_deg: f32,
    pub distance_outside: f32,
    pub distance_inside: f32,
    pub transition_ms: u64,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_outside_deg: FOV_OUTSIDE_DEG,
            fov_inside_deg: FOV_INSIDE_DEG,
            distance_outside: CAMERA_DISTANCE_OUTSIDE,
            distance_inside: CAMERA_DISTANCE_INSIDE,
            transition_ms: CAMERA_TRANSITION_MS,
            near: CAMERA_NEAR,
            far: CAMERA_FAR,
        }
    }
}

impl CameraConfig {
    /// Field of view (radians) and eye distance from the sphere center for a mode.
    pub fn pose(&self, mode: Mode) -> (f32, f32) {
        match mode {
            Mode::Outside => (self.fov_outside_deg.to_radians(), self.distance_outside),
            Mode::Inside => (self.fov_inside_deg.to_radians(), self.distance_inside),
        }
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_survive_sanitizing() {
        let cfg = GalleryConfig::default();
        assert_eq!(cfg.clone().sanitized(), cfg);
    }

    #[test]
    fn runaway_motion_values_are_clamped() {
        let json = r#"{"motion": {
            "velocity_decay_pointer": 1.2,
            "velocity_decay_touch": 1.0,
            "damping_outside": -0.5,
            "damping_inside": 3.0,
            "momentum_retention_touch": 4.0,
            "sensitivity_inside": -0.01,
            "velocity_epsilon": 0.0
        }}"#;
        let cfg: GalleryConfig = serde_json::from_str(json).expect("parse");
        let m = cfg.sanitized().motion;
        assert!(m.velocity_decay_pointer < 1.0);
        assert!(m.velocity_decay_touch < 1.0);
        assert!(m.damping_outside > 0.0);
        assert_eq!(m.damping_inside, 1.0);
        assert_eq!(m.momentum_retention_touch, 1.0);
        assert_eq!(m.sensitivity_inside, 0.0);
        assert!(m.velocity_epsilon > 0.0);
        // untouched keys keep their defaults
        assert_eq!(m.sensitivity_outside, DRAG_SENSITIVITY_OUTSIDE);
    }

    #[test]
    fn non_finite_values_fall_back_to_defaults() {
        let mut cfg = GalleryConfig::default();
        cfg.motion.damping_outside = f32::NAN;
        cfg.motion.auto_rotate_steady = f32::INFINITY;
        let m = cfg.sanitized().motion;
        assert_eq!(m.damping_outside, DAMPING_OUTSIDE);
        assert_eq!(m.auto_rotate_steady, AUTO_ROTATE_STEADY);
    }
}
