//! Eased FOV/distance animation between the two camera postures.

use crate::config::CameraConfig;
use crate::state::{elapsed, Camera, Mode, Viewport};
use instant::Instant;
use std::time::Duration;

/// Cubic ease-out: fast start, gentle landing.
#[inline]
pub fn ease_out_cubic(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

#[derive(Clone, Copy, Debug)]
struct Transition {
    from_fov: f32,
    from_distance: f32,
    to_fov: f32,
    to_distance: f32,
    started_at: Instant,
    duration: Duration,
}

impl Transition {
    fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = elapsed(self.started_at, now);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }
}

/// Owns the camera and the in-flight mode transition, if any.
#[derive(Clone, Debug)]
pub struct CameraRig {
    camera: Camera,
    config: CameraConfig,
    transition: Option<Transition>,
}

impl CameraRig {
    pub fn new(config: CameraConfig, mode: Mode, viewport: Viewport) -> Self {
        let (fov, distance) = config.pose(mode);
        let mut camera = Camera::new(fov, config.near, config.far);
        camera.set_distance(distance);
        camera.aspect = viewport.aspect();
        Self {
            camera,
            config,
            transition: None,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.camera.aspect = viewport.aspect();
    }

    /// Start animating toward `mode`'s pose. Re-triggering mid-flight starts
    /// from wherever the camera currently is.
    pub fn retarget(&mut self, mode: Mode, now: Instant) {
        let (to_fov, to_distance) = self.config.pose(mode);
        self.transition = Some(Transition {
            from_fov: self.camera.fovy_radians,
            from_distance: self.camera.distance(),
            to_fov,
            to_distance,
            started_at: now,
            duration: self.config.transition(),
        });
        log::debug!("[camera] transition to {mode:?}");
    }

    /// Advance the transition; returns true while it is still running.
    pub fn step(&mut self, now: Instant) -> bool {
        let Some(t) = self.transition else {
            return false;
        };
        let p = t.progress(now);
        let eased = ease_out_cubic(p);
        self.camera.fovy_radians = t.from_fov + (t.to_fov - t.from_fov) * eased;
        self.camera
            .set_distance(t.from_distance + (t.to_distance - t.from_distance) * eased);
        if p >= 1.0 {
            self.transition = None;
            return false;
        }
        true
    }
}
