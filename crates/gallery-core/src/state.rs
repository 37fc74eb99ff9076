//! Scene-side state types shared with the web frontend.
//!
//! These types avoid referencing platform-specific APIs. The frontend reads
//! them to build camera matrices and the per-frame scene transform.

use glam::{Mat4, Quat, Vec2, Vec3};
use instant::Instant;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Camera posture: orbiting outside the sphere, or standing at its center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Outside,
    Inside,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Outside => Mode::Inside,
            Mode::Inside => Mode::Outside,
        }
    }
}

/// Input device class. Touch gets lower drag sensitivity and longer coasting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    #[default]
    Pointer,
    Touch,
}

/// Surface size in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PitchYaw {
    pub pitch: f32,
    pub yaw: f32,
}

impl PitchYaw {
    pub const ZERO: Self = Self {
        pitch: 0.0,
        yaw: 0.0,
    };

    pub fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw }
    }

    pub fn scaled(self, k: f32) -> Self {
        Self::new(self.pitch * k, self.yaw * k)
    }

    pub fn is_negligible(&self, epsilon: f32) -> bool {
        self.pitch.abs() < epsilon && self.yaw.abs() < epsilon
    }
}

impl std::ops::Add for PitchYaw {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.pitch + rhs.pitch, self.yaw + rhs.yaw)
    }
}

impl std::ops::AddAssign for PitchYaw {
    fn add_assign(&mut self, rhs: Self) {
        self.pitch += rhs.pitch;
        self.yaw += rhs.yaw;
    }
}

impl std::ops::Sub for PitchYaw {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.pitch - rhs.pitch, self.yaw - rhs.yaw)
    }
}

/// Scene rotation. `current` chases `target`; `velocity` keeps it coasting.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotationState {
    pub current: PitchYaw,
    pub target: PitchYaw,
    pub velocity: PitchYaw,
}

impl RotationState {
    /// Scene orientation for the current pitch (about X) then yaw (about Y).
    pub fn quat(&self) -> Quat {
        Quat::from_euler(glam::EulerRot::XYZ, self.current.pitch, self.current.yaw, 0.0)
    }
}

/// Simple right-handed camera description with perspective projection.
///
/// The eye always sits on the +Z axis at `distance` from the sphere center and
/// looks down -Z; the scene rotates, the camera does not.
#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn new(fovy_radians: f32, znear: f32, zfar: f32) -> Self {
        let mut camera = Self {
            eye: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            aspect: 1.0,
            fovy_radians,
            znear,
            zfar,
        };
        camera.set_distance(0.0);
        camera
    }

    pub fn distance(&self) -> f32 {
        self.eye.z
    }

    /// Place the eye on the +Z axis; x and y stay pinned at zero.
    pub fn set_distance(&mut self, distance: f32) {
        self.eye = Vec3::new(0.0, 0.0, distance);
        self.target = self.eye + Vec3::NEG_Z;
    }

    /// Compute the clip-space projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }
    /// Compute the view matrix that transforms world to view space.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Time from `earlier` to `now`, zero if the clock reads out of order.
pub fn elapsed(earlier: Instant, now: Instant) -> Duration {
    if now > earlier {
        now.duration_since(earlier)
    } else {
        Duration::ZERO
    }
}
