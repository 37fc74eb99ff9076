//! Pointer/touch gesture handling and the rotation model.
//!
//! Raw events are queued by the front-end and fed through
//! [`InteractionContext::handle`]; [`InteractionContext::step`] runs once per
//! frame to apply auto-rotation, coasting and damping. Per-frame constants are
//! tuned at 60 frames/s and compensated for the real frame time.

use crate::config::MotionConfig;
use crate::constants::{MAX_FRAME_STEPS, REFERENCE_FPS};
use crate::state::{elapsed, DeviceClass, Mode, PitchYaw, RotationState};
use glam::Vec2;
use instant::Instant;
use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

/// One pointer event, already mapped into surface pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub id: i32,
    pub position: Vec2,
    pub device: DeviceClass,
    pub primary: bool,
    pub at: Instant,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Down(PointerSample),
    Move(PointerSample),
    Up(PointerSample),
    /// pointercancel / pointerleave: ends the gesture without selecting.
    Cancel(PointerSample),
}

impl InputEvent {
    pub fn sample(&self) -> &PointerSample {
        match self {
            InputEvent::Down(s)
            | InputEvent::Move(s)
            | InputEvent::Up(s)
            | InputEvent::Cancel(s) => s,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GestureKind {
    #[default]
    Undetermined,
    Tap,
    Drag,
    DoubleTapDrag,
}

/// Ephemeral record of one active pointer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputGesture {
    pub pointer_id: i32,
    pub device: DeviceClass,
    pub start_pos: Vec2,
    pub last_pos: Vec2,
    pub start_time: Instant,
    pub kind: GestureKind,
}

impl InputGesture {
    fn begin(sample: &PointerSample) -> Self {
        Self {
            pointer_id: sample.id,
            device: sample.device,
            start_pos: sample.position,
            last_pos: sample.position,
            start_time: sample.at,
            kind: GestureKind::Undetermined,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InteractionState {
    #[default]
    Idle,
    Dragging(InputGesture),
    DoubleTapNavigating(InputGesture),
}

impl InteractionState {
    pub fn gesture(&self) -> Option<&InputGesture> {
        match self {
            InteractionState::Idle => None,
            InteractionState::Dragging(g) | InteractionState::DoubleTapNavigating(g) => Some(g),
        }
    }

    fn gesture_mut(&mut self) -> Option<&mut InputGesture> {
        match self {
            InteractionState::Idle => None,
            InteractionState::Dragging(g) | InteractionState::DoubleTapNavigating(g) => Some(g),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }
}

/// What a handled event asks the gallery to do next.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionOutcome {
    None,
    ModeChanged(Mode),
    /// A tap while inside: ray-cast from this surface pixel.
    Pick(Vec2),
}

#[derive(Clone, Copy, Debug)]
struct DownRecord {
    at: Instant,
    device: DeviceClass,
}

/// Number of reference frames `dt` stands for, capped after long stalls.
pub fn frame_steps(dt: Duration) -> f32 {
    (dt.as_secs_f32() * REFERENCE_FPS).clamp(0.0, MAX_FRAME_STEPS)
}

/// Apply a per-frame multiplicative factor `k` over `frames` reference frames.
#[inline]
pub fn compensate(k: f32, frames: f32) -> f32 {
    k.powf(frames)
}

fn clamp_pitch(p: &mut PitchYaw) {
    p.pitch = p.pitch.clamp(-FRAC_PI_2, FRAC_PI_2);
}

pub struct InteractionContext {
    pub rotation: RotationState,
    mode: Mode,
    state: InteractionState,
    last_down: Option<DownRecord>,
    /// Device that produced the current coasting velocity.
    coast_device: DeviceClass,
    /// Total yaw contributed by auto-rotation since build.
    auto_yaw: f32,
    motion: MotionConfig,
}

impl InteractionContext {
    pub fn new(motion: MotionConfig, mode: Mode) -> Self {
        Self {
            rotation: RotationState::default(),
            mode,
            state: InteractionState::Idle,
            last_down: None,
            coast_device: DeviceClass::Pointer,
            auto_yaw: 0.0,
            motion,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn auto_yaw(&self) -> f32 {
        self.auto_yaw
    }

    pub fn motion(&self) -> &MotionConfig {
        &self.motion
    }

    /// Switch posture. Returns false when already in `mode`.
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.mode == mode {
            return false;
        }
        log::info!("[interaction] mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.last_down = None;
        true
    }

    pub fn handle(&mut self, event: InputEvent) -> InteractionOutcome {
        match event {
            InputEvent::Down(s) => {
                self.pointer_down(s);
                InteractionOutcome::None
            }
            InputEvent::Move(s) => {
                self.pointer_move(s);
                InteractionOutcome::None
            }
            InputEvent::Up(s) => self.pointer_up(s, true),
            InputEvent::Cancel(s) => self.pointer_up(s, false),
        }
    }

    fn owns(&self, sample: &PointerSample) -> bool {
        self.state
            .gesture()
            .is_some_and(|g| g.pointer_id == sample.id)
    }

    fn pointer_down(&mut self, s: PointerSample) {
        if !s.primary || !self.state.is_idle() {
            return;
        }
        let double_tap = self.mode == Mode::Inside
            && self.last_down.is_some_and(|prev| {
                prev.device == s.device
                    && elapsed(prev.at, s.at) < self.motion.double_tap_window()
            });
        let gesture = InputGesture::begin(&s);
        self.state = if double_tap {
            log::debug!("[interaction] double-tap navigation");
            InteractionState::DoubleTapNavigating(gesture)
        } else {
            InteractionState::Dragging(gesture)
        };
        self.last_down = Some(DownRecord {
            at: s.at,
            device: s.device,
        });
        self.rotation.velocity = PitchYaw::ZERO;
    }

    fn pointer_move(&mut self, s: PointerSample) {
        if !self.owns(&s) {
            return;
        }
        let mode = self.mode;
        let fine = matches!(self.state, InteractionState::DoubleTapNavigating(_));
        let tap_px = self.motion.tap_max_displacement_px;
        let mut sensitivity = self.motion.sensitivity(mode, s.device);
        if fine {
            sensitivity *= self.motion.double_tap_sensitivity_scale;
        }
        let Some(g) = self.state.gesture_mut() else {
            return;
        };
        let delta = s.position - g.last_pos;
        g.last_pos = s.position;
        if g.kind == GestureKind::Undetermined && s.position.distance(g.start_pos) >= tap_px {
            g.kind = if fine {
                GestureKind::DoubleTapDrag
            } else {
                GestureKind::Drag
            };
        }
        let step = PitchYaw::new(delta.y * sensitivity, delta.x * sensitivity);
        let before = self.rotation.target;
        self.rotation.target += step;
        clamp_pitch(&mut self.rotation.target);
        self.rotation.velocity = self.rotation.target - before;
    }

    fn pointer_up(&mut self, s: PointerSample, may_select: bool) -> InteractionOutcome {
        if !self.owns(&s) {
            return InteractionOutcome::None;
        }
        let fine = matches!(self.state, InteractionState::DoubleTapNavigating(_));
        let Some(mut g) = self.state.gesture().copied() else {
            return InteractionOutcome::None;
        };
        self.state = InteractionState::Idle;

        let elapsed = elapsed(g.start_time, s.at);
        let is_tap = s.position.distance(g.start_pos) < self.motion.tap_max_displacement_px
            && elapsed < self.motion.tap_max_duration();
        if is_tap {
            g.kind = GestureKind::Tap;
        }

        if may_select && is_tap && !fine {
            self.rotation.velocity = PitchYaw::ZERO;
            return match self.mode {
                Mode::Outside => {
                    self.set_mode(Mode::Inside);
                    InteractionOutcome::ModeChanged(Mode::Inside)
                }
                Mode::Inside => InteractionOutcome::Pick(s.position),
            };
        }

        // release: the target stays where the drag left it and momentum carries on
        let retention = self.motion.momentum_retention(g.device);
        self.rotation.velocity = self.rotation.velocity.scaled(retention);
        self.coast_device = g.device;
        InteractionOutcome::None
    }

    /// Advance one frame. `fully_loaded_at` gates the faster reveal spin.
    pub fn step(&mut self, dt: Duration, now: Instant, fully_loaded_at: Option<Instant>) {
        let frames = frame_steps(dt);
        if frames <= 0.0 {
            return;
        }
        let idle = self.state.is_idle();

        if idle && self.mode == Mode::Outside {
            let revealing = fully_loaded_at
                .is_some_and(|t| elapsed(t, now) < self.motion.reveal_spin());
            let rate = if revealing {
                self.motion.auto_rotate_reveal
            } else {
                self.motion.auto_rotate_steady
            };
            let yaw = rate * frames;
            self.rotation.target.yaw += yaw;
            self.auto_yaw += yaw;
        }

        if idle && !self.rotation.velocity.is_negligible(self.motion.velocity_epsilon) {
            let decay = compensate(self.motion.velocity_decay(self.coast_device), frames);
            self.rotation.velocity = self.rotation.velocity.scaled(decay);
            self.rotation.target += self.rotation.velocity.scaled(frames);
            clamp_pitch(&mut self.rotation.target);
            if self.rotation.velocity.is_negligible(self.motion.velocity_epsilon) {
                self.rotation.velocity = PitchYaw::ZERO;
            }
        }

        let damping = self.motion.damping(self.mode);
        let blend = 1.0 - compensate(1.0 - damping, frames);
        let delta = self.rotation.target - self.rotation.current;
        self.rotation.current += delta.scaled(blend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_micros(16_667);

    fn sample(id: i32, x: f32, y: f32, at: Instant) -> PointerSample {
        PointerSample {
            id,
            position: Vec2::new(x, y),
            device: DeviceClass::Pointer,
            primary: true,
            at,
        }
    }

    #[test]
    fn frame_steps_are_capped() {
        assert!((frame_steps(FRAME) - 1.0).abs() < 1e-3);
        assert_eq!(frame_steps(Duration::from_secs(5)), MAX_FRAME_STEPS);
        assert_eq!(frame_steps(Duration::ZERO), 0.0);
    }

    #[test]
    fn drag_moves_target_and_sets_velocity() {
        let t0 = Instant::now();
        let mut ctx = InteractionContext::new(MotionConfig::default(), Mode::Outside);
        ctx.handle(InputEvent::Down(sample(1, 100.0, 100.0, t0)));
        ctx.handle(InputEvent::Move(sample(1, 140.0, 100.0, t0 + FRAME)));
        assert!((ctx.rotation.target.yaw - 40.0 * 0.0025).abs() < 1e-6);
        assert!(ctx.rotation.velocity.yaw > 0.0);
        match ctx.state() {
            InteractionState::Dragging(g) => assert_eq!(g.kind, GestureKind::Drag),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_pointers_are_ignored_mid_gesture() {
        let t0 = Instant::now();
        let mut ctx = InteractionContext::new(MotionConfig::default(), Mode::Outside);
        ctx.handle(InputEvent::Down(sample(1, 0.0, 0.0, t0)));
        ctx.handle(InputEvent::Down(sample(2, 50.0, 50.0, t0)));
        ctx.handle(InputEvent::Move(sample(2, 90.0, 50.0, t0)));
        assert_eq!(ctx.rotation.target, PitchYaw::ZERO);
        assert_eq!(ctx.state().gesture().map(|g| g.pointer_id), Some(1));
    }

    #[test]
    fn non_primary_pointer_never_starts_a_gesture() {
        let mut ctx = InteractionContext::new(MotionConfig::default(), Mode::Outside);
        let mut s = sample(3, 0.0, 0.0, Instant::now());
        s.primary = false;
        ctx.handle(InputEvent::Down(s));
        assert!(ctx.state().is_idle());
    }

    #[test]
    fn cancel_never_selects() {
        let t0 = Instant::now();
        let mut ctx = InteractionContext::new(MotionConfig::default(), Mode::Outside);
        ctx.handle(InputEvent::Down(sample(1, 10.0, 10.0, t0)));
        let out = ctx.handle(InputEvent::Cancel(sample(1, 10.0, 10.0, t0)));
        assert_eq!(out, InteractionOutcome::None);
        assert_eq!(ctx.mode(), Mode::Outside);
        assert!(ctx.state().is_idle());
    }

    #[test]
    fn auto_rotation_only_outside_and_idle() {
        let t0 = Instant::now();
        let mut ctx = InteractionContext::new(MotionConfig::default(), Mode::Outside);
        ctx.step(FRAME, t0, None);
        assert!(ctx.auto_yaw() > 0.0);
        let steady = ctx.auto_yaw();

        let mut revealing = InteractionContext::new(MotionConfig::default(), Mode::Outside);
        revealing.step(FRAME, t0, Some(t0));
        assert!((revealing.auto_yaw() / steady - 5.0).abs() < 1e-3);

        let mut inside = InteractionContext::new(MotionConfig::default(), Mode::Inside);
        inside.step(FRAME, t0, None);
        assert_eq!(inside.auto_yaw(), 0.0);
    }

    #[test]
    fn coasting_decays_to_zero() {
        let t0 = Instant::now();
        let mut ctx = InteractionContext::new(MotionConfig::default(), Mode::Inside);
        ctx.rotation.velocity = PitchYaw::new(0.0, 0.01);
        for _ in 0..400 {
            ctx.step(FRAME, t0, None);
        }
        assert_eq!(ctx.rotation.velocity, PitchYaw::ZERO);
        assert!(ctx.rotation.target.yaw > 0.01);
        // current converges toward target
        assert!((ctx.rotation.current.yaw - ctx.rotation.target.yaw).abs() < 1e-3);
    }
}
