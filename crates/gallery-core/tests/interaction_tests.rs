// Gesture scenarios fed through the gallery's input queue.

mod common;

use common::*;
use gallery_core::*;
use glam::{Vec2, Vec4};
use instant::Instant;
use std::f32::consts::FRAC_PI_2;
use std::time::Duration;

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn outside_gallery(now: Instant) -> (Gallery, MockBackend) {
    let mut backend = MockBackend::default();
    let mut g = Gallery::new(
        default_catalog(150),
        GalleryConfig::default(),
        Mode::Outside,
        Viewport::new(800, 600),
        now,
    );
    g.attach(&mut backend).expect("surface");
    (g, backend)
}

#[test]
fn quick_tap_outside_enters_the_gallery_without_selecting() {
    let t0 = Instant::now();
    let (mut g, mut backend) = outside_gallery(t0);
    g.push_input(down(1, 100.0, 100.0, t0));
    g.push_input(up(1, 102.0, 101.0, t0 + ms(50)));
    g.frame(t0 + ms(50), &mut backend);

    let snap = g.snapshot();
    assert_eq!(snap.mode, Mode::Inside);
    assert!(snap.selected_item.is_none());

    // camera eases toward the center over one second
    g.frame(t0 + ms(550), &mut backend);
    let mid = g.camera().distance();
    assert!(mid > 0.0 && mid < 15.0);
    g.frame(t0 + ms(1100), &mut backend);
    assert_eq!(g.camera().distance(), 0.0);
    assert!((g.camera().fovy_radians - 100f32.to_radians()).abs() < 1e-5);
}

#[test]
fn long_press_or_large_move_is_not_a_tap() {
    let t0 = Instant::now();
    let (mut g, mut backend) = outside_gallery(t0);
    // small move but too slow
    g.push_input(down(1, 100.0, 100.0, t0));
    g.push_input(up(1, 101.0, 100.0, t0 + ms(400)));
    g.frame(t0 + ms(400), &mut backend);
    assert_eq!(g.mode(), Mode::Outside);

    // fast but too far
    let t1 = t0 + ms(1000);
    g.push_input(down(1, 100.0, 100.0, t1));
    g.push_input(mv(1, 112.0, 100.0, t1 + ms(20)));
    g.push_input(up(1, 112.0, 100.0, t1 + ms(40)));
    g.frame(t1 + ms(40), &mut backend);
    assert_eq!(g.mode(), Mode::Outside);
    assert!(g.rotation().target.yaw > 0.0);
}

#[test]
fn inside_drags_never_exceed_the_pitch_limit() {
    let t0 = Instant::now();
    let (mut g, mut backend) = outside_gallery(t0);
    g.enter_gallery(t0);
    let mut now = t0;
    for sweep in 0..4 {
        let dir = if sweep % 2 == 0 { 1.0 } else { -1.0 };
        g.push_input(down(1, 400.0, 300.0, now));
        for step in 1..=60 {
            let y = 300.0 + dir * step as f32 * 40.0;
            g.push_input(mv(1, 400.0, y, now + ms(step)));
        }
        g.push_input(up(1, 400.0, 300.0 + dir * 2400.0, now + ms(61)));
        for _ in 0..120 {
            now += FRAME;
            g.frame(now, &mut backend);
            let p = g.rotation().target.pitch;
            assert!((-FRAC_PI_2..=FRAC_PI_2).contains(&p), "pitch {p}");
            assert!(g.rotation().current.pitch.abs() <= FRAC_PI_2 + 1e-6);
        }
    }
}

#[test]
fn release_keeps_momentum_and_it_decays() {
    let t0 = Instant::now();
    let (mut g, mut backend) = outside_gallery(t0);
    g.enter_gallery(t0);
    g.push_input(down(1, 100.0, 100.0, t0));
    g.push_input(mv(1, 130.0, 100.0, t0 + ms(16)));
    g.push_input(up(1, 130.0, 100.0, t0 + ms(300)));
    g.frame(t0 + ms(300), &mut backend);
    let v = g.rotation().velocity.yaw;
    // 30 px * 0.004 rad/px, then 0.85 retention and one frame of decay at most
    assert!(v > 0.0 && v <= 30.0 * 0.004 * 0.85 + 1e-6, "v {v}");

    let mut now = t0 + ms(300);
    for _ in 0..600 {
        now += FRAME;
        g.frame(now, &mut backend);
    }
    assert_eq!(g.rotation().velocity, PitchYaw::ZERO);
}

#[test]
fn double_tap_inside_navigates_with_finer_sensitivity() {
    let t0 = Instant::now();
    let (mut g, mut backend) = outside_gallery(t0);
    g.enter_gallery(t0);
    g.frame(t0, &mut backend);

    g.push_input(down(1, 300.0, 300.0, t0 + ms(10)));
    g.push_input(up(1, 300.0, 300.0, t0 + ms(40)));
    g.push_input(down(1, 300.0, 300.0, t0 + ms(150)));
    g.frame(t0 + ms(150), &mut backend);
    assert!(matches!(
        g.interaction().state(),
        InteractionState::DoubleTapNavigating(_)
    ));

    let before = g.rotation().target.yaw;
    g.push_input(mv(1, 400.0, 300.0, t0 + ms(170)));
    g.frame(t0 + ms(170), &mut backend);
    let turned = g.rotation().target.yaw - before;
    assert!((turned - 100.0 * 0.004 * 0.5).abs() < 1e-5, "turned {turned}");
}

#[test]
fn tap_inside_selects_the_card_under_the_pointer() {
    let t0 = Instant::now();
    let (mut g, mut backend) = outside_gallery(t0);
    let mut now = settle(&mut g, &mut backend, &FailingSource, t0);
    g.enter_gallery(now);
    for _ in 0..80 {
        now += FRAME;
        g.frame(now, &mut backend);
    }
    assert_eq!(g.camera().distance(), 0.0);

    // aim at the card most directly in front of the camera
    let scene = g.scene_frame(now).transform();
    let (index, world) = g
        .items()
        .iter()
        .enumerate()
        .map(|(i, p)| (i, scene.transform_point3(p.position)))
        .min_by(|a, b| a.1.normalize().z.total_cmp(&b.1.normalize().z))
        .expect("cards");
    let clip = g.camera().view_projection() * Vec4::new(world.x, world.y, world.z, 1.0);
    let ndc = clip.truncate() / clip.w;
    let vp = g.viewport().size();
    let px = Vec2::new((ndc.x + 1.0) * 0.5 * vp.x, (1.0 - ndc.y) * 0.5 * vp.y);

    g.push_input(down(7, px.x, px.y, now + ms(5)));
    g.push_input(up(7, px.x, px.y, now + ms(60)));
    g.frame(now + ms(60), &mut backend);

    let selected = g.snapshot().selected_item.expect("a card was hit");
    assert_eq!(selected.id, g.items()[index].item.id);
    assert_eq!(g.mode(), Mode::Inside);

    g.close_selection();
    assert!(g.snapshot().selected_item.is_none());
}

#[test]
fn pending_cards_cannot_be_picked() {
    let t0 = Instant::now();
    let (mut g, backend) = outside_gallery(t0);
    // nothing has a mesh yet
    g.enter_gallery(t0);
    let hit = g.pick(Vec2::new(400.0, 300.0), t0, &backend);
    assert!(hit.is_none());
}

#[test]
fn exit_gallery_clears_selection_and_returns_outside() {
    let t0 = Instant::now();
    let (mut g, mut backend) = outside_gallery(t0);
    g.enter_gallery(t0);
    assert!(g.select_item(3));
    g.exit_gallery(t0 + ms(10));
    g.frame(t0 + ms(10), &mut backend);
    let snap = g.snapshot();
    assert_eq!(snap.mode, Mode::Outside);
    assert!(snap.selected_item.is_none());
    assert!(!g.select_item(999));
}

#[test]
fn outside_breathes_and_inside_holds_still() {
    let t0 = Instant::now();
    let (mut g, mut backend) = outside_gallery(t0);
    g.frame(t0 + ms(3000), &mut backend);
    let outside = backend.last_scene.expect("presented");
    assert!((outside.scale - (1.0 + (1.5f32).sin() * 0.02)).abs() < 1e-5);
    assert_eq!(outside.background, constants::BACKGROUND_OUTSIDE);

    g.enter_gallery(t0 + ms(3000));
    g.frame(t0 + ms(3100), &mut backend);
    let inside = backend.last_scene.expect("presented");
    assert_eq!(inside.scale, 1.0);
    assert_eq!(inside.background, constants::BACKGROUND_INSIDE);
}

#[test]
fn reveal_spin_runs_faster_after_full_load() {
    let t0 = Instant::now();
    let mut backend = MockBackend::default();
    let mut g = Gallery::new(
        Vec::new(),
        GalleryConfig::default(),
        Mode::Outside,
        Viewport::default(),
        t0,
    );
    // empty gallery counts as loaded at build, so the first seconds spin fast
    g.frame(t0, &mut backend);
    g.frame(t0 + FRAME, &mut backend);
    let early = g.interaction().auto_yaw();
    g.frame(t0 + ms(5000), &mut backend);
    let late_start = g.interaction().auto_yaw();
    g.frame(t0 + ms(5000) + FRAME, &mut backend);
    let late = g.interaction().auto_yaw() - late_start;
    assert!((early / late - 5.0).abs() < 1e-2, "early {early} late {late}");
}

fn drag_yaw(device: DeviceClass, px: f32) -> f32 {
    let t0 = Instant::now();
    let (mut g, mut backend) = outside_gallery(t0);
    g.enter_gallery(t0);
    g.push_input(InputEvent::Down(sample_on(device, 1, 100.0, 100.0, t0)));
    g.push_input(InputEvent::Move(sample_on(device, 1, 100.0 + px, 100.0, t0 + ms(16))));
    // first frame has no elapsed time, so only the drag moves the target
    g.frame(t0 + ms(16), &mut backend);
    g.rotation().target.yaw
}

#[test]
fn touch_drags_turn_at_half_the_pointer_rate() {
    let pointer = drag_yaw(DeviceClass::Pointer, 40.0);
    let touch = drag_yaw(DeviceClass::Touch, 40.0);
    assert!((pointer - 40.0 * 0.004).abs() < 1e-6, "pointer {pointer}");
    assert!((touch - pointer * 0.5).abs() < 1e-6, "touch {touch}");
}

/// Drag `px` to the right and release; returns the context left coasting.
fn release_after_drag(device: DeviceClass, px: f32) -> InteractionContext {
    let t0 = Instant::now();
    let mut ctx = InteractionContext::new(MotionConfig::default(), Mode::Inside);
    ctx.handle(InputEvent::Down(sample_on(device, 1, 100.0, 100.0, t0)));
    ctx.handle(InputEvent::Move(sample_on(device, 1, 100.0 + px, 100.0, t0 + ms(16))));
    ctx.handle(InputEvent::Up(sample_on(device, 1, 100.0 + px, 100.0, t0 + ms(400))));
    ctx
}

#[test]
fn momentum_retention_depends_on_the_device() {
    let pointer = release_after_drag(DeviceClass::Pointer, 30.0);
    let touch = release_after_drag(DeviceClass::Touch, 30.0);
    let pointer_drag = 30.0 * 0.004;
    let touch_drag = pointer_drag * 0.5;
    assert!((pointer.rotation.velocity.yaw - pointer_drag * 0.85).abs() < 1e-6);
    // touch keeps all of its release velocity
    assert!((touch.rotation.velocity.yaw - touch_drag).abs() < 1e-6);
}

#[test]
fn touch_release_coasts_longer_than_pointer_release() {
    // 30 px pointer and 51 px touch both leave 0.102 rad/frame after release
    let mut pointer = release_after_drag(DeviceClass::Pointer, 30.0);
    let mut touch = release_after_drag(DeviceClass::Touch, 51.0);
    let (vp, vt) = (pointer.rotation.velocity.yaw, touch.rotation.velocity.yaw);
    assert!((vp - vt).abs() < 1e-5, "pointer {vp} touch {vt}");

    let mut now = Instant::now() + ms(400);
    for _ in 0..180 {
        now += FRAME;
        pointer.step(FRAME, now, None);
        touch.step(FRAME, now, None);
    }
    assert_eq!(pointer.rotation.velocity, PitchYaw::ZERO);
    assert!(touch.rotation.velocity.yaw > 0.0, "touch stopped early");
    assert!(touch.rotation.target.yaw > pointer.rotation.target.yaw);
}

#[test]
fn gallery_clamps_a_decay_that_would_never_stop() {
    let t0 = Instant::now();
    let mut cfg = GalleryConfig::default();
    cfg.motion.velocity_decay_pointer = 1.5;
    let g = Gallery::new(default_catalog(4), cfg, Mode::Inside, Viewport::new(800, 600), t0);
    assert!(g.interaction().motion().velocity_decay_pointer < 1.0);
    assert!(g.config().motion.velocity_decay_pointer < 1.0);
}
