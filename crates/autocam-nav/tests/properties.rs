use autocam_base::math::{Vec2, Vec3, ease};
use autocam_nav::interaction::{InteractionContext, orbit};
use autocam_nav::snap::OrbitSnapState;
use autocam_nav::{CameraState, NavSettings, NavigationEngine};

fn sample_directions() -> Vec<Vec3> {
    let mut dirs = vec![
        Vec3::X,
        Vec3::Y,
        Vec3::Z,
        -Vec3::X,
        -Vec3::Y,
        -Vec3::Z,
        Vec3::new(0.0, 1.0e-7, 1.0),
    ];
    for i in 0..12 {
        let a = i as f64 * 0.53;
        let b = i as f64 * 0.29 - 1.3;
        dirs.push(Vec3::new(a.cos() * b.cos(), b.sin(), a.sin() * b.cos()));
    }
    dirs
}

#[test]
fn world_right_is_unit_and_orthogonal() {
    for dir in sample_directions() {
        let mut camera = CameraState::default();
        camera.set_world_up(dir);
        let up = camera.world_up();
        let right = camera.world_right();
        assert!((right.length() - 1.0).abs() < 1.0e-9, "{dir:?}");
        assert!(right.dot(up).abs() < 1.0e-9, "{dir:?}");
    }
}

#[test]
fn ease_is_clamped_and_monotonic() {
    let (a, b) = (0.2, 0.9);
    assert_eq!(ease(a, a, b), 0.0);
    assert_eq!(ease(b, a, b), 1.0);
    let mut last = 0.0;
    for i in 0..=100 {
        let t = a + (b - a) * i as f64 / 100.0;
        let value = ease(t, a, b);
        assert!(value >= last);
        last = value;
    }
}

#[test]
fn orbit_never_crosses_a_pole() {
    for snapping in [false, true] {
        let mut settings = NavSettings::default();
        settings.orbit_snapping = snapping;
        let ctx = InteractionContext::new(&settings);
        let mut camera = CameraState::default();
        let mut snap = OrbitSnapState::default();
        for i in 0..400 {
            let phase = i as f64 * 0.37;
            let delta = Vec2::new(phase.sin() * 40.0, phase.cos() * 90.0 + 15.0);
            let snap = snapping.then_some(&mut snap);
            orbit(&mut camera, &ctx, delta, snap);
            assert!(camera.up.dot(camera.world_up()) > -1.0e-9, "step {i}");
        }
    }
}

#[test]
fn engine_orbit_with_snapping_stays_upright() {
    let mut settings = NavSettings::default();
    settings.orbit_snapping = true;
    let mut engine = NavigationEngine::new(CameraState::default(), settings);
    engine.begin_gesture(Vec2::ZERO);
    let mut cursor = Vec2::ZERO;
    for _ in 0..60 {
        let next = cursor + Vec2::new(7.0, 11.0);
        engine.orbit(next, Vec2::ZERO, next - cursor, None);
        cursor = next;
        assert!(engine.camera().up.dot(engine.camera().world_up()) > -1.0e-9);
    }
    assert!(engine.end_gesture());
}
