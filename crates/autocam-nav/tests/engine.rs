use autocam_base::math::{Vec2, Vec3};
use autocam_nav::transition::CompletionCallback;
use autocam_nav::{
    CameraHandle, CameraState, NavSettings, NavigationEngine, PivotQuery, RedrawTarget,
    SceneBounds, SimpleCamera, TransitionMode, ViewSnapshot,
};
use std::cell::RefCell;
use std::rc::Rc;

fn tick_until_idle(engine: &mut NavigationEngine, dt: f64) {
    for _ in 0..1000 {
        if !engine.is_transition_running() {
            return;
        }
        engine.tick(dt);
    }
}

fn side_view() -> ViewSnapshot {
    ViewSnapshot {
        position: Vec3::new(10.0, 0.0, 0.0),
        up: Vec3::Z,
        center: Vec3::ZERO,
        pivot: Vec3::ZERO,
        fov: 30.0,
        world_up: Vec3::Z,
        is_ortho: true,
    }
}

#[test]
fn align_right_lands_on_world_right() -> anyhow::Result<()> {
    let mut engine = NavigationEngine::default();
    assert!(engine.align_to("right".parse()?));
    tick_until_idle(&mut engine, 1.0 / 60.0);

    let camera = engine.camera();
    assert_eq!(camera.up, Vec3::Y);
    let eye = (camera.position - camera.center).normalized();
    assert!(eye.approx_eq(camera.world_right(), 1.0e-12));
    assert!((camera.distance() - 10.0).abs() < 1.0e-9);
    assert_eq!(engine.history().len(), 2);
    assert_eq!(engine.nearest_cube_view().to_string(), "right");
    Ok(())
}

#[test]
fn corner_alignment_is_reported_as_nearest_view() -> anyhow::Result<()> {
    let mut engine = NavigationEngine::default();
    assert!(engine.align_to("top-right".parse()?));
    tick_until_idle(&mut engine, 0.1);
    assert_eq!(engine.nearest_cube_view().to_string(), "top-right");
    assert_eq!(engine.cube_front(), Vec3::new(0.0, 0.0, -1.0));
    Ok(())
}

#[test]
fn linear_transition_reports_world_up_and_completes() {
    let mut engine = NavigationEngine::default();
    let changes = Rc::new(RefCell::new(Vec::new()));
    let redraws = Rc::new(RefCell::new(0usize));
    let finished = Rc::new(RefCell::new(None));

    let sink = Rc::clone(&changes);
    engine.on_changed(Box::new(move |world_up_changed| {
        sink.borrow_mut().push(world_up_changed)
    }));
    let sink = Rc::clone(&redraws);
    engine.on_redraw(Box::new(move |target| {
        if target == RedrawTarget::Scene {
            *sink.borrow_mut() += 1;
        }
    }));
    let sink = Rc::clone(&finished);
    let completion: CompletionCallback = Box::new(move |view| *sink.borrow_mut() = Some(*view));

    let destination = side_view();
    assert!(engine.start_transition(destination, TransitionMode::Linear, Some(completion)));
    for _ in 0..4 {
        engine.tick(0.25);
    }

    assert!(!engine.is_transition_running());
    assert_eq!(engine.current_view(), destination);
    assert_eq!(*changes.borrow(), vec![true; 4]);
    assert_eq!(*redraws.borrow(), 4);
    assert_eq!(*finished.borrow(), Some(destination));
    assert!(!engine.camera().is_perspective());
}

#[test]
fn operations_are_rejected_until_a_gesture_cancels_the_transition() {
    let mut engine = NavigationEngine::default();
    assert!(engine.go_to_view(side_view(), TransitionMode::Linear));
    engine.tick(0.1);
    assert!(!engine.pan(Vec2::new(5.0, 0.0)));
    assert!(!engine.zoom(Vec2::new(0.0, 1.0)));

    let frozen = engine.current_view();
    engine.begin_gesture(Vec2::new(100.0, 100.0));
    assert!(!engine.is_transition_running());
    assert_eq!(engine.current_view(), frozen);
    assert!(engine.pan(Vec2::new(5.0, 0.0)));
    assert!(engine.end_gesture());
}

#[test]
fn absolute_orbit_restarts_from_the_given_view() {
    let mut engine = NavigationEngine::default();
    let start = engine.current_view();
    let cursor_start = Vec2::new(200.0, 200.0);
    engine.begin_gesture(cursor_start);
    let now = Vec2::new(260.0, 180.0);
    assert!(engine.orbit(now, cursor_start, Vec2::new(60.0, -20.0), Some(&start)));
    let first = engine.current_view();
    engine.orbit(now, cursor_start, Vec2::ZERO, Some(&start));
    assert_eq!(engine.current_view(), first);
    engine.end_gesture();
}

#[test]
fn history_stays_bounded_and_branches_overwrite() {
    let mut settings = NavSettings::default();
    settings.rewind.max_size = 5;
    let mut engine = NavigationEngine::new(CameraState::default(), settings);
    for i in 0..12 {
        engine.begin_gesture(Vec2::ZERO);
        engine.pan(Vec2::new(10.0 + i as f64, 0.0));
        engine.end_gesture();
        assert!(engine.history().len() <= 5);
    }
    assert_eq!(engine.history().len(), 5);

    assert!(engine.open_timeline(500.0));
    assert!(engine.slide_timeline(412.0));
    assert_eq!(engine.history().current_index(), 2);
    let scrubbed = engine.history().get(2).map(|entry| entry.snapshot);
    assert_eq!(Some(engine.current_view()), scrubbed);
    assert!(engine.close_timeline());

    engine.begin_gesture(Vec2::ZERO);
    engine.pan(Vec2::new(0.0, 30.0));
    engine.end_gesture();
    assert_eq!(engine.history().len(), 4);
    assert_eq!(
        engine.history().last().map(|entry| entry.snapshot),
        Some(engine.current_view())
    );
}

#[test]
fn scrubbing_keeps_camera_up_orthogonal() {
    let mut engine = NavigationEngine::default();
    let side = ViewSnapshot {
        position: Vec3::new(10.0, 0.0, 0.0),
        up: Vec3::Y,
        center: Vec3::ZERO,
        pivot: Vec3::ZERO,
        fov: 45.0,
        world_up: Vec3::Y,
        is_ortho: false,
    };
    let top = ViewSnapshot {
        position: Vec3::new(0.0, 10.0, 0.0),
        up: -Vec3::Z,
        ..side
    };
    for view in [side, top] {
        assert!(engine.go_to_view(view, TransitionMode::Linear));
        tick_until_idle(&mut engine, 0.2);
    }

    assert!(engine.open_timeline(500.0));
    for i in 0..=64 {
        assert!(engine.slide_timeline(500.0 - i as f64));
        let camera = engine.camera();
        let skew = camera.up.dot(camera.view_direction()).abs();
        assert!(skew < 1.0e-9, "slide {i}: |up.view| = {skew}");
    }
    assert!(engine.close_timeline());
    if let Some(entry) = engine.history().last() {
        let view = entry.snapshot;
        let dir = (view.center - view.position).normalized();
        assert!(view.up.dot(dir).abs() < 1.0e-9);
    }
}

#[test]
fn sync_and_apply_mirror_the_renderer_camera() {
    let mut engine = NavigationEngine::default();
    let source = SimpleCamera {
        position: Vec3::new(5.0, 5.0, 5.0),
        up: Vec3::Y,
        target: Vec3::ZERO,
        pivot: Vec3::new(1.0, 0.0, 0.0),
        fov: 60.0,
        projection: autocam_nav::ProjectionMode::Orthographic,
    };
    assert!(engine.sync_from(&source));
    let camera = engine.camera();
    assert_eq!(camera.position, source.position);
    assert_eq!(camera.world_up(), Vec3::Y);
    assert!(camera.up.dot(camera.view_direction()).abs() < 1.0e-12);

    let mut target = SimpleCamera::default();
    engine.apply_to(&mut target);
    assert_eq!(target.position(), source.position);
    assert_eq!(target.target(), Vec3::ZERO);
    assert_eq!(target.pivot(), source.pivot);
    assert!(!target.is_perspective());
}

#[test]
fn fit_to_bounds_frames_the_box() {
    let mut engine = NavigationEngine::default();
    let bounds = SceneBounds::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
    assert!(engine.fit_to_bounds(bounds, false));
    let camera = engine.camera();
    assert_eq!(camera.center, Vec3::new(2.0, 2.0, 2.0));
    assert_eq!(camera.pivot, camera.center);
    let expected = 3.0_f64.sqrt() / 22.5_f64.to_radians().sin();
    assert!((camera.distance() - expected).abs() < 1.0e-9);
    assert!(camera.view_direction().approx_eq(Vec3::new(0.0, 0.0, -1.0), 1.0e-12));
}

#[test]
fn home_view_round_trip() {
    let mut engine = NavigationEngine::default();
    let original = *engine.home_view();
    engine.set_home_view(side_view());
    assert!(engine.go_home());
    tick_until_idle(&mut engine, 0.2);
    assert_eq!(engine.current_view(), side_view());
    engine.reset_home_view();
    assert_eq!(*engine.home_view(), original);
}

#[test]
fn going_home_while_home_adds_no_history() {
    let mut engine = NavigationEngine::default();
    assert!(engine.go_home());
    tick_until_idle(&mut engine, 0.2);
    assert_eq!(engine.history().len(), 1);

    assert!(engine.go_home());
    tick_until_idle(&mut engine, 0.2);
    assert_eq!(engine.history().len(), 1);
    assert_eq!(
        engine.history().last().map(|entry| entry.snapshot),
        Some(engine.current_view())
    );
}

#[test]
fn fit_to_bounds_needs_go_to_view() {
    let mut settings = NavSettings::default();
    settings.flags.goto_view = false;
    let mut engine = NavigationEngine::new(CameraState::default(), settings);
    let before = engine.current_view();
    let bounds = SceneBounds::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0));
    assert!(!engine.fit_to_bounds(bounds, false));
    assert!(!engine.fit_to_bounds(bounds, true));
    assert!(!engine.is_transition_running());
    assert_eq!(engine.current_view(), before);
    assert!(engine.history().is_empty());
}

struct Floor;

impl PivotQuery for Floor {
    fn pick(&self, cursor: Vec2) -> Option<Vec3> {
        Some(Vec3::new(cursor.x * 0.01, 0.0, cursor.y * 0.01))
    }
}

#[test]
fn picked_point_becomes_pivot() {
    let mut engine = NavigationEngine::default();
    engine.arm_pivot_pick();
    assert!(engine.is_pivot_pick_active(false));
    assert!(engine.set_pivot_from_cursor(Vec2::new(100.0, 200.0), &Floor));
    assert_eq!(engine.camera().pivot, Vec3::new(1.0, 0.0, 2.0));
    assert!(!engine.is_pivot_pick_active(false));
}

#[test]
fn wheel_zoom_out_reports_amount() {
    let mut engine = NavigationEngine::default();
    assert!(engine.zoom(Vec2::new(0.0, 2.0)));
    let expected = 10.0 * 1.2_f64.powi(2) / engine.settings().max_zoom_distance;
    assert!((engine.zoom_out_amount() - expected).abs() < 1.0e-12);
}

#[test]
fn settings_load_with_defaults() -> anyhow::Result<()> {
    let settings: NavSettings =
        serde_json::from_str(r#"{ "orbit_speed": 3.0, "flags": { "pan": false } }"#)?;
    assert_eq!(settings.orbit_speed, 3.0);
    assert!(!settings.flags.pan);
    assert!(settings.flags.orbit);
    assert_eq!(settings.rewind.max_size, 25);
    settings.validate()?;
    Ok(())
}
