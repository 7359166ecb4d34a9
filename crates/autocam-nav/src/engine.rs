use autocam_base::math::{Quat, Vec2, Vec3, quat_from_basis};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::camera::{CameraState, ViewSnapshot};
use crate::collab::{Action, CameraHandle, NavigationAuth, PivotQuery, RedrawTarget};
use crate::input::{Gesture, PointerSample};
use crate::interaction::{self, ElevateLimits, InteractionContext};
use crate::pivot::PivotState;
use crate::rewind::RewindHistory;
use crate::settings::{NavSettings, SceneBounds};
use crate::snap::OrbitSnapState;
use crate::transition::{
    CompletionCallback, TickOutcome, TransitionEngine, TransitionJob, TransitionMode,
};
use crate::viewcube::{
    AlignCorrection, CubeBasis, ViewDirections, compute_alignment, nearest_direction,
};

pub type ChangedCallback = Box<dyn FnMut(bool)>;
pub type RedrawCallback = Box<dyn FnMut(RedrawTarget)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Misuse {
    TransitionSettings,
    Viewport,
    ZoomSpeed,
    TickDelta,
}

#[derive(Debug, Default)]
struct Diagnostics {
    reported: HashSet<Misuse>,
}

impl Diagnostics {
    fn report(&mut self, kind: Misuse, detail: &str) {
        if self.reported.insert(kind) {
            warn!(?kind, "{detail}; operation skipped");
        }
    }
}

pub struct NavigationEngine {
    camera: CameraState,
    settings: NavSettings,
    auth: Option<Box<dyn NavigationAuth>>,
    transitions: TransitionEngine,
    history: RewindHistory,
    snap: OrbitSnapState,
    pivot: PivotState,
    gesture: Option<Gesture>,
    elevate_limits: ElevateLimits,
    home: ViewSnapshot,
    original_home: ViewSnapshot,
    zoom_out_amount: f64,
    history_pending: bool,
    diagnostics: Diagnostics,
    on_changed: Option<ChangedCallback>,
    on_redraw: Option<RedrawCallback>,
}

impl Default for NavigationEngine {
    fn default() -> Self {
        Self::new(CameraState::default(), NavSettings::default())
    }
}

impl NavigationEngine {
    pub fn new(camera: CameraState, settings: NavSettings) -> Self {
        let home = camera.snapshot();
        Self {
            history: RewindHistory::new(settings.rewind.clone()),
            snap: OrbitSnapState::default(),
            camera,
            settings,
            auth: None,
            transitions: TransitionEngine::default(),
            pivot: PivotState::default(),
            gesture: None,
            elevate_limits: ElevateLimits::default(),
            home,
            original_home: home,
            zoom_out_amount: 0.0,
            history_pending: false,
            diagnostics: Diagnostics::default(),
            on_changed: None,
            on_redraw: None,
        }
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn settings(&self) -> &NavSettings {
        &self.settings
    }

    pub fn history(&self) -> &RewindHistory {
        &self.history
    }

    pub fn snap_state(&self) -> &OrbitSnapState {
        &self.snap
    }

    pub fn transitions(&self) -> &TransitionEngine {
        &self.transitions
    }

    pub fn is_transition_running(&self) -> bool {
        self.transitions.is_running()
    }

    pub fn zoom_out_amount(&self) -> f64 {
        self.zoom_out_amount
    }

    pub fn set_viewport(&mut self, size: Vec2) {
        self.settings.viewport = size;
    }

    pub fn set_orbit_snapping(&mut self, enabled: bool) {
        self.settings.orbit_snapping = enabled;
    }

    pub fn set_scene_bounds(&mut self, bounds: Option<SceneBounds>) {
        self.settings.scene_bounds = bounds;
    }

    pub fn set_auth(&mut self, auth: Box<dyn NavigationAuth>) {
        self.auth = Some(auth);
    }

    pub fn on_changed(&mut self, callback: ChangedCallback) {
        self.on_changed = Some(callback);
    }

    pub fn on_redraw(&mut self, callback: RedrawCallback) {
        self.on_redraw = Some(callback);
    }

    fn auth(&self) -> &dyn NavigationAuth {
        match &self.auth {
            Some(auth) => auth.as_ref(),
            None => &self.settings.flags,
        }
    }

    pub fn current_view(&self) -> ViewSnapshot {
        self.camera.snapshot()
    }

    fn commit(&mut self, world_up_changed: bool) {
        if let Some(callback) = self.on_changed.as_mut() {
            callback(world_up_changed);
        }
        if let Some(redraw) = self.on_redraw.as_mut() {
            redraw(RedrawTarget::Scene);
            redraw(RedrawTarget::ViewCube);
        }
    }

    fn seed_history(&mut self) {
        if self.history.is_empty() {
            self.history.add_history_element(self.camera.snapshot());
        }
    }

    fn record_history(&mut self) {
        self.push_history(self.camera.snapshot());
    }

    fn push_history(&mut self, view: ViewSnapshot) {
        if self.history.current().map(|entry| entry.snapshot) == Some(view) {
            return;
        }
        self.history.add_intermediate_history_element(view);
    }

    fn flush_pending_history(&mut self) {
        if std::mem::take(&mut self.history_pending) {
            self.record_history();
        }
    }

    fn permit(&mut self, action: Action) -> bool {
        if !self.auth().is_action_enabled(action) {
            return false;
        }
        if self.transitions.is_running() {
            debug!(?action, "rejected while a transition runs");
            return false;
        }
        let viewport = self.settings.viewport;
        if !(viewport.x.is_finite() && viewport.y.is_finite() && viewport.x > 0.0 && viewport.y > 0.0)
        {
            self.diagnostics
                .report(Misuse::Viewport, "viewport size must be positive");
            return false;
        }
        self.seed_history();
        true
    }

    fn interacted(&mut self, changed: bool, world_up_changed: bool) -> bool {
        if changed {
            if self.gesture.is_none() {
                self.history_pending = true;
            }
            self.commit(world_up_changed);
        }
        changed
    }

    fn context(&self) -> InteractionContext<'_> {
        let auth = self.auth();
        InteractionContext {
            settings: &self.settings,
            orbit_past_poles: auth.orbit_past_world_poles(),
            left_handed: auth.use_left_handed_input(),
        }
    }

    pub fn begin_gesture(&mut self, cursor: Vec2) {
        if self.transitions.cancel() {
            debug!("transition interrupted by gesture");
        }
        self.flush_pending_history();
        self.snap.reset(self.camera.view_direction());
        self.elevate_limits = ElevateLimits::default();
        self.gesture = Some(Gesture::new(cursor, self.camera.snapshot()));
    }

    pub fn end_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        if *gesture.start_view() == self.camera.snapshot() {
            return false;
        }
        if self.history.is_empty() {
            self.history.add_history_element(*gesture.start_view());
        }
        self.record_history();
        true
    }

    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.as_ref()
    }

    pub fn pointer_moved(&mut self, cursor: Vec2) -> Option<PointerSample> {
        self.gesture.as_mut().map(|gesture| gesture.advance(cursor))
    }

    pub fn orbit(
        &mut self,
        cursor_now: Vec2,
        cursor_start: Vec2,
        delta: Vec2,
        start: Option<&ViewSnapshot>,
    ) -> bool {
        if !self.permit(Action::Orbit) {
            return false;
        }
        let auth = self.auth();
        let (orbit_past_poles, left_handed) =
            (auth.orbit_past_world_poles(), auth.use_left_handed_input());
        let ctx = InteractionContext {
            settings: &self.settings,
            orbit_past_poles,
            left_handed,
        };
        let mut camera = self.camera.clone();
        match start {
            Some(start) => {
                camera.apply_snapshot(start);
                interaction::orbit(&mut camera, &ctx, cursor_now - cursor_start, None);
            }
            None => {
                let snap = if self.settings.orbit_snapping {
                    Some(&mut self.snap)
                } else {
                    None
                };
                interaction::orbit(&mut camera, &ctx, delta, snap);
            }
        }
        let changed = camera != self.camera;
        let world_up_changed = camera.world_up() != self.camera.world_up();
        self.camera = camera;
        self.interacted(changed, world_up_changed)
    }

    pub fn pan(&mut self, delta: Vec2) -> bool {
        if !self.permit(Action::Pan) {
            return false;
        }
        let ctx = self.context();
        let mut camera = self.camera.clone();
        let changed = interaction::pan(&mut camera, &ctx, delta);
        self.camera = camera;
        self.interacted(changed, false)
    }

    pub fn zoom(&mut self, delta: Vec2) -> bool {
        if !self.permit(Action::Zoom) {
            return false;
        }
        let speed = self.settings.zoom_speed;
        if !speed.is_finite() || speed <= 0.0 || speed == 1.0 {
            self.diagnostics.report(
                Misuse::ZoomSpeed,
                "zoom speed must be positive and different from 1",
            );
            return false;
        }
        let ctx = self.context();
        let mut camera = self.camera.clone();
        let outcome = interaction::zoom(&mut camera, &ctx, delta);
        self.camera = camera;
        if let Some(amount) = outcome.zoom_out_amount {
            self.zoom_out_amount = amount;
        } else if outcome.changed {
            self.zoom_out_amount = 0.0;
        }
        self.interacted(outcome.changed, false)
    }

    pub fn walk(&mut self, cursor_now: Vec2, cursor_start: Vec2, movement: Vec2, dt: f64) -> bool {
        if !self.permit(Action::Walk) {
            return false;
        }
        let ctx = self.context();
        let mut camera = self.camera.clone();
        let changed =
            interaction::walk(&mut camera, &ctx, cursor_now, cursor_start, movement, dt);
        self.camera = camera;
        self.interacted(changed, false)
    }

    pub fn elevate(&mut self, movement_y: f64) -> bool {
        if !self.permit(Action::Elevate) {
            return false;
        }
        let ctx = self.context();
        let mut camera = self.camera.clone();
        let mut limits = self.elevate_limits;
        let changed = interaction::elevate(&mut camera, &ctx, &mut limits, movement_y);
        self.camera = camera;
        self.elevate_limits = limits;
        self.interacted(changed, false)
    }

    pub fn look(&mut self, delta: Vec2) -> bool {
        if !self.permit(Action::Look) {
            return false;
        }
        let ctx = self.context();
        let mut camera = self.camera.clone();
        let changed = interaction::look(&mut camera, &ctx, delta);
        self.camera = camera;
        self.interacted(changed, false)
    }

    pub fn set_world_up(&mut self, up: Vec3) -> bool {
        let changed = self.camera.set_world_up(up);
        if changed {
            self.commit(true);
        }
        changed
    }

    pub fn set_camera_up(&mut self, up: Vec3) -> bool {
        let before = self.camera.up;
        self.camera.set_camera_up(up);
        let changed = self.camera.up != before;
        if changed {
            self.commit(false);
        }
        changed
    }

    pub fn to_perspective(&mut self) -> bool {
        let changed = self.camera.to_perspective();
        if changed {
            self.commit(false);
        }
        changed
    }

    pub fn to_orthographic(&mut self) -> bool {
        let changed = self.camera.to_orthographic();
        if changed {
            self.commit(false);
        }
        changed
    }

    pub fn cube_front(&self) -> Vec3 {
        self.camera.cube_front()
    }

    pub fn nearest_cube_view(&self) -> ViewDirections {
        let basis = CubeBasis::from_camera(&self.camera);
        let eye = self.camera.position - self.camera.pivot;
        let eye = if eye.is_near_zero(1.0e-9) {
            -self.camera.view_direction()
        } else {
            eye
        };
        nearest_direction(&basis, eye).directions
    }

    pub fn arm_pivot_pick(&mut self) {
        self.pivot.arm_pick();
    }

    pub fn disarm_pivot_pick(&mut self) {
        self.pivot.disarm_pick();
    }

    pub fn is_pivot_pick_active(&self, key_down: bool) -> bool {
        self.pivot.is_pick_active(key_down)
    }

    pub fn set_pivot(&mut self, pivot: Vec3) -> bool {
        if !pivot.is_finite() || pivot == self.camera.pivot {
            return false;
        }
        self.camera.pivot = pivot;
        self.commit(false);
        true
    }

    pub fn set_pivot_from_cursor(&mut self, cursor: Vec2, query: &dyn PivotQuery) -> bool {
        let use_pivot_always = self.auth().use_pivot_always();
        match self
            .pivot
            .resolve(&self.camera, cursor, query, use_pivot_always)
        {
            Some(pivot) => self.set_pivot(pivot),
            None => false,
        }
    }

    pub fn go_to_view(&mut self, destination: ViewSnapshot, mode: TransitionMode) -> bool {
        self.start_transition(destination, mode, None)
    }

    pub fn start_transition(
        &mut self,
        destination: ViewSnapshot,
        mode: TransitionMode,
        completion: Option<CompletionCallback>,
    ) -> bool {
        if !self.auth().is_action_enabled(Action::GoToView) {
            return false;
        }
        if !self.transition_settings_usable() {
            return false;
        }
        self.prepare_transition();
        let start = self.camera.snapshot();
        let job = match mode {
            TransitionMode::Spherical => match (orientation_of(&start), orientation_of(&destination))
            {
                (Some(from), Some(to)) => TransitionJob::spherical(
                    start,
                    destination,
                    from,
                    to,
                    &self.settings.transition,
                ),
                _ => TransitionJob::linear(start, destination, &self.settings.transition),
            },
            TransitionMode::Linear => {
                TransitionJob::linear(start, destination, &self.settings.transition)
            }
        };
        let job = match completion {
            Some(completion) => job.with_completion(completion),
            None => job,
        };
        self.transitions.start(job);
        true
    }

    pub fn align_to(&mut self, directions: ViewDirections) -> bool {
        if !self.auth().is_action_enabled(Action::GoToView) {
            return false;
        }
        if !self.transition_settings_usable() {
            return false;
        }
        let Some(alignment) = compute_alignment(&self.camera, directions, AlignCorrection::default())
        else {
            debug!(%directions, "no alignment for direction set");
            return false;
        };
        self.prepare_transition();
        debug!(%directions, "aligning to cube view");
        self.transitions.start(TransitionJob::spherical(
            self.camera.snapshot(),
            alignment.destination,
            alignment.initial_orientation,
            alignment.final_orientation,
            &self.settings.transition,
        ));
        true
    }

    pub fn home_view(&self) -> &ViewSnapshot {
        &self.home
    }

    pub fn set_home_view(&mut self, view: ViewSnapshot) {
        self.home = view;
    }

    pub fn reset_home_view(&mut self) {
        self.home = self.original_home;
    }

    pub fn go_home(&mut self) -> bool {
        self.go_to_view(self.home, TransitionMode::Linear)
    }

    pub fn fit_to_bounds(&mut self, bounds: SceneBounds, animate: bool) -> bool {
        if !self.auth().is_action_enabled(Action::GoToView) {
            return false;
        }
        let radius = bounds.diagonal() * 0.5;
        if !radius.is_finite() || radius <= 0.0 {
            return false;
        }
        let half_fov = (self.camera.fov.to_radians() * 0.5).clamp(1.0e-3, 1.5);
        let distance = (radius / half_fov.sin()).max(self.settings.min_zoom_distance);
        let center = bounds.center();
        let mut destination = self.camera.snapshot();
        destination.center = center;
        destination.pivot = center;
        destination.position = center - self.camera.view_direction() * distance;

        if animate {
            return self.go_to_view(destination, TransitionMode::Linear);
        }
        self.transitions.cancel();
        self.seed_history();
        let world_up_changed = self.camera.apply_snapshot(&destination);
        self.record_history();
        self.commit(world_up_changed);
        true
    }

    fn transition_settings_usable(&mut self) -> bool {
        if self.settings.transition.is_usable() {
            return true;
        }
        self.diagnostics.report(
            Misuse::TransitionSettings,
            "transition duration and percent cap must be positive",
        );
        false
    }

    fn prepare_transition(&mut self) {
        self.flush_pending_history();
        self.seed_history();
    }

    pub fn tick(&mut self, dt: f64) -> bool {
        if !dt.is_finite() || dt < 0.0 {
            self.diagnostics
                .report(Misuse::TickDelta, "frame delta must be finite and non-negative");
            return false;
        }
        match self.transitions.tick(&mut self.camera, dt) {
            TickOutcome::Idle => false,
            TickOutcome::Advanced { world_up_changed } => {
                self.commit(world_up_changed);
                true
            }
            TickOutcome::Completed {
                world_up_changed,
                destination,
                completion,
            } => {
                self.commit(world_up_changed);
                self.push_history(destination);
                if let Some(completion) = completion {
                    completion(&destination);
                }
                true
            }
        }
    }

    pub fn sync_from(&mut self, handle: &dyn CameraHandle) -> bool {
        self.transitions.cancel();
        let before = self.camera.clone();
        self.camera.position = handle.position();
        self.camera.center = handle.target();
        self.camera.pivot = handle.pivot();
        self.camera.fov = handle.fov();
        self.camera.projection = handle.projection();
        self.camera.set_camera_up(handle.up());
        let changed = self.camera != before;
        if changed {
            self.commit(false);
        }
        changed
    }

    pub fn apply_to(&self, handle: &mut dyn CameraHandle) {
        handle.set_position(self.camera.position);
        handle.set_up(self.camera.up);
        handle.set_pivot(self.camera.pivot);
        handle.set_fov(self.camera.fov);
        handle.set_projection(self.camera.projection);
        handle.look_at(self.camera.center);
    }

    pub fn open_timeline(&mut self, x: f64) -> bool {
        self.transitions.cancel();
        self.flush_pending_history();
        if !self.history.open_timeline(x) {
            return false;
        }
        self.apply_blend();
        true
    }

    pub fn slide_timeline(&mut self, x: f64) -> bool {
        if !self.history.slide_timeline(x) {
            return false;
        }
        self.apply_blend();
        true
    }

    pub fn close_timeline(&mut self) -> bool {
        if !self.history.is_open() {
            return false;
        }
        if let Some(blend) = self.history.close_timeline() {
            self.history.add_intermediate_history_element(blend);
        }
        true
    }

    fn apply_blend(&mut self) {
        let Some(view) = self.history.interpolated_camera() else {
            return;
        };
        if view == self.camera.snapshot() {
            return;
        }
        let world_up_changed = self.camera.apply_snapshot(&view);
        self.commit(world_up_changed);
    }
}

fn orientation_of(view: &ViewSnapshot) -> Option<Quat> {
    let dir = view.center - view.position;
    if dir.is_near_zero(1.0e-9) {
        return None;
    }
    let dir = dir.normalized();
    let right = dir.cross(view.up);
    if right.is_near_zero(1.0e-9) {
        return None;
    }
    let right = right.normalized();
    Some(quat_from_basis(dir, right.cross(dir).normalized(), right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn diagnostics_report_once() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.report(Misuse::Viewport, "bad");
        diagnostics.report(Misuse::Viewport, "bad");
        assert_eq!(diagnostics.reported.len(), 1);
    }

    #[test]
    fn disabled_action_is_silent_noop() {
        let mut settings = NavSettings::default();
        settings.flags.pan = false;
        let mut engine = NavigationEngine::new(CameraState::default(), settings);
        let calls = Rc::new(RefCell::new(0));
        let seen = Rc::clone(&calls);
        engine.on_changed(Box::new(move |_| *seen.borrow_mut() += 1));
        assert!(!engine.pan(Vec2::new(10.0, 0.0)));
        assert_eq!(*calls.borrow(), 0);
        assert!(engine.history().is_empty());
    }

    #[test]
    fn unusable_transition_is_skipped() {
        let mut settings = NavSettings::default();
        settings.transition.duration = -1.0;
        let mut engine = NavigationEngine::new(CameraState::default(), settings);
        let home = engine.current_view();
        assert!(!engine.go_to_view(home, TransitionMode::Linear));
        assert!(!engine.is_transition_running());
        assert!(engine.diagnostics.reported.contains(&Misuse::TransitionSettings));
    }

    #[test]
    fn wheel_zoom_is_recorded_at_next_gesture() {
        let mut engine = NavigationEngine::default();
        assert!(engine.zoom(Vec2::new(0.0, -1.0)));
        assert_eq!(engine.history().len(), 1);
        engine.begin_gesture(Vec2::ZERO);
        assert_eq!(engine.history().len(), 2);
        assert!(!engine.end_gesture());
    }
}
