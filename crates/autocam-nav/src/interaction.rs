use autocam_base::math::{Vec2, Vec3, ease, rotate_around_axis, signed_angle};
use std::f64::consts::FRAC_PI_2;
use tracing::debug;

use crate::camera::CameraState;
use crate::settings::NavSettings;
use crate::snap::{OrbitSnapState, snap_offset};

const POLE_SLACK: f64 = 1.0e-6;
const DEGENERATE: f64 = 1.0e-9;

#[derive(Clone, Copy, Debug)]
pub struct InteractionContext<'a> {
    pub settings: &'a NavSettings,
    pub orbit_past_poles: bool,
    pub left_handed: bool,
}

impl<'a> InteractionContext<'a> {
    pub fn new(settings: &'a NavSettings) -> Self {
        Self {
            settings,
            orbit_past_poles: settings.flags.orbit_past_world_poles,
            left_handed: settings.flags.use_left_handed_input,
        }
    }

    fn pixels_to_radians(&self, speed: f64) -> f64 {
        speed / self.settings.viewport.y.max(1.0)
    }

    fn horizontal_sign(&self, camera: &CameraState) -> f64 {
        let mut sign = 1.0;
        if camera.is_upside_down() {
            sign = -sign;
        }
        if self.left_handed {
            sign = -sign;
        }
        sign
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ZoomOutcome {
    pub changed: bool,
    pub zoom_out_amount: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElevateLimits {
    pub top_limit: bool,
    pub bottom_limit: bool,
}

fn horizontal_right(camera: &CameraState) -> Vec3 {
    let right = camera.basis().right.reject(camera.world_up());
    if right.is_near_zero(DEGENERATE) {
        camera.world_right()
    } else {
        right.normalized()
    }
}

fn pitch_angle(camera: &CameraState, axis: Vec3) -> f64 {
    signed_angle(camera.world_up(), camera.up, axis)
}

// Shortens `angle` so the camera up vector stops on the horizon instead of
// tipping past a world pole.
fn clamp_to_pole(pitch: f64, angle: f64) -> f64 {
    if pitch.abs() > FRAC_PI_2 + POLE_SLACK {
        return angle;
    }
    let next = pitch + angle;
    if next > FRAC_PI_2 {
        angle - (next - FRAC_PI_2)
    } else if next < -FRAC_PI_2 {
        angle - (next + FRAC_PI_2)
    } else {
        angle
    }
}

fn rotate_about(camera: &mut CameraState, origin: Vec3, axis: Vec3, angle: f64) {
    camera.position = rotate_around_axis(camera.position, origin, axis, angle);
    camera.center = rotate_around_axis(camera.center, origin, axis, angle);
    let up = rotate_around_axis(camera.up, Vec3::ZERO, axis, angle);
    camera.set_camera_up(up);
}

pub fn orbit(
    camera: &mut CameraState,
    ctx: &InteractionContext<'_>,
    delta: Vec2,
    mut snap: Option<&mut OrbitSnapState>,
) -> bool {
    let scale = ctx.pixels_to_radians(ctx.settings.orbit_speed);
    let world_up = camera.world_up();
    let pivot = camera.pivot;

    let mut horizontal = -delta.x * scale * ctx.horizontal_sign(camera);
    if let Some(snap) = snap.as_deref_mut() {
        let heading = camera.view_direction().reject(world_up);
        if !heading.is_near_zero(DEGENERATE) {
            let angle = signed_angle(camera.front_direction(), heading.normalized(), world_up);
            let offset = snap_offset(angle, ctx.settings.snap.horizontal_step);
            horizontal = snap.horizontal.step(horizontal, offset, &ctx.settings.snap);
        }
    }
    if horizontal != 0.0 {
        rotate_about(camera, pivot, world_up, horizontal);
    }

    let mut vertical = -delta.y * scale;
    let axis = horizontal_right(camera);
    let pitch = pitch_angle(camera, axis);
    if let Some(snap) = snap.as_deref_mut() {
        let offset = snap_offset(pitch, ctx.settings.snap.vertical_step);
        vertical = snap.vertical.step(vertical, offset, &ctx.settings.snap);
    }
    if !ctx.orbit_past_poles {
        vertical = clamp_to_pole(pitch, vertical);
    }
    if vertical != 0.0 {
        rotate_about(camera, pivot, axis, vertical);
    }

    if let Some(snap) = snap
        && snap.any_locked()
    {
        snap.last_snap_direction = camera.view_direction();
    }
    horizontal != 0.0 || vertical != 0.0
}

pub fn pan(camera: &mut CameraState, ctx: &InteractionContext<'_>, delta: Vec2) -> bool {
    if delta.x == 0.0 && delta.y == 0.0 {
        return false;
    }
    let view = camera.view_direction();
    let left = camera.up.cross(view);
    if left.is_near_zero(DEGENERATE) {
        return false;
    }
    let left = left.normalized();
    let screen_up = view.cross(left).normalized();

    let depth = if camera.is_perspective() {
        let depth = (camera.pivot - camera.position).dot(view);
        if depth > DEGENERATE {
            depth
        } else {
            camera.distance()
        }
    } else {
        camera.distance()
    };
    let world_per_pixel =
        camera.frustum_height(depth) / ctx.settings.viewport.y.max(1.0) * ctx.settings.pan_speed;
    let offset = (left * delta.x + screen_up * delta.y) * world_per_pixel;
    if offset.is_near_zero(f64::EPSILON) {
        return false;
    }
    camera.position += offset;
    camera.center += offset;
    true
}

pub fn zoom(camera: &mut CameraState, ctx: &InteractionContext<'_>, delta: Vec2) -> ZoomOutcome {
    let settings = ctx.settings;
    let exponent = delta.x + delta.y;
    if exponent == 0.0 {
        return ZoomOutcome::default();
    }

    let anchor = if camera.pivot_distance() > DEGENERATE {
        camera.pivot
    } else {
        camera.center
    };
    let to_anchor = anchor - camera.position;
    let length = to_anchor.length();
    if length <= DEGENERATE {
        return ZoomOutcome::default();
    }

    let dist = settings.zoom_speed.powf(exponent);
    // A camera already outside the limits may move back toward them but
    // never further out.
    let target = (length * dist).clamp(
        settings.min_zoom_distance.min(length),
        settings.max_zoom_distance.max(length),
    );
    let factor = target / length;
    if (factor - 1.0).abs() <= f64::EPSILON {
        return ZoomOutcome::default();
    }

    let offset = to_anchor * (1.0 - factor);
    camera.position += offset;
    camera.center += offset;

    let zoom_out_amount = (factor > 1.0)
        .then(|| (target / settings.max_zoom_distance).clamp(0.0, 1.0));
    ZoomOutcome {
        changed: true,
        zoom_out_amount,
    }
}

fn walk_ramp(offset: f64, dead_zone: f64, span: f64) -> f64 {
    let magnitude = offset.abs() - dead_zone;
    if magnitude <= 0.0 {
        return 0.0;
    }
    let span = (span - dead_zone).max(1.0);
    ease(magnitude / span, 0.0, 1.0).copysign(offset)
}

fn scene_scale(camera: &CameraState, settings: &NavSettings) -> f64 {
    settings
        .scene_bounds
        .map(|bounds| bounds.diagonal())
        .filter(|diagonal| *diagonal > DEGENERATE)
        .unwrap_or_else(|| camera.distance().max(settings.min_zoom_distance))
}

pub fn walk(
    camera: &mut CameraState,
    ctx: &InteractionContext<'_>,
    cursor_now: Vec2,
    cursor_start: Vec2,
    movement: Vec2,
    dt: f64,
) -> bool {
    let settings = ctx.settings;
    if !dt.is_finite() || dt < 0.0 {
        return false;
    }
    let offset = cursor_now - cursor_start;
    let span = settings.viewport.y * 0.5;
    let forward = walk_ramp(-offset.y, settings.walk_dead_zone, span);
    let turn = walk_ramp(offset.x, settings.walk_dead_zone, span);
    let world_up = camera.world_up();
    let mut changed = false;

    if forward != 0.0 && dt > 0.0 {
        let view = camera.view_direction();
        let mut heading = view.reject(world_up);
        if heading.is_near_zero(DEGENERATE) {
            let sign = if view.dot(world_up) < 0.0 { 1.0 } else { -1.0 };
            heading = camera.up.reject(world_up) * sign;
        }
        if !heading.is_near_zero(DEGENERATE) {
            let step = heading.normalized()
                * (forward * settings.walk_speed * scene_scale(camera, settings) * dt);
            camera.position += step;
            camera.center += step;
            changed = true;
        }
    }

    if turn != 0.0 && dt > 0.0 {
        let angle = -turn * settings.spin_speed * dt * ctx.horizontal_sign(camera);
        let eye = camera.position;
        camera.center = rotate_around_axis(camera.center, eye, world_up, angle);
        let up = rotate_around_axis(camera.up, Vec3::ZERO, world_up, angle);
        camera.set_camera_up(up);
        changed = true;
    }

    if movement.x != 0.0 || movement.y != 0.0 {
        changed |= look(camera, ctx, movement);
    }
    changed
}

pub fn elevate(
    camera: &mut CameraState,
    ctx: &InteractionContext<'_>,
    limits: &mut ElevateLimits,
    movement_y: f64,
) -> bool {
    let settings = ctx.settings;
    let world_up = camera.world_up();
    let normalized = movement_y / settings.viewport.y.max(1.0) * settings.elevate_sensitivity;
    let bounds = settings.scene_bounds.map(|bounds| bounds.extent_along(world_up));
    let height = match bounds {
        Some((lo, hi)) if hi - lo > DEGENERATE => hi - lo,
        _ => scene_scale(camera, settings),
    };
    // Screen y grows downward.
    let mut delta = -(normalized * normalized).copysign(normalized) * height;
    if delta == 0.0 {
        return false;
    }

    if delta > 0.0 {
        limits.bottom_limit = false;
        if limits.top_limit {
            return false;
        }
    } else {
        limits.top_limit = false;
        if limits.bottom_limit {
            return false;
        }
    }

    if let Some((lo, hi)) = bounds {
        let level = camera.position.dot(world_up);
        if delta > 0.0 && level + delta >= hi {
            delta = (hi - level).max(0.0);
            limits.top_limit = true;
            debug!(level, hi, "elevate reached top bound");
        } else if delta < 0.0 && level + delta <= lo {
            delta = (lo - level).min(0.0);
            limits.bottom_limit = true;
            debug!(level, lo, "elevate reached bottom bound");
        }
    }
    if delta == 0.0 {
        return false;
    }

    let step = world_up * delta;
    camera.position += step;
    camera.center += step;
    true
}

pub fn look(camera: &mut CameraState, ctx: &InteractionContext<'_>, delta: Vec2) -> bool {
    let scale = ctx.pixels_to_radians(ctx.settings.look_speed);
    let eye = camera.position;

    let axis = horizontal_right(camera);
    let mut pitch = -delta.y * scale;
    if !ctx.orbit_past_poles {
        pitch = clamp_to_pole(pitch_angle(camera, axis), pitch);
    }
    if pitch != 0.0 {
        camera.center = rotate_around_axis(camera.center, eye, axis, pitch);
        let up = rotate_around_axis(camera.up, Vec3::ZERO, axis, pitch);
        camera.set_camera_up(up);
    }

    let yaw = -delta.x * scale;
    if yaw != 0.0 {
        let axis = if ctx.settings.keep_scene_upright {
            camera.world_up()
        } else {
            camera.up
        };
        camera.center = rotate_around_axis(camera.center, eye, axis, yaw);
        let up = rotate_around_axis(camera.up, Vec3::ZERO, axis, yaw);
        camera.set_camera_up(up);
    }
    pitch != 0.0 || yaw != 0.0
}
