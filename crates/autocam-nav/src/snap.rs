use autocam_base::math::Vec3;
use tracing::debug;

use crate::settings::SnapSettings;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisSnap {
    lock_delta: f64,
    locked: bool,
    last_snap_rotation: f64,
}

impl AxisSnap {
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn last_snap_rotation(&self) -> f64 {
        self.last_snap_rotation
    }

    pub fn lock_delta(&self) -> f64 {
        self.lock_delta
    }

    pub fn step(&mut self, delta: f64, offset: f64, settings: &SnapSettings) -> f64 {
        if self.locked {
            self.lock_delta += delta;
            if self.lock_delta.abs() <= settings.dead_zone {
                return 0.0;
            }
            let excess = self.lock_delta - settings.dead_zone.copysign(self.lock_delta);
            self.locked = false;
            self.lock_delta = 0.0;
            debug!(excess, "orbit snap released");
            return if settings.outer_multiplier > 0.0 {
                excess / settings.outer_multiplier
            } else {
                excess
            };
        }

        if delta == 0.0 {
            return 0.0;
        }

        let converging = delta * offset > 0.0;
        let inner = offset.abs() < settings.shift_zone;
        let multiplier = if converging && inner {
            settings.inner_multiplier
        } else {
            settings.outer_multiplier
        };
        let candidate = delta * multiplier;

        if converging && candidate.abs() >= offset.abs() {
            self.locked = true;
            self.lock_delta = 0.0;
            self.last_snap_rotation = offset;
            debug!(offset, "orbit snap locked");
            return offset;
        }
        candidate
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrbitSnapState {
    pub horizontal: AxisSnap,
    pub vertical: AxisSnap,
    pub last_snap_direction: Vec3,
}

impl Default for OrbitSnapState {
    fn default() -> Self {
        Self {
            horizontal: AxisSnap::default(),
            vertical: AxisSnap::default(),
            last_snap_direction: Vec3::new(0.0, 0.0, -1.0),
        }
    }
}

impl OrbitSnapState {
    pub fn reset(&mut self, direction: Vec3) {
        *self = Self {
            last_snap_direction: direction.normalized(),
            ..Self::default()
        };
    }

    pub fn any_locked(&self) -> bool {
        self.horizontal.locked || self.vertical.locked
    }
}

pub fn snap_offset(angle: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return 0.0;
    }
    (angle / step).round() * step - angle
}
