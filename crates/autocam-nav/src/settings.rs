use autocam_base::math::{Vec2, Vec3};
use autocam_base::{Error, Result, Tolerance};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;

use crate::collab::{Action, NavigationAuth};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationFlags {
    pub orbit: bool,
    pub pan: bool,
    pub zoom: bool,
    pub walk: bool,
    pub look: bool,
    pub elevate: bool,
    pub goto_view: bool,
    pub orbit_past_world_poles: bool,
    pub use_pivot_always: bool,
    pub use_left_handed_input: bool,
}

impl Default for NavigationFlags {
    fn default() -> Self {
        Self {
            orbit: true,
            pan: true,
            zoom: true,
            walk: true,
            look: true,
            elevate: true,
            goto_view: true,
            orbit_past_world_poles: false,
            use_pivot_always: true,
            use_left_handed_input: false,
        }
    }
}

impl NavigationAuth for NavigationFlags {
    fn is_action_enabled(&self, action: Action) -> bool {
        match action {
            Action::Orbit => self.orbit,
            Action::Pan => self.pan,
            Action::Zoom => self.zoom,
            Action::Walk => self.walk,
            Action::Look => self.look,
            Action::Elevate => self.elevate,
            Action::GoToView => self.goto_view,
        }
    }

    fn orbit_past_world_poles(&self) -> bool {
        self.orbit_past_world_poles
    }

    fn use_pivot_always(&self) -> bool {
        self.use_pivot_always
    }

    fn use_left_handed_input(&self) -> bool {
        self.use_left_handed_input
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    pub horizontal_step: f64,
    pub vertical_step: f64,
    pub shift_zone: f64,
    pub inner_multiplier: f64,
    pub outer_multiplier: f64,
    pub dead_zone: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            horizontal_step: FRAC_PI_4,
            vertical_step: FRAC_PI_4,
            shift_zone: 10.0_f64.to_radians(),
            inner_multiplier: 0.5,
            outer_multiplier: 1.0,
            dead_zone: 8.0_f64.to_radians(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionSettings {
    pub duration: f64,
    pub percent_cap: f64,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            duration: 1.0,
            percent_cap: 1.0,
        }
    }
}

impl TransitionSettings {
    pub fn is_usable(&self) -> bool {
        self.duration.is_finite()
            && self.duration > 0.0
            && self.percent_cap.is_finite()
            && self.percent_cap > 0.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewindSettings {
    pub max_size: usize,
    pub thumbnail_width: f64,
    pub bracket_half_width: f64,
    pub snap_enter: f64,
    pub snap_leave: f64,
}

impl Default for RewindSettings {
    fn default() -> Self {
        Self {
            max_size: 25,
            thumbnail_width: 64.0,
            bracket_half_width: 48.0,
            snap_enter: 6.0,
            snap_leave: 14.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl SceneBounds {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn diagonal(&self) -> f64 {
        (self.max - self.min).length()
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ]
    }

    pub fn extent_along(&self, axis: Vec3) -> (f64, f64) {
        self.corners()
            .iter()
            .map(|corner| corner.dot(axis))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
                (lo.min(d), hi.max(d))
            })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavSettings {
    pub viewport: Vec2,
    pub orbit_speed: f64,
    pub pan_speed: f64,
    pub zoom_speed: f64,
    pub min_zoom_distance: f64,
    pub max_zoom_distance: f64,
    pub walk_speed: f64,
    pub walk_dead_zone: f64,
    pub spin_speed: f64,
    pub look_speed: f64,
    pub elevate_sensitivity: f64,
    pub keep_scene_upright: bool,
    pub orbit_snapping: bool,
    pub flags: NavigationFlags,
    pub snap: SnapSettings,
    pub transition: TransitionSettings,
    pub rewind: RewindSettings,
    pub scene_bounds: Option<SceneBounds>,
    pub tolerance: Tolerance,
}

impl Default for NavSettings {
    fn default() -> Self {
        Self {
            viewport: Vec2::new(1280.0, 720.0),
            orbit_speed: 5.0,
            pan_speed: 1.0,
            zoom_speed: 1.2,
            min_zoom_distance: 1.0e-3,
            max_zoom_distance: 1.0e6,
            walk_speed: 0.5,
            walk_dead_zone: 10.0,
            spin_speed: 1.5,
            look_speed: 2.0,
            elevate_sensitivity: 4.0,
            keep_scene_upright: true,
            orbit_snapping: false,
            flags: NavigationFlags::default(),
            snap: SnapSettings::default(),
            transition: TransitionSettings::default(),
            rewind: RewindSettings::default(),
            scene_bounds: None,
            tolerance: Tolerance::default(),
        }
    }
}

impl NavSettings {
    pub fn aspect(&self) -> f64 {
        if self.viewport.y > 0.0 {
            self.viewport.x / self.viewport.y
        } else {
            1.0
        }
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("viewport.x", self.viewport.x),
            ("viewport.y", self.viewport.y),
            ("orbit_speed", self.orbit_speed),
            ("pan_speed", self.pan_speed),
            ("zoom_speed", self.zoom_speed),
            ("min_zoom_distance", self.min_zoom_distance),
            ("max_zoom_distance", self.max_zoom_distance),
            ("look_speed", self.look_speed),
            ("transition.duration", self.transition.duration),
            ("transition.percent_cap", self.transition.percent_cap),
            ("snap.horizontal_step", self.snap.horizontal_step),
            ("snap.vertical_step", self.snap.vertical_step),
            ("snap.outer_multiplier", self.snap.outer_multiplier),
            ("rewind.thumbnail_width", self.rewind.thumbnail_width),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParameter(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if self.zoom_speed == 1.0 {
            return Err(Error::InvalidParameter(
                "zoom_speed of 1.0 disables zooming".to_string(),
            ));
        }
        if self.min_zoom_distance >= self.max_zoom_distance {
            return Err(Error::InvalidParameter(format!(
                "min_zoom_distance ({}) must be below max_zoom_distance ({})",
                self.min_zoom_distance, self.max_zoom_distance
            )));
        }
        if self.rewind.snap_enter > self.rewind.snap_leave {
            return Err(Error::InvalidParameter(
                "rewind.snap_enter must not exceed rewind.snap_leave".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(NavSettings::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_duration() {
        let mut settings = NavSettings::default();
        settings.transition.duration = 0.0;
        assert!(matches!(
            settings.validate(),
            Err(Error::InvalidParameter(_))
        ));
        assert!(!settings.transition.is_usable());
    }

    #[test]
    fn bounds_extent_along_axis() {
        let bounds = SceneBounds::new(Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 3.0, 4.0));
        let (lo, hi) = bounds.extent_along(Vec3::Y);
        assert_eq!(lo, -2.0);
        assert_eq!(hi, 3.0);
    }
}
