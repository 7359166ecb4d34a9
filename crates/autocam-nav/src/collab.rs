use autocam_base::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::ProjectionMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Orbit,
    Pan,
    Zoom,
    Walk,
    Look,
    Elevate,
    GoToView,
}

pub trait NavigationAuth {
    fn is_action_enabled(&self, action: Action) -> bool;
    fn orbit_past_world_poles(&self) -> bool;
    fn use_pivot_always(&self) -> bool;
    fn use_left_handed_input(&self) -> bool;
}

pub trait PivotQuery {
    fn pick(&self, cursor: Vec2) -> Option<Vec3>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedrawTarget {
    Scene,
    ViewCube,
}

pub trait CameraHandle {
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);
    fn up(&self) -> Vec3;
    fn set_up(&mut self, up: Vec3);
    fn target(&self) -> Vec3;
    fn pivot(&self) -> Vec3;
    fn set_pivot(&mut self, pivot: Vec3);
    fn fov(&self) -> f64;
    fn set_fov(&mut self, fov: f64);
    fn projection(&self) -> ProjectionMode;
    fn set_projection(&mut self, projection: ProjectionMode);
    fn look_at(&mut self, point: Vec3);

    fn is_perspective(&self) -> bool {
        self.projection() == ProjectionMode::Perspective
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimpleCamera {
    pub position: Vec3,
    pub up: Vec3,
    pub target: Vec3,
    pub pivot: Vec3,
    pub fov: f64,
    pub projection: ProjectionMode,
}

impl Default for SimpleCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 10.0),
            up: Vec3::Y,
            target: Vec3::ZERO,
            pivot: Vec3::ZERO,
            fov: 45.0,
            projection: ProjectionMode::Perspective,
        }
    }
}

impl CameraHandle for SimpleCamera {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn up(&self) -> Vec3 {
        self.up
    }

    fn set_up(&mut self, up: Vec3) {
        self.up = up;
    }

    fn target(&self) -> Vec3 {
        self.target
    }

    fn pivot(&self) -> Vec3 {
        self.pivot
    }

    fn set_pivot(&mut self, pivot: Vec3) {
        self.pivot = pivot;
    }

    fn fov(&self) -> f64 {
        self.fov
    }

    fn set_fov(&mut self, fov: f64) {
        self.fov = fov;
    }

    fn projection(&self) -> ProjectionMode {
        self.projection
    }

    fn set_projection(&mut self, projection: ProjectionMode) {
        self.projection = projection;
    }

    fn look_at(&mut self, point: Vec3) {
        self.target = point;
    }
}
