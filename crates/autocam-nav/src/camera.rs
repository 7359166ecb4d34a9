use autocam_base::math::Vec3;
use serde::{Deserialize, Serialize};

// `dot(world_up, up)` below this counts as upside-down.
pub const UPSIDE_DOWN_DOT: f64 = -0.009;
const UP_PERTURBATION: f64 = 1.0e-4;
const DEGENERATE: f64 = 1.0e-9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMode {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewSnapshot {
    pub position: Vec3,
    pub up: Vec3,
    pub center: Vec3,
    pub pivot: Vec3,
    pub fov: f64,
    pub world_up: Vec3,
    pub is_ortho: bool,
}

impl ViewSnapshot {
    pub fn distance(&self) -> f64 {
        (self.center - self.position).length()
    }

    pub fn projection(&self) -> ProjectionMode {
        if self.is_ortho {
            ProjectionMode::Orthographic
        } else {
            ProjectionMode::Perspective
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub center: Vec3,
    pub pivot: Vec3,
    pub up: Vec3,
    pub fov: f64,
    pub projection: ProjectionMode,
    world_up: Vec3,
    front_direction: Vec3,
    cube_front: Vec3,
}

impl Default for CameraState {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y, Vec3::Y)
    }
}

impl CameraState {
    pub fn new(position: Vec3, center: Vec3, up: Vec3, world_up: Vec3) -> Self {
        let world_up = if world_up.is_near_zero(DEGENERATE) {
            Vec3::Y
        } else {
            world_up.normalized()
        };
        let mut state = Self {
            position,
            center,
            pivot: center,
            up,
            fov: 45.0,
            projection: ProjectionMode::Perspective,
            world_up,
            front_direction: Vec3::new(0.0, 0.0, -1.0),
            cube_front: Vec3::new(0.0, 0.0, -1.0),
        };
        state.set_camera_up(up);
        state.refresh_front();
        state
    }

    pub fn from_snapshot(view: &ViewSnapshot) -> Self {
        let mut state = Self::new(view.position, view.center, view.up, view.world_up);
        state.pivot = view.pivot;
        state.fov = view.fov;
        state.projection = view.projection();
        state
    }

    pub fn world_up(&self) -> Vec3 {
        self.world_up
    }

    pub fn front_direction(&self) -> Vec3 {
        self.front_direction
    }

    pub fn cube_front(&self) -> Vec3 {
        self.cube_front
    }

    pub fn world_right(&self) -> Vec3 {
        self.front_direction.cross(self.world_up).normalized()
    }

    pub fn view_direction(&self) -> Vec3 {
        let dir = self.center - self.position;
        if dir.length() <= f64::EPSILON {
            self.front_direction
        } else {
            dir.normalized()
        }
    }

    pub fn distance(&self) -> f64 {
        (self.center - self.position).length()
    }

    pub fn pivot_distance(&self) -> f64 {
        (self.pivot - self.position).length()
    }

    pub fn basis(&self) -> CameraBasis {
        let forward = self.view_direction();
        let mut right = forward.cross(self.up);
        if right.is_near_zero(DEGENERATE) {
            right = forward.cross(fallback_up(forward, self.world_up));
        }
        let right = right.normalized();
        CameraBasis {
            forward,
            up: right.cross(forward).normalized(),
            right,
        }
    }

    pub fn is_upside_down(&self) -> bool {
        self.world_up.dot(self.up) < UPSIDE_DOWN_DOT
    }

    pub fn is_perspective(&self) -> bool {
        self.projection == ProjectionMode::Perspective
    }

    pub fn frustum_height(&self, depth: f64) -> f64 {
        2.0 * depth.max(0.0) * (self.fov.to_radians() * 0.5).tan()
    }

    pub fn set_world_up(&mut self, up: Vec3) -> bool {
        if !up.is_finite() || up.is_near_zero(1.0e-6) {
            return false;
        }
        let up = up.normalized();
        if up.approx_eq(self.world_up, 1.0e-12) {
            return false;
        }
        self.world_up = up;
        self.refresh_front();
        true
    }

    pub fn set_camera_up(&mut self, up: Vec3) {
        let view = self.view_direction();
        let mut right = view.cross(up);
        if right.is_near_zero(DEGENERATE) {
            let mut perturbed = view;
            if view.y.abs() < view.z.abs() {
                perturbed.y += UP_PERTURBATION;
            } else {
                perturbed.z += UP_PERTURBATION;
            }
            right = perturbed.cross(up);
        }
        if right.is_near_zero(DEGENERATE) {
            right = view.cross(fallback_up(view, self.world_up));
        }
        self.up = right.normalized().cross(view).normalized();
    }

    pub fn to_perspective(&mut self) -> bool {
        self.set_projection(ProjectionMode::Perspective)
    }

    pub fn to_orthographic(&mut self) -> bool {
        self.set_projection(ProjectionMode::Orthographic)
    }

    fn set_projection(&mut self, projection: ProjectionMode) -> bool {
        if self.projection == projection {
            return false;
        }
        self.projection = projection;
        true
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            position: self.position,
            up: self.up,
            center: self.center,
            pivot: self.pivot,
            fov: self.fov,
            world_up: self.world_up,
            is_ortho: self.projection == ProjectionMode::Orthographic,
        }
    }

    pub fn apply_snapshot(&mut self, view: &ViewSnapshot) -> bool {
        self.position = view.position;
        self.center = view.center;
        self.pivot = view.pivot;
        self.up = view.up;
        self.fov = view.fov;
        self.projection = view.projection();
        self.assign_world_up(view.world_up)
    }

    fn assign_world_up(&mut self, up: Vec3) -> bool {
        if !up.is_finite() || up.is_near_zero(1.0e-6) {
            return false;
        }
        let up = if (up.length() - 1.0).abs() <= 1.0e-12 {
            up
        } else {
            up.normalized()
        };
        if up == self.world_up {
            return false;
        }
        self.world_up = up;
        self.refresh_front();
        true
    }

    fn refresh_front(&mut self) {
        self.front_direction = derive_front(self.view_direction(), self.up, self.world_up);
        self.cube_front = principal_axis(self.front_direction);
    }
}

fn derive_front(view: Vec3, camera_up: Vec3, world_up: Vec3) -> Vec3 {
    let front = view.reject(world_up);
    if !front.is_near_zero(1.0e-6) {
        return front.normalized();
    }
    let sign = if view.dot(world_up) < 0.0 { 1.0 } else { -1.0 };
    let front = camera_up.reject(world_up) * sign;
    if !front.is_near_zero(1.0e-6) {
        return front.normalized();
    }
    world_up.cross(default_right(world_up)).normalized()
}

pub fn default_right(world_up: Vec3) -> Vec3 {
    let v = world_up;
    let right = if v.z.abs() <= v.y.abs() {
        Vec3::new(v.y, -v.x, 0.0)
    } else if v.z >= 0.0 {
        Vec3::new(v.z, 0.0, -v.x)
    } else {
        Vec3::new(-v.z, 0.0, v.x)
    };
    if right.is_near_zero(DEGENERATE) {
        Vec3::X
    } else {
        right.normalized()
    }
}

fn fallback_up(forward: Vec3, world_up: Vec3) -> Vec3 {
    let right = forward.cross(world_up);
    if !right.is_near_zero(DEGENERATE) {
        return right.normalized().cross(forward).normalized();
    }
    let right = default_right(world_up);
    right.cross(forward).normalized()
}

pub fn principal_axis(v: Vec3) -> Vec3 {
    let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
    if ax >= ay && ax >= az {
        Vec3::new(v.x.signum(), 0.0, 0.0)
    } else if ay >= az {
        Vec3::new(0.0, v.y.signum(), 0.0)
    } else {
        Vec3::new(0.0, 0.0, v.z.signum())
    }
}
