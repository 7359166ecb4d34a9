use autocam_base::math::{Quat, Vec3, quat_from_axis_angle, quat_from_basis};
use autocam_base::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::camera::{CameraState, ViewSnapshot};

const POLE_DOT: f64 = 1.0 - 1.0e-9;
const UP_BIAS: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    Front,
    Back,
    Top,
    Bottom,
    Left,
    Right,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Front,
        CubeFace::Back,
        CubeFace::Top,
        CubeFace::Bottom,
        CubeFace::Left,
        CubeFace::Right,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CubeFace::Front => "front",
            CubeFace::Back => "back",
            CubeFace::Top => "top",
            CubeFace::Bottom => "bottom",
            CubeFace::Left => "left",
            CubeFace::Right => "right",
        }
    }

    fn opposite(self) -> CubeFace {
        match self {
            CubeFace::Front => CubeFace::Back,
            CubeFace::Back => CubeFace::Front,
            CubeFace::Top => CubeFace::Bottom,
            CubeFace::Bottom => CubeFace::Top,
            CubeFace::Left => CubeFace::Right,
            CubeFace::Right => CubeFace::Left,
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ViewDirections(u8);

impl ViewDirections {
    pub fn new(faces: &[CubeFace]) -> Result<Self> {
        let mut set = Self::default();
        for face in faces {
            if set.contains(face.opposite()) {
                return Err(Error::ConflictingDirections(
                    face.opposite().label(),
                    face.label(),
                ));
            }
            set.0 |= face.bit();
        }
        Ok(set)
    }

    pub fn contains(self, face: CubeFace) -> bool {
        self.0 & face.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn faces(self) -> impl Iterator<Item = CubeFace> {
        CubeFace::ALL.into_iter().filter(move |face| self.contains(*face))
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn offset(self, basis: &CubeBasis) -> Vec3 {
        self.faces().fold(Vec3::ZERO, |acc, face| {
            acc + match face {
                CubeFace::Front => -basis.front,
                CubeFace::Back => basis.front,
                CubeFace::Top => basis.up,
                CubeFace::Bottom => -basis.up,
                CubeFace::Right => basis.right,
                CubeFace::Left => -basis.right,
            }
        })
    }
}

impl FromStr for ViewDirections {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut faces = Vec::new();
        for token in text
            .split(|c: char| c == '-' || c == ',' || c == '_' || c.is_whitespace())
            .filter(|token| !token.is_empty())
        {
            let face = match token.to_ascii_lowercase().as_str() {
                "front" => CubeFace::Front,
                "back" => CubeFace::Back,
                "top" => CubeFace::Top,
                "bottom" => CubeFace::Bottom,
                "left" => CubeFace::Left,
                "right" => CubeFace::Right,
                _ => return Err(Error::UnknownDirection(token.to_string())),
            };
            faces.push(face);
        }
        if faces.is_empty() {
            return Err(Error::UnknownDirection(text.to_string()));
        }
        Self::new(&faces)
    }
}

impl fmt::Display for ViewDirections {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.faces().map(CubeFace::label).collect();
        write!(f, "{}", labels.join("-"))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct CubeBasis {
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

impl CubeBasis {
    pub fn from_camera(camera: &CameraState) -> Self {
        Self {
            front: camera.front_direction(),
            up: camera.world_up(),
            right: camera.world_right(),
        }
    }

    fn to_local(self, v: Vec3) -> Vec3 {
        Vec3::new(v.dot(self.right), v.dot(self.up), -v.dot(self.front))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignKind {
    Face,
    Edge,
    Corner,
}

// One of the 26 principal eye directions, in cube-local coordinates
// (x right, y up, z out of the front face).
#[derive(Clone, Copy, Debug)]
pub struct AlignDirection {
    pub kind: AlignKind,
    pub directions: ViewDirections,
    pub vector: Vec3,
}

pub static ALIGN_DIRECTIONS: LazyLock<Vec<AlignDirection>> = LazyLock::new(build_align_table);

fn build_align_table() -> Vec<AlignDirection> {
    let axis = |value: i8, pos: CubeFace, neg: CubeFace| match value {
        1 => Some(pos),
        -1 => Some(neg),
        _ => None,
    };
    let mut table = Vec::with_capacity(26);
    for x in -1i8..=1 {
        for y in -1i8..=1 {
            for z in -1i8..=1 {
                let faces: Vec<CubeFace> = [
                    axis(x, CubeFace::Right, CubeFace::Left),
                    axis(y, CubeFace::Top, CubeFace::Bottom),
                    axis(z, CubeFace::Front, CubeFace::Back),
                ]
                .into_iter()
                .flatten()
                .collect();
                let kind = match faces.len() {
                    1 => AlignKind::Face,
                    2 => AlignKind::Edge,
                    3 => AlignKind::Corner,
                    _ => continue,
                };
                // Opposite faces never share an axis, so this cannot conflict.
                let directions = ViewDirections(faces.iter().fold(0, |acc, face| acc | face.bit()));
                table.push(AlignDirection {
                    kind,
                    directions,
                    vector: Vec3::new(x as f64, y as f64, z as f64).normalized(),
                });
            }
        }
    }
    table
}

pub fn nearest_direction(basis: &CubeBasis, eye_dir: Vec3) -> AlignDirection {
    let local = basis.to_local(eye_dir.normalized());
    let mut best = ALIGN_DIRECTIONS[0];
    let mut best_dot = f64::NEG_INFINITY;
    for entry in ALIGN_DIRECTIONS.iter() {
        let dot = entry.vector.dot(local);
        if dot > best_dot {
            best_dot = dot;
            best = *entry;
        }
    }
    best
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AlignCorrection {
    pub twist: f64,
    pub spin: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct CubeAlignment {
    pub destination: ViewSnapshot,
    pub initial_orientation: Quat,
    pub final_orientation: Quat,
    pub correction: AlignCorrection,
}

pub fn compute_alignment(
    camera: &CameraState,
    directions: ViewDirections,
    correction: AlignCorrection,
) -> Option<CubeAlignment> {
    let basis = CubeBasis::from_camera(camera);
    let offset = directions.offset(&basis).normalized();
    if offset.is_near_zero(1.0e-9) {
        return None;
    }

    let world_up = basis.up;
    let mut distance = camera.pivot_distance();
    if distance <= 1.0e-9 {
        distance = camera.distance().max(1.0e-3);
    }
    let dir = -offset;

    let (up, right) = if offset.dot(world_up).abs() >= POLE_DOT {
        let up = pole_up(camera, &basis, offset.dot(world_up) > 0.0);
        (up, dir.cross(up).normalized())
    } else {
        let right = dir.cross(world_up).normalized();
        (right.cross(dir).normalized(), right)
    };

    let current = camera.basis();
    let initial_orientation = quat_from_basis(current.forward, current.up, current.right);
    let final_orientation = quat_from_axis_angle(dir, correction.twist)
        * quat_from_basis(dir, up, right)
        * quat_from_axis_angle(Vec3::Y, correction.spin);

    let pivot = camera.pivot;
    let destination = ViewSnapshot {
        position: pivot + offset * distance,
        up,
        center: pivot,
        pivot,
        fov: camera.fov,
        world_up,
        is_ortho: !camera.is_perspective(),
    };

    Some(CubeAlignment {
        destination,
        initial_orientation,
        final_orientation,
        correction,
    })
}

fn pole_up(camera: &CameraState, basis: &CubeBasis, top: bool) -> Vec3 {
    let sign = if top { 1.0 } else { -1.0 };
    let test = (camera.view_direction() * sign + camera.up * UP_BIAS).reject(basis.up);
    if test.is_near_zero(1.0e-9) {
        return basis.front;
    }
    [basis.front, -basis.front, basis.right, -basis.right]
        .into_iter()
        .fold((basis.front, f64::NEG_INFINITY), |(best, best_dot), candidate| {
            let dot = candidate.dot(test);
            if dot > best_dot {
                (candidate, dot)
            } else {
                (best, best_dot)
            }
        })
        .0
}
