use autocam_base::math::{Quat, Vec3, ease, lerp, rotate_vector, slerp};
use tracing::debug;

use crate::camera::{CameraState, ViewSnapshot};
use crate::settings::TransitionSettings;

pub type CompletionCallback = Box<dyn FnOnce(&ViewSnapshot)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionMode {
    Linear,
    Spherical,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransitionPhase {
    #[default]
    Idle,
    Running,
    Completed,
}

#[derive(Clone, Copy, Debug)]
struct Orientations {
    start: Quat,
    end: Quat,
    start_distance: f64,
    end_distance: f64,
}

pub struct TransitionJob {
    start: ViewSnapshot,
    destination: ViewSnapshot,
    mode: TransitionMode,
    elapsed_time: f64,
    duration: f64,
    percent_cap: f64,
    orientations: Option<Orientations>,
    completion: Option<CompletionCallback>,
}

impl TransitionJob {
    pub fn linear(
        start: ViewSnapshot,
        destination: ViewSnapshot,
        settings: &TransitionSettings,
    ) -> Self {
        Self {
            start,
            destination,
            mode: TransitionMode::Linear,
            elapsed_time: 0.0,
            duration: settings.duration,
            percent_cap: settings.percent_cap,
            orientations: None,
            completion: None,
        }
    }

    pub fn spherical(
        start: ViewSnapshot,
        destination: ViewSnapshot,
        start_orientation: Quat,
        end_orientation: Quat,
        settings: &TransitionSettings,
    ) -> Self {
        Self {
            start,
            destination,
            mode: TransitionMode::Spherical,
            elapsed_time: 0.0,
            duration: settings.duration,
            percent_cap: settings.percent_cap,
            orientations: Some(Orientations {
                start: start_orientation,
                end: end_orientation,
                start_distance: start.distance(),
                end_distance: destination.distance(),
            }),
            completion: None,
        }
    }

    pub fn with_completion(mut self, completion: CompletionCallback) -> Self {
        self.completion = Some(completion);
        self
    }

    pub fn destination(&self) -> &ViewSnapshot {
        &self.destination
    }

    pub fn mode(&self) -> TransitionMode {
        self.mode
    }

    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    fn unit_time(&self) -> f64 {
        ease(self.elapsed_time / self.duration, 0.0, self.percent_cap)
    }

    fn apply_linear(&self, camera: &mut CameraState, u: f64) -> bool {
        let (a, b) = (&self.start, &self.destination);
        camera.center = a.center.lerp(b.center, u);
        camera.position = a.position.lerp(b.position, u);
        camera.pivot = a.pivot.lerp(b.pivot, u);
        camera.fov = lerp(a.fov, b.fov, u);
        let world_up_changed = if a.world_up == b.world_up {
            false
        } else {
            camera.set_world_up(a.world_up.lerp(b.world_up, u))
        };
        let up = a.up.lerp(b.up, u);
        camera.set_camera_up(if up.is_near_zero(1.0e-9) { b.up } else { up });
        world_up_changed
    }

    fn apply_spherical(&self, camera: &mut CameraState, orientations: &Orientations, u: f64) {
        let (a, b) = (&self.start, &self.destination);
        let rotation = slerp(orientations.start, orientations.end, u);
        let forward = rotate_vector(rotation, Vec3::new(0.0, 0.0, -1.0));
        let distance = lerp(orientations.start_distance, orientations.end_distance, u);
        camera.center = a.center.lerp(b.center, u);
        camera.position = camera.center - forward * distance;
        camera.up = rotate_vector(rotation, Vec3::Y);
        camera.pivot = a.pivot.lerp(b.pivot, u);
        camera.fov = lerp(a.fov, b.fov, u);
    }
}

pub enum TickOutcome {
    Idle,
    Advanced {
        world_up_changed: bool,
    },
    Completed {
        world_up_changed: bool,
        destination: ViewSnapshot,
        completion: Option<CompletionCallback>,
    },
}

#[derive(Default)]
pub struct TransitionEngine {
    job: Option<TransitionJob>,
    phase: TransitionPhase,
}

impl TransitionEngine {
    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TransitionPhase::Running
    }

    pub fn job(&self) -> Option<&TransitionJob> {
        self.job.as_ref()
    }

    pub fn start(&mut self, job: TransitionJob) {
        if self.job.is_some() {
            debug!("replacing in-flight transition");
        }
        debug!(mode = ?job.mode, duration = job.duration, "transition started");
        self.job = Some(job);
        self.phase = TransitionPhase::Running;
    }

    pub fn cancel(&mut self) -> bool {
        if self.job.take().is_some() {
            debug!("transition cancelled");
            self.phase = TransitionPhase::Idle;
            true
        } else {
            false
        }
    }

    pub fn tick(&mut self, camera: &mut CameraState, dt: f64) -> TickOutcome {
        let Some(job) = self.job.as_mut() else {
            return TickOutcome::Idle;
        };
        if dt.is_finite() {
            job.elapsed_time += dt.max(0.0);
        }

        if job.elapsed_time >= job.duration {
            let Some(job) = self.job.take() else {
                return TickOutcome::Idle;
            };
            let world_up_changed = camera.apply_snapshot(&job.destination);
            self.phase = TransitionPhase::Completed;
            debug!(elapsed = job.elapsed_time, "transition completed");
            return TickOutcome::Completed {
                world_up_changed,
                destination: job.destination,
                completion: job.completion,
            };
        }

        let u = job.unit_time();
        let world_up_changed = match (job.mode, job.orientations) {
            (TransitionMode::Spherical, Some(orientations)) => {
                if u >= 1.0 {
                    camera.apply_snapshot(&job.destination)
                } else {
                    job.apply_spherical(camera, &orientations, u);
                    false
                }
            }
            _ => job.apply_linear(camera, u),
        };
        TickOutcome::Advanced { world_up_changed }
    }
}
