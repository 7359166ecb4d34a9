use anyhow::{Context, Result, bail};
use autocam_base::math::{Vec2, Vec3};
use autocam_nav::{NavigationEngine, SceneBounds, TransitionMode, ViewDirections, ViewSnapshot};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::run_to_completion;

fn default_frames() -> usize {
    1
}

fn default_dt() -> f64 {
    1.0 / 60.0
}

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptStep {
    Begin {
        x: f64,
        y: f64,
    },
    End,
    Orbit {
        dx: f64,
        dy: f64,
    },
    Pan {
        dx: f64,
        dy: f64,
    },
    Zoom {
        amount: f64,
    },
    Walk {
        dx: f64,
        dy: f64,
        #[serde(default = "default_frames")]
        frames: usize,
        #[serde(default = "default_dt")]
        dt: f64,
    },
    Elevate {
        dy: f64,
    },
    Look {
        dx: f64,
        dy: f64,
    },
    Align {
        dir: String,
    },
    GoTo {
        view: ViewSnapshot,
        #[serde(default)]
        spherical: bool,
    },
    Home,
    Fit {
        min: Vec3,
        max: Vec3,
        #[serde(default)]
        animate: bool,
    },
    Tick {
        #[serde(default = "default_dt")]
        dt: f64,
        #[serde(default = "default_frames")]
        frames: usize,
    },
    Settle {
        #[serde(default = "default_dt")]
        dt: f64,
    },
    Perspective,
    Orthographic,
    WorldUp {
        up: Vec3,
    },
    Snapping {
        enabled: bool,
    },
    TimelineOpen {
        x: f64,
    },
    TimelineSlide {
        x: f64,
    },
    TimelineClose,
}

#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub view: ViewSnapshot,
    pub history_len: usize,
    pub history_index: usize,
    pub nearest_cube_view: String,
    pub transition_running: bool,
}

impl ReplayReport {
    pub fn from_engine(engine: &NavigationEngine) -> Self {
        Self {
            view: engine.current_view(),
            history_len: engine.history().len(),
            history_index: engine.history().current_index(),
            nearest_cube_view: engine.nearest_cube_view().to_string(),
            transition_running: engine.is_transition_running(),
        }
    }
}

pub fn run(engine: &mut NavigationEngine, steps: &[ScriptStep]) -> Result<()> {
    let mut cursor = Vec2::ZERO;
    for (index, step) in steps.iter().enumerate() {
        debug!(index, ?step, "script step");
        apply(engine, step, &mut cursor).with_context(|| format!("script step {index}"))?;
    }
    Ok(())
}

fn apply(engine: &mut NavigationEngine, step: &ScriptStep, cursor: &mut Vec2) -> Result<()> {
    match step {
        ScriptStep::Begin { x, y } => {
            *cursor = Vec2::new(*x, *y);
            engine.begin_gesture(*cursor);
        }
        ScriptStep::End => {
            engine.end_gesture();
        }
        ScriptStep::Orbit { dx, dy } => {
            let (now, start, delta) = move_pointer(engine, cursor, *dx, *dy);
            engine.orbit(now, start, delta, None);
        }
        ScriptStep::Pan { dx, dy } => {
            let (_, _, delta) = move_pointer(engine, cursor, *dx, *dy);
            engine.pan(delta);
        }
        ScriptStep::Zoom { amount } => {
            engine.zoom(Vec2::new(0.0, *amount));
        }
        ScriptStep::Walk {
            dx,
            dy,
            frames,
            dt,
        } => {
            let start = engine
                .gesture()
                .map(|gesture| gesture.start_cursor())
                .unwrap_or(*cursor);
            let now = start + Vec2::new(*dx, *dy);
            *cursor = now;
            for _ in 0..*frames {
                engine.walk(now, start, Vec2::ZERO, *dt);
            }
        }
        ScriptStep::Elevate { dy } => {
            engine.elevate(*dy);
        }
        ScriptStep::Look { dx, dy } => {
            let (_, _, delta) = move_pointer(engine, cursor, *dx, *dy);
            engine.look(delta);
        }
        ScriptStep::Align { dir } => {
            let directions: ViewDirections =
                dir.parse().with_context(|| format!("invalid direction {dir:?}"))?;
            if !engine.align_to(directions) {
                bail!("alignment to {directions} was not started");
            }
        }
        ScriptStep::GoTo { view, spherical } => {
            let mode = if *spherical {
                TransitionMode::Spherical
            } else {
                TransitionMode::Linear
            };
            engine.go_to_view(*view, mode);
        }
        ScriptStep::Home => {
            engine.go_home();
        }
        ScriptStep::Fit { min, max, animate } => {
            if !engine.fit_to_bounds(SceneBounds::new(*min, *max), *animate) {
                bail!("bounds {min:?}..{max:?} cannot be framed");
            }
        }
        ScriptStep::Tick { dt, frames } => {
            for _ in 0..*frames {
                engine.tick(*dt);
            }
        }
        ScriptStep::Settle { dt } => {
            if !dt.is_finite() || *dt <= 0.0 {
                bail!("settle needs a positive dt, got {dt}");
            }
            run_to_completion(engine, *dt)?;
        }
        ScriptStep::Perspective => {
            engine.to_perspective();
        }
        ScriptStep::Orthographic => {
            engine.to_orthographic();
        }
        ScriptStep::WorldUp { up } => {
            engine.set_world_up(*up);
        }
        ScriptStep::Snapping { enabled } => {
            engine.set_orbit_snapping(*enabled);
        }
        ScriptStep::TimelineOpen { x } => {
            engine.open_timeline(*x);
        }
        ScriptStep::TimelineSlide { x } => {
            engine.slide_timeline(*x);
        }
        ScriptStep::TimelineClose => {
            engine.close_timeline();
        }
    }
    Ok(())
}

fn move_pointer(
    engine: &mut NavigationEngine,
    cursor: &mut Vec2,
    dx: f64,
    dy: f64,
) -> (Vec2, Vec2, Vec2) {
    let next = *cursor + Vec2::new(dx, dy);
    *cursor = next;
    match engine.pointer_moved(next) {
        Some(sample) => (sample.position, sample.start, sample.delta),
        None => (next, next, Vec2::new(dx, dy)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_steps() -> Result<()> {
        let steps: Vec<ScriptStep> = serde_json::from_str(
            r#"[
                {"op": "begin", "x": 10, "y": 20},
                {"op": "orbit", "dx": 30, "dy": 0},
                {"op": "end"},
                {"op": "align", "dir": "top-front"},
                {"op": "settle"}
            ]"#,
        )?;
        assert_eq!(steps.len(), 5);
        assert!(matches!(steps[4], ScriptStep::Settle { dt } if dt == 1.0 / 60.0));
        Ok(())
    }

    #[test]
    fn scripted_orbit_records_history() -> Result<()> {
        let steps: Vec<ScriptStep> = serde_json::from_str(
            r#"[
                {"op": "begin", "x": 0, "y": 0},
                {"op": "orbit", "dx": 40, "dy": 10},
                {"op": "orbit", "dx": 40, "dy": 10},
                {"op": "end"},
                {"op": "align", "dir": "front"},
                {"op": "settle"}
            ]"#,
        )?;
        let mut engine = NavigationEngine::default();
        run(&mut engine, &steps)?;
        let report = ReplayReport::from_engine(&engine);
        assert_eq!(report.history_len, 3);
        assert_eq!(report.nearest_cube_view, "front");
        assert!(!report.transition_running);
        Ok(())
    }
}
