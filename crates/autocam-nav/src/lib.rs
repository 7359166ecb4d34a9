pub mod camera;
pub mod collab;
pub mod engine;
pub mod input;
pub mod interaction;
pub mod pivot;
pub mod rewind;
pub mod settings;
pub mod snap;
pub mod transition;
pub mod viewcube;

pub use camera::{CameraState, ProjectionMode, ViewSnapshot};
pub use collab::{Action, CameraHandle, NavigationAuth, PivotQuery, RedrawTarget, SimpleCamera};
pub use engine::NavigationEngine;
pub use rewind::{RewindEntry, RewindHistory};
pub use settings::{NavSettings, NavigationFlags, SceneBounds};
pub use transition::{TransitionMode, TransitionPhase};
pub use viewcube::{CubeFace, ViewDirections};
