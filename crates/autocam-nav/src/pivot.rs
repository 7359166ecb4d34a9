use autocam_base::math::{Vec2, Vec3};
use tracing::debug;

use crate::camera::CameraState;
use crate::collab::PivotQuery;

#[derive(Clone, Debug, Default)]
pub struct PivotState {
    pick_mode: bool,
    last_hit: Option<Vec3>,
}

impl PivotState {
    pub fn arm_pick(&mut self) {
        self.pick_mode = true;
    }

    pub fn disarm_pick(&mut self) {
        self.pick_mode = false;
    }

    pub fn is_pick_active(&self, key_down: bool) -> bool {
        self.pick_mode || key_down
    }

    pub fn last_hit(&self) -> Option<Vec3> {
        self.last_hit
    }

    pub fn resolve(
        &mut self,
        camera: &CameraState,
        cursor: Vec2,
        query: &dyn PivotQuery,
        use_pivot_always: bool,
    ) -> Option<Vec3> {
        self.pick_mode = false;
        let hit = query.pick(cursor).filter(|hit| hit.is_finite());
        self.last_hit = hit;
        let pivot = match hit {
            Some(hit) => hit,
            None if use_pivot_always => return None,
            None => camera.center,
        };
        debug!(?pivot, hit = hit.is_some(), "pivot resolved");
        (pivot != camera.pivot).then_some(pivot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plane;

    impl PivotQuery for Plane {
        fn pick(&self, cursor: Vec2) -> Option<Vec3> {
            (cursor.x >= 0.0).then(|| Vec3::new(cursor.x, cursor.y, 0.0))
        }
    }

    #[test]
    fn hit_becomes_pivot_and_disarms() {
        let mut state = PivotState::default();
        state.arm_pick();
        assert!(state.is_pick_active(false));
        let camera = CameraState::default();
        let pivot = state.resolve(&camera, Vec2::new(2.0, 3.0), &Plane, true);
        assert_eq!(pivot, Some(Vec3::new(2.0, 3.0, 0.0)));
        assert!(!state.is_pick_active(false));
        assert!(state.is_pick_active(true));
    }

    #[test]
    fn miss_falls_back_to_center_only_when_not_pinned() {
        let mut state = PivotState::default();
        let mut camera = CameraState::default();
        camera.pivot = Vec3::new(1.0, 0.0, 0.0);
        assert_eq!(state.resolve(&camera, Vec2::new(-1.0, 0.0), &Plane, true), None);
        assert_eq!(
            state.resolve(&camera, Vec2::new(-1.0, 0.0), &Plane, false),
            Some(Vec3::ZERO)
        );
    }
}
