use autocam_base::math::Vec2;

use crate::camera::ViewSnapshot;

#[derive(Clone, Copy, Debug)]
pub struct Gesture {
    start_cursor: Vec2,
    last_cursor: Vec2,
    start_view: ViewSnapshot,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerSample {
    pub position: Vec2,
    pub start: Vec2,
    pub delta: Vec2,
}

impl Gesture {
    pub fn new(cursor: Vec2, start_view: ViewSnapshot) -> Self {
        Self {
            start_cursor: cursor,
            last_cursor: cursor,
            start_view,
        }
    }

    pub fn start_cursor(&self) -> Vec2 {
        self.start_cursor
    }

    pub fn start_view(&self) -> &ViewSnapshot {
        &self.start_view
    }

    pub fn advance(&mut self, cursor: Vec2) -> PointerSample {
        let delta = cursor - self.last_cursor;
        self.last_cursor = cursor;
        PointerSample {
            position: cursor,
            start: self.start_cursor,
            delta,
        }
    }
}
