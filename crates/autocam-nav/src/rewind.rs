use autocam_base::math::Vec3;
use std::collections::VecDeque;
use tracing::debug;

use crate::camera::{CameraState, ViewSnapshot};
use crate::settings::RewindSettings;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThumbnailBounds {
    pub x: f64,
    pub width: f64,
}

impl ThumbnailBounds {
    pub fn center(&self) -> f64 {
        self.x + self.width * 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RewindEntry {
    pub snapshot: ViewSnapshot,
    pub weight: f64,
    pub thumbnail: ThumbnailBounds,
}

#[derive(Clone, Debug)]
pub struct RewindHistory {
    entries: VecDeque<RewindEntry>,
    settings: RewindSettings,
    current_index: usize,
    slide_offset: f64,
    snapped: bool,
    open: bool,
    bracket_center: f64,
}

impl Default for RewindHistory {
    fn default() -> Self {
        Self::new(RewindSettings::default())
    }
}

impl RewindHistory {
    pub fn new(settings: RewindSettings) -> Self {
        Self {
            entries: VecDeque::new(),
            settings,
            current_index: 0,
            slide_offset: 0.0,
            snapped: false,
            open: false,
            bracket_center: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &RewindEntry> {
        self.entries.iter()
    }

    pub fn get(&self, index: usize) -> Option<&RewindEntry> {
        self.entries.get(index)
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&RewindEntry> {
        self.entries.get(self.current_index)
    }

    pub fn last(&self) -> Option<&RewindEntry> {
        self.entries.back()
    }

    pub fn slide_offset(&self) -> f64 {
        self.slide_offset
    }

    pub fn is_snapped(&self) -> bool {
        self.snapped
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn max_size(&self) -> usize {
        self.settings.max_size
    }

    pub fn thumbnail_screen_x(&self, index: usize) -> Option<f64> {
        self.entries
            .get(index)
            .map(|entry| entry.thumbnail.x + self.slide_offset)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.current_index = 0;
        self.slide_offset = 0.0;
        self.snapped = false;
        self.open = false;
    }

    pub fn add_history_element(&mut self, snapshot: ViewSnapshot) {
        let max_size = self.settings.max_size;
        while max_size > 0 && self.entries.len() >= max_size {
            self.entries.pop_front();
        }
        self.entries.push_back(RewindEntry {
            snapshot,
            weight: 0.0,
            thumbnail: ThumbnailBounds::default(),
        });
        self.current_index = self.entries.len() - 1;
        self.snapped = false;
        self.layout();
        self.select_only(self.current_index);
    }

    pub fn add_intermediate_history_element(&mut self, snapshot: ViewSnapshot) {
        if self.current_index + 1 < self.entries.len() {
            let dropped = self.entries.len() - self.current_index - 1;
            self.entries.truncate(self.current_index + 1);
            debug!(dropped, "rewind history truncated");
        }
        self.add_history_element(snapshot);
    }

    pub fn open_timeline(&mut self, x: f64) -> bool {
        let Some(current) = self.current() else {
            return false;
        };
        self.slide_offset = x - current.thumbnail.center();
        self.bracket_center = x;
        self.open = true;
        self.snapped = false;
        self.update_weights(x);
        true
    }

    pub fn slide_timeline(&mut self, x: f64) -> bool {
        if !self.open || self.entries.is_empty() {
            return false;
        }
        let half = self.settings.bracket_half_width.max(0.0);
        let from_center = x - self.bracket_center;
        if from_center.abs() > half {
            let shift = from_center - half.copysign(from_center);
            self.bracket_center += shift;
            self.slide_offset -= shift;
        }
        self.clamp_slide(x);
        self.update_weights(x);
        true
    }

    pub fn close_timeline(&mut self) -> Option<ViewSnapshot> {
        if !self.open {
            return None;
        }
        self.open = false;
        let blended = if self.snapped {
            None
        } else {
            self.interpolated_camera()
        };
        self.select_only(self.current_index);
        self.snapped = false;
        blended
    }

    pub fn interpolated_camera(&self) -> Option<ViewSnapshot> {
        let total: f64 = self.entries.iter().map(|entry| entry.weight.max(0.0)).sum();
        if total <= 0.0 {
            return self.current().map(|entry| entry.snapshot);
        }
        let mut weighted = self.entries.iter().filter(|entry| entry.weight > 0.0);
        if let (Some(only), None) = (weighted.next(), weighted.next()) {
            return Some(only.snapshot);
        }

        let mut position = Vec3::ZERO;
        let mut center = Vec3::ZERO;
        let mut pivot = Vec3::ZERO;
        let mut up = Vec3::ZERO;
        let mut world_up = Vec3::ZERO;
        let mut fov = 0.0;
        let mut heaviest = self.entries.front()?;
        for entry in &self.entries {
            let w = entry.weight.max(0.0) / total;
            if w == 0.0 {
                continue;
            }
            let view = &entry.snapshot;
            position += view.position * w;
            center += view.center * w;
            pivot += view.pivot * w;
            up += view.up * w;
            world_up += view.world_up * w;
            fov += view.fov * w;
            if entry.weight > heaviest.weight {
                heaviest = entry;
            }
        }
        let fallback = heaviest.snapshot;
        let mut blend = ViewSnapshot {
            position,
            up: if up.is_near_zero(1.0e-9) {
                fallback.up
            } else {
                up.normalized()
            },
            center,
            pivot,
            fov,
            world_up: if world_up.is_near_zero(1.0e-9) {
                fallback.world_up
            } else {
                world_up.normalized()
            },
            is_ortho: fallback.is_ortho,
        };
        // Summed up vectors drift off the blended view direction.
        blend.up = CameraState::from_snapshot(&blend).up;
        Some(blend)
    }

    fn layout(&mut self) {
        let width = self.settings.thumbnail_width;
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.thumbnail = ThumbnailBounds {
                x: index as f64 * width,
                width,
            };
        }
    }

    fn select_only(&mut self, index: usize) {
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.weight = if i == index { 1.0 } else { 0.0 };
        }
    }

    fn clamp_slide(&mut self, x: f64) {
        let (Some(first), Some(last)) = (self.entries.front(), self.entries.back()) else {
            return;
        };
        let lo = x - last.thumbnail.center();
        let hi = x - first.thumbnail.center();
        self.slide_offset = self.slide_offset.clamp(lo, hi);
    }

    fn update_weights(&mut self, x: f64) {
        let width = self.settings.thumbnail_width;
        if self.entries.is_empty() || width <= 0.0 {
            return;
        }
        let first_center = self.entries[0].thumbnail.center();
        let t = x - self.slide_offset;
        let last = self.entries.len() - 1;
        let nearest = ((t - first_center) / width).round().clamp(0.0, last as f64) as usize;
        let distance = (t - self.entries[nearest].thumbnail.center()).abs();

        let threshold = if self.snapped {
            self.settings.snap_leave
        } else {
            self.settings.snap_enter
        };
        let snapped = distance <= threshold;
        if snapped != self.snapped {
            debug!(index = nearest, snapped, "rewind snap changed");
        }
        self.snapped = snapped;
        self.current_index = nearest;

        if snapped {
            self.select_only(nearest);
            return;
        }
        let mut total = 0.0;
        for entry in self.entries.iter_mut() {
            entry.weight = (1.0 - (t - entry.thumbnail.center()).abs() / width).max(0.0);
            total += entry.weight;
        }
        if total > 0.0 {
            for entry in self.entries.iter_mut() {
                entry.weight /= total;
            }
        } else {
            self.select_only(nearest);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_at(x: f64) -> ViewSnapshot {
        ViewSnapshot {
            position: Vec3::new(x, 0.0, 10.0),
            up: Vec3::Y,
            center: Vec3::new(x, 0.0, 0.0),
            pivot: Vec3::new(x, 0.0, 0.0),
            fov: 45.0,
            world_up: Vec3::Y,
            is_ortho: false,
        }
    }

    #[test]
    fn never_exceeds_max_size() {
        let mut history = RewindHistory::new(RewindSettings {
            max_size: 4,
            ..RewindSettings::default()
        });
        for i in 0..10 {
            history.add_history_element(view_at(i as f64));
            assert!(history.len() <= 4);
        }
        assert_eq!(history.len(), 4);
        assert_eq!(history.current_index(), 3);
        let first = history.get(0).map(|entry| entry.snapshot.position.x);
        assert_eq!(first, Some(6.0));
    }

    #[test]
    fn zero_max_size_is_unbounded() {
        let mut history = RewindHistory::new(RewindSettings {
            max_size: 0,
            ..RewindSettings::default()
        });
        for i in 0..40 {
            history.add_history_element(view_at(i as f64));
        }
        assert_eq!(history.len(), 40);
    }

    #[test]
    fn intermediate_element_discards_future() {
        let mut history = RewindHistory::default();
        for i in 0..5 {
            history.add_history_element(view_at(i as f64));
        }
        assert!(history.open_timeline(500.0));
        // 40px past the bracket edge slides the strip 40px too, landing
        // two thumbnails back.
        assert!(history.slide_timeline(412.0));
        assert_eq!(history.current_index(), 2);
        history.close_timeline();

        history.add_intermediate_history_element(view_at(99.0));
        let xs: Vec<f64> = history.entries().map(|e| e.snapshot.position.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 99.0]);
        assert_eq!(history.current_index(), 3);
    }

    #[test]
    fn blend_follows_weights() {
        let mut history = RewindHistory::default();
        history.add_history_element(view_at(0.0));
        history.add_history_element(view_at(10.0));
        let width = history.settings.thumbnail_width;
        assert!(history.open_timeline(300.0));
        assert!(history.is_snapped());
        assert!(history.slide_timeline(300.0 - 0.3 * width));
        assert!(!history.is_snapped());

        let weights: Vec<f64> = history.entries().map(|e| e.weight).collect();
        assert!((weights[0] - 0.3).abs() < 1.0e-12);
        assert!((weights[1] - 0.7).abs() < 1.0e-12);
        let Some(blend) = history.interpolated_camera() else {
            panic!("blend missing");
        };
        let expected = view_at(0.0).position * 0.3 + view_at(10.0).position * 0.7;
        assert!(blend.position.approx_eq(expected, 1.0e-9));
    }

    #[test]
    fn blended_up_stays_orthogonal_to_view() {
        let side = ViewSnapshot {
            position: Vec3::new(10.0, 0.0, 0.0),
            up: Vec3::Y,
            center: Vec3::ZERO,
            pivot: Vec3::ZERO,
            fov: 45.0,
            world_up: Vec3::Y,
            is_ortho: false,
        };
        let top = ViewSnapshot {
            position: Vec3::new(0.0, 10.0, 0.0),
            up: -Vec3::Z,
            ..side
        };
        let mut history = RewindHistory::default();
        history.add_history_element(side);
        history.add_history_element(top);
        assert!(history.open_timeline(500.0));
        let width = history.settings.thumbnail_width;
        let mut blended = 0;
        for i in 0..=width as usize {
            assert!(history.slide_timeline(500.0 - i as f64));
            let Some(view) = history.interpolated_camera() else {
                panic!("blend missing");
            };
            let dir = (view.center - view.position).normalized();
            assert!(view.up.dot(dir).abs() < 1.0e-9, "slide {i}: up.view = {}", view.up.dot(dir));
            assert!((view.up.length() - 1.0).abs() < 1.0e-9);
            if !history.is_snapped() {
                blended += 1;
            }
        }
        assert!(blended > 0);
    }

    #[test]
    fn snap_uses_wider_threshold_to_leave() {
        let mut history = RewindHistory::default();
        history.add_history_element(view_at(0.0));
        history.add_history_element(view_at(1.0));
        assert!(history.open_timeline(0.0));
        assert!(history.is_snapped());
        // Between the enter and leave thresholds: stays snapped.
        history.slide_timeline(-10.0);
        assert!(history.is_snapped());
        history.slide_timeline(-20.0);
        assert!(!history.is_snapped());
        // Coming back inside the leave threshold is not enough to re-snap.
        history.slide_timeline(-10.0);
        assert!(!history.is_snapped());
        history.slide_timeline(-3.0);
        assert!(history.is_snapped());
    }

    #[test]
    fn slide_never_passes_the_ends() {
        let mut history = RewindHistory::default();
        for i in 0..3 {
            history.add_history_element(view_at(i as f64));
        }
        assert!(history.open_timeline(400.0));
        history.slide_timeline(400.0 + 1000.0);
        assert_eq!(history.current_index(), 2);
        history.slide_timeline(-2000.0);
        assert_eq!(history.current_index(), 0);
        assert!(history.is_snapped());
        assert_eq!(history.close_timeline(), None);
        assert!(!history.is_open());
    }
}
