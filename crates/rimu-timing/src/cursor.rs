use std::fmt;
use std::sync::Arc;

use log::trace;
use osu_model::{ControlPoint, ControlPointManager};

use crate::observer::ClockObserver;

type ChangeCallback<T> = Box<dyn FnMut(&T)>;

/// Tracks the control point in effect as a playback clock moves.
///
/// Only the initial position is found by binary search. After that each clock
/// update steps one boundary at a time from the last known point, forward or
/// backward with the direction of the clock.
pub struct ControlPointCursor<T: ControlPoint> {
    manager: Arc<ControlPointManager<T>>,
    /// `None` while the time precedes every point and the default applies
    index: Option<usize>,
    changes: usize,
    on_change: Option<ChangeCallback<T>>,
}

impl<T: ControlPoint> ControlPointCursor<T> {
    /// Cursor positioned at time zero.
    pub fn new(manager: Arc<ControlPointManager<T>>) -> Self {
        Self::at(manager, 0.0)
    }

    pub fn at(manager: Arc<ControlPointManager<T>>, time: f64) -> Self {
        let index = manager.index_at(time);
        Self {
            manager,
            index,
            changes: 0,
            on_change: None,
        }
    }

    /// Call `callback` with the new current point whenever it changes.
    pub fn with_callback(mut self, callback: impl FnMut(&T) + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn manager(&self) -> &Arc<ControlPointManager<T>> {
        &self.manager
    }

    /// Point in effect; the manager's default before the first point.
    pub fn current(&self) -> &T {
        match self.index {
            Some(index) => &self.manager.points()[index],
            None => self.manager.default_point(),
        }
    }

    pub fn previous(&self) -> Option<&T> {
        let index = self.index?.checked_sub(1)?;
        self.manager.get(index)
    }

    pub fn next(&self) -> Option<&T> {
        let index = self.index.map_or(0, |i| i + 1);
        self.manager.get(index)
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Number of updates that moved the cursor to another point.
    pub fn changes(&self) -> usize {
        self.changes
    }

    /// Re-resolve from scratch, e.g. after the clock was reset. Not counted as a change.
    pub fn resolve(&mut self, time: f64) {
        self.index = self.manager.index_at(time);
    }

    /// Step toward `elapsed_ms` in the direction of `delta_ms`.
    pub fn update(&mut self, elapsed_ms: f64, delta_ms: f64) {
        let before = self.index;

        if delta_ms > 0.0 {
            while let Some(next) = self.next() {
                if elapsed_ms < next.time() {
                    break;
                }
                self.index = Some(self.index.map_or(0, |i| i + 1));
            }
        } else if delta_ms < 0.0 {
            while let Some(index) = self.index {
                if elapsed_ms >= self.manager.points()[index].time() {
                    break;
                }
                self.index = index.checked_sub(1);
            }
        }

        if self.index != before {
            self.changes += 1;
            trace!(
                "Control point changed at {:.1}ms: {:?} -> {:?}",
                elapsed_ms, before, self.index
            );
            if let Some(callback) = self.on_change.as_mut() {
                let current = match self.index {
                    Some(index) => &self.manager.points()[index],
                    None => self.manager.default_point(),
                };
                callback(current);
            }
        }
    }
}

impl<T: ControlPoint> ClockObserver for ControlPointCursor<T> {
    fn on_clock_update(&mut self, elapsed_ms: f64, delta_ms: f64) {
        self.update(elapsed_ms, delta_ms);
    }
}

impl<T: ControlPoint + fmt::Debug> fmt::Debug for ControlPointCursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlPointCursor")
            .field("index", &self.index)
            .field("current", self.current())
            .field("changes", &self.changes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use osu_model::{DifficultyControlPoint, TimingControlPoint};

    use super::*;

    fn timing(times: &[f64]) -> Arc<ControlPointManager<TimingControlPoint>> {
        let mut manager = ControlPointManager::default();
        for (i, &t) in times.iter().enumerate() {
            manager.add(TimingControlPoint::new(t, 300.0 + i as f64, 4));
        }
        Arc::new(manager)
    }

    #[test]
    fn test_initial_resolution() {
        let manager = timing(&[0.0, 1000.0, 2000.0]);
        let cursor = ControlPointCursor::new(manager.clone());
        assert_eq!(cursor.index(), Some(0));
        assert_eq!(cursor.previous(), None);
        assert_eq!(cursor.next().map(|p| p.time), Some(1000.0));

        let cursor = ControlPointCursor::at(manager, 1500.0);
        assert_eq!(cursor.current().time, 1000.0);
        assert_eq!(cursor.previous().map(|p| p.time), Some(0.0));
        assert_eq!(cursor.next().map(|p| p.time), Some(2000.0));
    }

    #[test]
    fn test_default_before_first_point() {
        let manager = timing(&[500.0]);
        let cursor = ControlPointCursor::new(manager.clone());
        assert_eq!(cursor.index(), None);
        assert_eq!(cursor.current(), manager.default_point());
        assert_eq!(cursor.previous(), None);
        assert_eq!(cursor.next().map(|p| p.time), Some(500.0));
    }

    #[test]
    fn test_empty_manager() {
        let mut cursor =
            ControlPointCursor::new(Arc::new(ControlPointManager::<DifficultyControlPoint>::default()));
        cursor.update(10_000.0, 16.0);
        cursor.update(0.0, -16.0);
        assert_eq!(cursor.index(), None);
        assert_eq!(cursor.current().speed_multiplier, 1.0);
        assert_eq!(cursor.changes(), 0);
    }

    #[test]
    fn test_steps_forward_and_back() {
        let mut cursor = ControlPointCursor::new(timing(&[0.0, 1000.0, 2000.0]));

        cursor.update(999.0, 16.0);
        assert_eq!(cursor.index(), Some(0));
        cursor.update(1000.0, 1.0);
        assert_eq!(cursor.index(), Some(1));
        cursor.update(2500.0, 1500.0);
        assert_eq!(cursor.index(), Some(2));
        assert_eq!(cursor.next(), None);

        cursor.update(1999.0, -501.0);
        assert_eq!(cursor.index(), Some(1));
        cursor.update(-10.0, -2009.0);
        assert_eq!(cursor.index(), None);
        assert_eq!(cursor.changes(), 4);
    }

    #[test]
    fn test_crosses_several_points_in_one_frame() {
        let mut cursor = ControlPointCursor::new(timing(&[0.0, 10.0, 20.0, 30.0]));
        cursor.update(25.0, 25.0);
        assert_eq!(cursor.index(), Some(2));
        assert_eq!(cursor.changes(), 1);
    }

    #[test]
    fn test_zero_delta_is_noop() {
        let mut cursor = ControlPointCursor::new(timing(&[0.0, 1000.0]));
        cursor.update(5000.0, 0.0);
        assert_eq!(cursor.index(), Some(0));
        assert_eq!(cursor.changes(), 0);
    }

    #[test]
    fn test_same_time_points_resolve_to_latest() {
        let manager = timing(&[0.0, 1000.0, 1000.0]);
        let mut cursor = ControlPointCursor::new(manager.clone());
        cursor.update(1000.0, 16.0);
        assert_eq!(cursor.index(), manager.index_at(1000.0));
        assert_eq!(cursor.index(), Some(2));
        cursor.update(999.0, -1.0);
        assert_eq!(cursor.index(), Some(0));
    }

    #[test]
    fn test_callback_sees_new_point() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let mut cursor = ControlPointCursor::new(timing(&[0.0, 1000.0]))
            .with_callback(move |p: &TimingControlPoint| sink.borrow_mut().push(p.beat_length));

        cursor.update(500.0, 16.0);
        cursor.update(1200.0, 16.0);
        cursor.update(900.0, -16.0);
        assert_eq!(*seen.borrow(), vec![301.0, 300.0]);
    }

    #[test]
    fn test_resolve() {
        let mut cursor = ControlPointCursor::new(timing(&[0.0, 1000.0, 2000.0]));
        cursor.resolve(2500.0);
        assert_eq!(cursor.index(), Some(2));
        cursor.resolve(0.0);
        assert_eq!(cursor.index(), Some(0));
        assert_eq!(cursor.changes(), 0);
    }

    #[test]
    fn test_matches_lookup_after_walk() {
        let manager = timing(&[0.0, 250.0, 300.0, 900.0, 1400.0]);
        let mut cursor = ControlPointCursor::new(manager.clone());
        let mut time = 0.0;
        for delta in [120.0, 300.0, -50.0, 800.0, -900.0, 1200.0] {
            time += delta;
            cursor.update(time, delta);
            assert_eq!(cursor.current(), manager.at(time));
        }
    }
}
