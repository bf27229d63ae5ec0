use serde::{Deserialize, Serialize};

/// A timestamped change to the chart's timing or scroll state.
pub trait ControlPoint: Clone {
    /// Time in milliseconds
    fn time(&self) -> f64;
}

/// Uninherited (red line) timing point: tempo and meter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingControlPoint {
    /// Time in milliseconds
    pub time: f64,
    /// Milliseconds per beat. Never NaN.
    pub beat_length: f64,
    /// Numerator of the time signature (beats per measure), at least 1
    pub meter: i32,
}

impl TimingControlPoint {
    pub fn new(time: f64, beat_length: f64, meter: i32) -> Self {
        Self {
            time,
            beat_length,
            meter,
        }
    }

    pub fn bpm(&self) -> f64 {
        60000.0 / self.beat_length
    }
}

impl Default for TimingControlPoint {
    fn default() -> Self {
        Self::new(0.0, 1000.0, 4)
    }
}

impl ControlPoint for TimingControlPoint {
    fn time(&self) -> f64 {
        self.time
    }
}

/// Difficulty (green line) point: slider velocity and tick generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyControlPoint {
    /// Time in milliseconds
    pub time: f64,
    /// Slider velocity multiplier derived from a negative beat length
    pub speed_multiplier: f64,
    /// False when the source line used a NaN beat length
    pub generate_ticks: bool,
}

impl DifficultyControlPoint {
    pub fn new(time: f64, speed_multiplier: f64, generate_ticks: bool) -> Self {
        Self {
            time,
            speed_multiplier,
            generate_ticks,
        }
    }
}

impl Default for DifficultyControlPoint {
    fn default() -> Self {
        Self::new(0.0, 1.0, true)
    }
}

impl ControlPoint for DifficultyControlPoint {
    fn time(&self) -> f64 {
        self.time
    }
}

/// Ascending-by-time list of control points with a fallback point.
///
/// Filled append-only while decoding. Once a chart is handed to playback it is
/// shared behind an `Arc` and never mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPointManager<T> {
    points: Vec<T>,
    default_point: T,
}

impl<T: ControlPoint + Default> Default for ControlPointManager<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: ControlPoint> ControlPointManager<T> {
    pub fn new(default_point: T) -> Self {
        Self {
            points: Vec::new(),
            default_point,
        }
    }

    /// Append a point. Callers supply points in non-decreasing time order;
    /// out-of-order input is not reordered.
    pub fn add(&mut self, point: T) {
        self.points.push(point);
    }

    /// The last point with `time <= time`, or the default point when `time`
    /// precedes every entry. Points sharing a time resolve to the latest added.
    pub fn at(&self, time: f64) -> &T {
        match self.index_at(time) {
            Some(index) => &self.points[index],
            None => &self.default_point,
        }
    }

    /// Like [`Self::at`], but falls back to `fallback` instead of the default point.
    pub fn at_or<'a>(&'a self, time: f64, fallback: &'a T) -> &'a T {
        match self.index_at(time) {
            Some(index) => &self.points[index],
            None => fallback,
        }
    }

    /// Like [`Self::at`], but a time before every entry resolves to the first
    /// entry. Slider velocity uses this: a slider placed ahead of the first
    /// timing point still runs at that point's tempo.
    pub fn at_or_first(&self, time: f64) -> &T {
        let fallback = self.points.first().unwrap_or(&self.default_point);
        self.at_or(time, fallback)
    }

    /// Index of the point in effect at `time`, `None` when the default applies.
    pub fn index_at(&self, time: f64) -> Option<usize> {
        let count = self.points.partition_point(|p| p.time() <= time);
        count.checked_sub(1)
    }

    pub fn points(&self) -> &[T] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.points.get(index)
    }

    pub fn default_point(&self) -> &T {
        &self.default_point
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
