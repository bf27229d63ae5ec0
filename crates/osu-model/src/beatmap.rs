use serde::{Deserialize, Serialize};

use crate::control_point::{ControlPointManager, DifficultyControlPoint, TimingControlPoint};
use crate::hit_object::HitObject;
use crate::sections::{Colours, Difficulty, Events, General, Metadata};
use crate::stacking;

/// Format version assumed when the header carries none
pub const DEFAULT_FORMAT_VERSION: i32 = 14;

/// Charts older than this were authored against a 24ms late audio offset
const LEGACY_OFFSET_VERSION: i32 = 5;
const LEGACY_OFFSET_MS: i32 = 24;

/// Timing and difficulty control points of a chart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlPoints {
    pub timing: ControlPointManager<TimingControlPoint>,
    pub difficulty: ControlPointManager<DifficultyControlPoint>,
}

/// Decoded `.osu` chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatmapData {
    pub format_version: i32,
    pub general: General,
    pub metadata: Metadata,
    pub difficulty: Difficulty,
    pub events: Events,
    pub colours: Colours,
    pub control_points: ControlPoints,
    /// `None` unless the decoder was asked for hit objects
    pub hit_objects: Option<Vec<HitObject>>,
    /// Verbatim `[TimingPoints]` lines
    pub raw_timing_points: Vec<String>,
    /// Verbatim `[HitObjects]` lines
    pub raw_hit_objects: Vec<String>,
    /// Hex MD5 of the source bytes
    pub md5: String,
    /// File name of the `.osu` file, empty when not decoded from a file
    pub filename: String,
    /// Directory containing the `.osu` file
    pub folder: Option<String>,
}

impl Default for BeatmapData {
    fn default() -> Self {
        Self {
            format_version: DEFAULT_FORMAT_VERSION,
            general: General::default(),
            metadata: Metadata::default(),
            difficulty: Difficulty::default(),
            events: Events::default(),
            colours: Colours::default(),
            control_points: ControlPoints::default(),
            hit_objects: None,
            raw_timing_points: Vec::new(),
            raw_hit_objects: Vec::new(),
            md5: String::new(),
            filename: String::new(),
            folder: None,
        }
    }
}

impl BeatmapData {
    /// Apply the chart-wide offset to a time read from the file
    pub fn offset_time(&self, time: f64) -> f64 {
        time + self.offset_ms() as f64
    }

    pub fn offset_time_int(&self, time: i32) -> i32 {
        time.saturating_add(self.offset_ms())
    }

    fn offset_ms(&self) -> i32 {
        if self.format_version < LEGACY_OFFSET_VERSION {
            LEGACY_OFFSET_MS
        } else {
            0
        }
    }

    pub fn hit_objects(&self) -> &[HitObject] {
        self.hit_objects.as_deref().unwrap_or(&[])
    }

    /// Maximum achievable combo, `None` when hit objects were not decoded
    pub fn max_combo(&self) -> Option<usize> {
        self.hit_objects
            .as_ref()
            .map(|objects| objects.iter().map(HitObject::combo_count).sum())
    }

    /// Time of the first and last hit object
    pub fn play_range(&self) -> Option<(f64, f64)> {
        let objects = self.hit_objects();
        let first = objects.first()?.start_time;
        let last = objects
            .iter()
            .map(HitObject::end_time)
            .fold(first, f64::max);
        Some((first, last))
    }

    /// Lowest and highest BPM across the timing points
    pub fn bpm_range(&self) -> Option<(f64, f64)> {
        let points = self.control_points.timing.points();
        let first = points.first()?.bpm();
        Some(points.iter().map(TimingControlPoint::bpm).fold(
            (first, first),
            |(min, max), bpm| (min.min(bpm), max.max(bpm)),
        ))
    }

    /// Set scale, combo numbers and stack heights on the decoded hit objects.
    pub(crate) fn populate_object_data(&mut self) {
        let scale = self.difficulty.scale();
        let preempt = self.difficulty.approach_time_ms();
        let leniency = self.general.stack_leniency;
        let version = self.format_version;

        let Some(objects) = self.hit_objects.as_mut() else {
            return;
        };

        let mut combo_number = 0;
        for (i, object) in objects.iter_mut().enumerate() {
            object.scale = scale;
            if i == 0 || object.is_new_combo {
                combo_number = 0;
            }
            combo_number += 1;
            object.combo_number = combo_number;
        }

        stacking::apply_stacking(version, objects, preempt, leniency);
    }
}
