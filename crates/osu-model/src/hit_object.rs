use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::math::Vector2;
use crate::slider_path::SliderPath;

/// Radius of a hit circle at scale 1, in osu!pixels
pub const OBJECT_RADIUS: f32 = 64.0;

/// Stack offset per unit of stack height at scale 1
const STACK_OFFSET: f32 = -6.4;

/// Ticks closer than this to a slider's end are not generated, in milliseconds of travel
const TICK_END_MARGIN_MS: f64 = 10.0;
/// Paths longer than this only get ticks up to this distance
const MAX_TICK_LENGTH: f64 = 100_000.0;
/// Upper bound on ticks generated for one slider across all spans
const MAX_TICKS_PER_SLIDER: usize = 32_768;
/// The legacy last tick sits this many milliseconds before the slider end
const LEGACY_LAST_TICK_OFFSET: f64 = 36.0;

bitflags! {
    /// Type field of a `[HitObjects]` line
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct HitObjectType: i32 {
        const CIRCLE = 1;
        const SLIDER = 1 << 1;
        const NEW_COMBO = 1 << 2;
        const SPINNER = 1 << 3;
        /// Combo colour skip count (3 bits)
        const COMBO_OFFSET = 0b111 << 4;
        const HOLD = 1 << 7;
    }
}

impl HitObjectType {
    /// How many combo colours to skip when this object starts a new combo
    pub fn combo_offset(self) -> i32 {
        (self & Self::COMBO_OFFSET).bits() >> 4
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitObject {
    /// Milliseconds, offset-adjusted
    pub start_time: f64,
    pub position: Vector2,
    pub is_new_combo: bool,
    /// 1-based position within its combo, filled after decoding
    pub combo_number: u32,
    pub scale: f32,
    /// Set by the stacking pass; negative below a slider end
    pub stack_height: i32,
    pub kind: HitObjectKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HitObjectKind {
    Circle,
    Slider(Box<Slider>),
    Spinner { end_time: f64 },
}

impl HitObject {
    pub fn circle(start_time: f64, position: Vector2, is_new_combo: bool) -> Self {
        Self::new(start_time, position, is_new_combo, HitObjectKind::Circle)
    }

    /// Spinners always sit at the playfield centre
    pub fn spinner(start_time: f64, end_time: f64, is_new_combo: bool) -> Self {
        Self::new(
            start_time,
            Vector2::new(256.0, 192.0),
            is_new_combo,
            HitObjectKind::Spinner { end_time },
        )
    }

    pub fn slider(slider: Slider, is_new_combo: bool) -> Self {
        Self::new(
            slider.start_time,
            slider.position,
            is_new_combo,
            HitObjectKind::Slider(Box::new(slider)),
        )
    }

    fn new(start_time: f64, position: Vector2, is_new_combo: bool, kind: HitObjectKind) -> Self {
        Self {
            start_time,
            position,
            is_new_combo,
            combo_number: 0,
            scale: 1.0,
            stack_height: 0,
            kind,
        }
    }

    pub fn is_circle(&self) -> bool {
        matches!(self.kind, HitObjectKind::Circle)
    }

    pub fn is_slider(&self) -> bool {
        matches!(self.kind, HitObjectKind::Slider(_))
    }

    pub fn is_spinner(&self) -> bool {
        matches!(self.kind, HitObjectKind::Spinner { .. })
    }

    pub fn as_slider(&self) -> Option<&Slider> {
        match &self.kind {
            HitObjectKind::Slider(slider) => Some(slider),
            _ => None,
        }
    }

    pub fn end_time(&self) -> f64 {
        match &self.kind {
            HitObjectKind::Circle => self.start_time,
            HitObjectKind::Slider(slider) => slider.end_time,
            HitObjectKind::Spinner { end_time } => *end_time,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end_time() - self.start_time
    }

    pub fn end_position(&self) -> Vector2 {
        match &self.kind {
            HitObjectKind::Slider(slider) => slider.end_position,
            _ => self.position,
        }
    }

    pub fn radius(&self) -> f32 {
        OBJECT_RADIUS * self.scale
    }

    /// Offset applied to every drawn position of this object
    pub fn stack_offset(&self) -> Vector2 {
        Vector2::splat(self.stack_height as f32 * self.scale * STACK_OFFSET)
    }

    pub fn stacked_position(&self) -> Vector2 {
        self.position + self.stack_offset()
    }

    pub fn stacked_end_position(&self) -> Vector2 {
        self.end_position() + self.stack_offset()
    }

    /// Combo contribution: one per object, sliders count each nested judgement
    pub fn combo_count(&self) -> usize {
        match &self.kind {
            HitObjectKind::Slider(slider) => slider.nested_objects.len(),
            _ => 1,
        }
    }
}

/// Timing state a slider is built against
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderTiming {
    /// Beat length of the timing point in effect
    pub beat_length: f64,
    /// Speed multiplier of the difficulty point in effect
    pub speed_multiplier: f64,
    pub generate_ticks: bool,
    /// Chart-wide `SliderMultiplier`
    pub slider_multiplier: f64,
    /// Chart-wide `SliderTickRate`
    pub tick_rate: f64,
    /// Scales tick spacing; charts before v8 used `1 / speed_multiplier`
    pub tick_distance_multiplier: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slider {
    pub start_time: f64,
    pub position: Vector2,
    /// Number of spans; 1 means no repeats
    pub repeat_count: i32,
    pub path: SliderPath,
    /// osu!pixels per millisecond
    pub velocity: f64,
    pub span_duration: f64,
    pub end_time: f64,
    pub end_position: Vector2,
    /// Head, ticks, repeats and tail ordered by time
    pub nested_objects: Vec<SliderNestedObject>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NestedKind {
    Head,
    Tick,
    Repeat,
    Tail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SliderNestedObject {
    pub kind: NestedKind,
    pub start_time: f64,
    pub position: Vector2,
    pub span_index: i32,
    pub span_start_time: f64,
}

impl Slider {
    pub fn new(
        start_time: f64,
        position: Vector2,
        repeat_count: i32,
        path: SliderPath,
        timing: &SliderTiming,
    ) -> Self {
        let repeat_count = repeat_count.max(1);
        let scoring_distance = 100.0 * timing.slider_multiplier * timing.speed_multiplier;
        let velocity = scoring_distance / timing.beat_length;
        let end_time = start_time + repeat_count as f64 * path.expected_distance / velocity;
        let end_position = position + path.position_at((repeat_count % 2) as f64);
        let span_duration = (end_time - start_time) / repeat_count as f64;

        let mut slider = Self {
            start_time,
            position,
            repeat_count,
            path,
            velocity,
            span_duration,
            end_time,
            end_position,
            nested_objects: Vec::new(),
        };
        slider.create_nested_objects(scoring_distance, timing);
        slider
    }

    pub fn span_count(&self) -> i32 {
        self.repeat_count
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn head(&self) -> Option<&SliderNestedObject> {
        self.nested_objects
            .iter()
            .find(|o| o.kind == NestedKind::Head)
    }

    pub fn tail(&self) -> Option<&SliderNestedObject> {
        self.nested_objects
            .iter()
            .find(|o| o.kind == NestedKind::Tail)
    }

    pub fn ticks(&self) -> impl Iterator<Item = &SliderNestedObject> {
        self.nested_objects
            .iter()
            .filter(|o| o.kind == NestedKind::Tick)
    }

    pub fn repeats(&self) -> impl Iterator<Item = &SliderNestedObject> {
        self.nested_objects
            .iter()
            .filter(|o| o.kind == NestedKind::Repeat)
    }

    fn create_nested_objects(&mut self, scoring_distance: f64, timing: &SliderTiming) {
        let mut nested = vec![SliderNestedObject {
            kind: NestedKind::Head,
            start_time: self.start_time,
            position: self.position,
            span_index: 0,
            span_start_time: self.start_time,
        }];

        let length = self.path.expected_distance.min(MAX_TICK_LENGTH);
        let tick_distance = (scoring_distance / timing.tick_rate * timing.tick_distance_multiplier)
            .clamp(0.0, length);
        let ticks_enabled = tick_distance > 0.0 && timing.generate_ticks;
        let min_distance_from_end = self.velocity * TICK_END_MARGIN_MS;
        let mut tick_budget = MAX_TICKS_PER_SLIDER;

        for span in 0..self.repeat_count {
            let span_start_time = self.start_time + span as f64 * self.span_duration;
            let reversed = span % 2 == 1;

            if ticks_enabled {
                let mut ticks = Vec::new();
                let mut d = tick_distance;
                while d <= length && tick_budget > 0 {
                    if d >= length - min_distance_from_end {
                        break;
                    }

                    // Tick positions are measured from the path start so repeat spans mirror them
                    let distance_progress = d / length;
                    let time_progress = if reversed {
                        1.0 - distance_progress
                    } else {
                        distance_progress
                    };
                    ticks.push(SliderNestedObject {
                        kind: NestedKind::Tick,
                        start_time: span_start_time + time_progress * self.span_duration,
                        position: self.position + self.path.position_at(distance_progress),
                        span_index: span,
                        span_start_time,
                    });

                    tick_budget -= 1;
                    d += tick_distance;
                }
                if tick_budget == 0 {
                    log::debug!(
                        "Slider at {} hit the tick limit of {MAX_TICKS_PER_SLIDER}",
                        self.start_time
                    );
                }

                if reversed {
                    ticks.reverse();
                }
                nested.extend(ticks);
            }

            if span < self.repeat_count - 1 {
                nested.push(SliderNestedObject {
                    kind: NestedKind::Repeat,
                    start_time: span_start_time + self.span_duration,
                    position: self.position + self.path.position_at(((span + 1) % 2) as f64),
                    span_index: span,
                    span_start_time,
                });
            }
        }

        let final_span = self.repeat_count - 1;
        let final_span_start_time = self.start_time + final_span as f64 * self.span_duration;
        let tail_time = (self.start_time + self.duration() / 2.0)
            .max(final_span_start_time + self.span_duration - LEGACY_LAST_TICK_OFFSET);
        nested.push(SliderNestedObject {
            kind: NestedKind::Tail,
            start_time: tail_time,
            position: self.end_position,
            span_index: final_span,
            span_start_time: final_span_start_time,
        });

        nested.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        self.nested_objects = nested;
    }
}
