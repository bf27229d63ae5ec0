use serde::{Deserialize, Serialize};

/// Countdown shown before the first hit object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Countdown {
    None,
    #[default]
    Normal,
    Half,
    Double,
}

impl Countdown {
    /// Accepts both the numeric (`0`-`3`) and named forms
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "0" | "None" => Some(Self::None),
            "1" | "Normal" => Some(Self::Normal),
            "2" | "Half" => Some(Self::Half),
            "3" | "Double" => Some(Self::Double),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleBank {
    #[default]
    Normal,
    Soft,
    Drum,
}

impl SampleBank {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "1" | "Normal" => Some(Self::Normal),
            "2" | "Soft" => Some(Self::Soft),
            "3" | "Drum" => Some(Self::Drum),
            _ => None,
        }
    }
}

/// `[General]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct General {
    pub audio_filename: String,
    /// Milliseconds of silence before the audio starts
    pub audio_lead_in: i32,
    /// Song-select preview start, offset-adjusted. -1 when unset.
    pub preview_time: i32,
    pub countdown: Countdown,
    pub sample_bank: SampleBank,
    pub sample_volume: i32,
    pub stack_leniency: f32,
    pub letterbox_in_breaks: bool,
    /// 0 is osu!standard, the only mode this crate decodes
    pub mode: i32,
}

impl Default for General {
    fn default() -> Self {
        Self {
            audio_filename: String::new(),
            audio_lead_in: 0,
            preview_time: -1,
            countdown: Countdown::Normal,
            sample_bank: SampleBank::Normal,
            sample_volume: 100,
            stack_leniency: 0.7,
            letterbox_in_breaks: false,
            mode: 0,
        }
    }
}

/// `[Metadata]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub title_unicode: String,
    pub artist: String,
    pub artist_unicode: String,
    pub creator: String,
    pub version: String,
    pub source: String,
    pub tags: String,
    pub beatmap_id: i32,
    pub beatmap_set_id: i32,
}

impl Metadata {
    /// Unicode title when present, romanised title otherwise
    pub fn display_title(&self) -> &str {
        if self.title_unicode.is_empty() {
            &self.title
        } else {
            &self.title_unicode
        }
    }

    pub fn display_artist(&self) -> &str {
        if self.artist_unicode.is_empty() {
            &self.artist
        } else {
            &self.artist_unicode
        }
    }
}

/// `[Difficulty]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    pub cs: f32,
    pub od: f32,
    pub hp: f32,
    /// `None` until an `ApproachRate` key is seen; [`Difficulty::ar`] then falls back to OD
    pub approach_rate: Option<f32>,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            cs: 5.0,
            od: 5.0,
            hp: 5.0,
            approach_rate: None,
            slider_multiplier: 1.0,
            slider_tick_rate: 1.0,
        }
    }
}

impl Difficulty {
    pub const SLIDER_MULTIPLIER_RANGE: (f64, f64) = (0.4, 3.6);
    pub const SLIDER_TICK_RATE_RANGE: (f64, f64) = (0.5, 8.0);

    /// Approach rate; charts predating the key use OD
    pub fn ar(&self) -> f32 {
        self.approach_rate.unwrap_or(self.od)
    }

    /// Time in milliseconds an object is visible before its hit time (preempt)
    pub fn approach_time_ms(&self) -> f64 {
        let ar = self.ar() as f64;
        if ar < 5.0 {
            1200.0 + 600.0 * (5.0 - ar) / 5.0
        } else if ar > 5.0 {
            1200.0 - 750.0 * (ar - 5.0) / 5.0
        } else {
            1200.0
        }
    }

    /// osu!standard object scale for this circle size
    pub fn scale(&self) -> f32 {
        (1.0 - 0.7 * (self.cs - 5.0) / 5.0) / 2.0
    }
}

/// A break period in milliseconds, offset-adjusted
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreakPeriod {
    pub start_time: f64,
    pub end_time: f64,
}

impl BreakPeriod {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start_time && time <= self.end_time
    }
}

/// RGBA colour with 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }
}

/// `[Events]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Events {
    pub background_filename: Option<String>,
    pub video_filename: Option<String>,
    pub video_start_time: i32,
    pub breaks: Vec<BreakPeriod>,
    pub background_colour: Option<Rgba>,
}

impl Events {
    pub fn is_in_break(&self, time: f64) -> bool {
        self.breaks.iter().any(|b| b.contains(time))
    }
}

/// `ComboN` entry from `[Colours]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboColour {
    pub index: i32,
    pub colour: Rgba,
}

/// `[Colours]` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Colours {
    /// Sorted by `index`
    pub combo_colours: Vec<ComboColour>,
    pub slider_border: Option<Rgba>,
}

impl Colours {
    /// Insert keeping `combo_colours` ordered by index; equal indices keep insertion order.
    pub fn add_combo_colour(&mut self, colour: ComboColour) {
        let at = self
            .combo_colours
            .partition_point(|c| c.index <= colour.index);
        self.combo_colours.insert(at, colour);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ar_falls_back_to_od() {
        let mut d = Difficulty {
            od: 8.0,
            ..Default::default()
        };
        assert_eq!(d.ar(), 8.0);
        d.approach_rate = Some(9.0);
        assert_eq!(d.ar(), 9.0);
    }

    #[test]
    fn test_approach_time() {
        let mut d = Difficulty::default();
        assert_eq!(d.approach_time_ms(), 1200.0);
        d.approach_rate = Some(0.0);
        assert_eq!(d.approach_time_ms(), 1800.0);
        d.approach_rate = Some(10.0);
        assert_eq!(d.approach_time_ms(), 450.0);
    }

    #[test]
    fn test_scale() {
        let mut d = Difficulty::default();
        assert_eq!(d.scale(), 0.5);
        d.cs = 4.0;
        assert!((d.scale() - 0.57).abs() < 1e-6);
    }

    #[test]
    fn test_combo_colours_sorted() {
        let mut c = Colours::default();
        c.add_combo_colour(ComboColour {
            index: 3,
            colour: Rgba::opaque(3, 3, 3),
        });
        c.add_combo_colour(ComboColour {
            index: 1,
            colour: Rgba::opaque(1, 1, 1),
        });
        c.add_combo_colour(ComboColour {
            index: 2,
            colour: Rgba::opaque(2, 2, 2),
        });
        let indices: Vec<i32> = c.combo_colours.iter().map(|c| c.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[test]
    fn test_countdown_parse() {
        assert_eq!(Countdown::parse("0"), Some(Countdown::None));
        assert_eq!(Countdown::parse("Double"), Some(Countdown::Double));
        assert_eq!(Countdown::parse("7"), None);
    }
}
