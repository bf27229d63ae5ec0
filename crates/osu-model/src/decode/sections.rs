//! Decoders for the sections that never fail a chart.
//!
//! A line these cannot use is reported back as a [`SkipLine`] and dropped.

use thiserror::Error;

use crate::beatmap::BeatmapData;
use crate::sections::{BreakPeriod, ComboColour, Countdown, Difficulty, Rgba, SampleBank};

use super::values::{InvalidValue, parse_double, parse_float, parse_int, split_property};

#[derive(Debug, Error)]
pub(crate) enum SkipLine {
    #[error("not a key:value pair")]
    NotAProperty,
    #[error(transparent)]
    Value(#[from] InvalidValue),
    #[error("unknown value {0:?}")]
    UnknownValue(String),
    #[error("colour needs 3 or 4 components, found {0}")]
    ColourComponents(usize),
}

type LineResult = Result<(), SkipLine>;

fn property(line: &str) -> Result<(&str, &str), SkipLine> {
    split_property(line).ok_or(SkipLine::NotAProperty)
}

pub(crate) fn general(data: &mut BeatmapData, line: &str) -> LineResult {
    let (key, value) = property(line)?;
    let general = &mut data.general;
    match key {
        "AudioFilename" => general.audio_filename = value.to_string(),
        "AudioLeadIn" => general.audio_lead_in = parse_int(value)?,
        "PreviewTime" => {
            let time = data.offset_time_int(parse_int(value)?);
            data.general.preview_time = time;
        }
        "Countdown" => {
            general.countdown =
                Countdown::parse(value).ok_or_else(|| SkipLine::UnknownValue(value.to_string()))?
        }
        "SampleSet" => {
            general.sample_bank = SampleBank::parse(value)
                .ok_or_else(|| SkipLine::UnknownValue(value.to_string()))?
        }
        "SampleVolume" => general.sample_volume = parse_int(value)?,
        "StackLeniency" => general.stack_leniency = parse_float(value)?,
        "LetterboxInBreaks" => general.letterbox_in_breaks = value == "1",
        "Mode" => general.mode = parse_int(value)?,
        _ => {}
    }
    Ok(())
}

pub(crate) fn metadata(data: &mut BeatmapData, line: &str) -> LineResult {
    let (key, value) = property(line)?;
    let metadata = &mut data.metadata;
    match key {
        "Title" => metadata.title = value.to_string(),
        "TitleUnicode" => metadata.title_unicode = value.to_string(),
        "Artist" => metadata.artist = value.to_string(),
        "ArtistUnicode" => metadata.artist_unicode = value.to_string(),
        "Creator" => metadata.creator = value.to_string(),
        "Version" => metadata.version = value.to_string(),
        "Source" => metadata.source = value.to_string(),
        "Tags" => metadata.tags = value.to_string(),
        "BeatmapID" => metadata.beatmap_id = parse_int(value)?,
        "BeatmapSetID" => metadata.beatmap_set_id = parse_int(value)?,
        _ => {}
    }
    Ok(())
}

pub(crate) fn difficulty(data: &mut BeatmapData, line: &str) -> LineResult {
    let (key, value) = property(line)?;
    let difficulty = &mut data.difficulty;
    match key {
        "CircleSize" => difficulty.cs = parse_float(value)?,
        "OverallDifficulty" => difficulty.od = parse_float(value)?,
        "ApproachRate" => difficulty.approach_rate = Some(parse_float(value)?),
        "HPDrainRate" => difficulty.hp = parse_float(value)?,
        "SliderMultiplier" => {
            let (min, max) = Difficulty::SLIDER_MULTIPLIER_RANGE;
            difficulty.slider_multiplier = parse_double(value, false)?.clamp(min, max);
        }
        "SliderTickRate" => {
            let (min, max) = Difficulty::SLIDER_TICK_RATE_RANGE;
            difficulty.slider_tick_rate = parse_double(value, false)?.clamp(min, max);
        }
        _ => {}
    }
    Ok(())
}

/// `[Events]` lines are positional CSV keyed by the first field.
pub(crate) fn events(data: &mut BeatmapData, line: &str) -> LineResult {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let Some(&kind) = fields.first() else {
        return Ok(());
    };

    if fields.len() >= 3 {
        match kind {
            "0" if fields[1] == "0" => {
                data.events.background_filename = Some(unquote(fields[2]).to_string());
            }
            "1" | "Video" => {
                data.events.video_start_time = parse_int(fields[1])?;
                data.events.video_filename = Some(unquote(fields[2]).to_string());
            }
            "2" | "Break" => {
                let start = data.offset_time(parse_int(fields[1])? as f64);
                let end = data.offset_time(parse_int(fields[2])? as f64).max(start);
                data.events.breaks.push(BreakPeriod {
                    start_time: start,
                    end_time: end,
                });
            }
            _ => {}
        }
    }

    if fields.len() >= 5 && kind == "3" {
        data.events.background_colour = Some(Rgba::opaque(
            channel(fields[2])?,
            channel(fields[3])?,
            channel(fields[4])?,
        ));
    }
    Ok(())
}

pub(crate) fn colours(data: &mut BeatmapData, line: &str) -> LineResult {
    let (key, value) = property(line)?;
    let mut components: Vec<&str> = value.split(',').collect();
    while components.last().is_some_and(|c| c.trim().is_empty()) {
        components.pop();
    }
    if components.len() != 3 && components.len() != 4 {
        return Err(SkipLine::ColourComponents(components.len()));
    }

    let alpha = match components.get(3) {
        Some(a) => channel(a)?,
        None => 255,
    };
    let colour = Rgba::new(
        channel(components[0])?,
        channel(components[1])?,
        channel(components[2])?,
        alpha,
    );

    if let Some(index) = key.strip_prefix("Combo") {
        let colours = &mut data.colours;
        let index = index
            .parse()
            .unwrap_or(colours.combo_colours.len() as i32 + 1);
        colours.add_combo_colour(ComboColour { index, colour });
    } else if key.starts_with("SliderBorder") {
        data.colours.slider_border = Some(colour);
    }
    Ok(())
}

fn channel(text: &str) -> Result<u8, SkipLine> {
    Ok(parse_int(text)?.clamp(0, 255) as u8)
}

fn unquote(text: &str) -> &str {
    text.trim_matches('"')
}
