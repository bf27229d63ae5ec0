use crate::beatmap::BeatmapData;
use crate::control_point::{DifficultyControlPoint, TimingControlPoint};
use crate::error::ControlPointFault;

use super::values::{parse_double, parse_int, split_fields};

const DEFAULT_METER: i32 = 4;

/// Decode one `[TimingPoints]` line:
/// `time,beatLength[,meter[,sampleSet,sampleIndex,volume,uninherited[,effects]]]`.
///
/// Every valid line yields a difficulty point. Only uninherited lines yield a
/// timing point; a NaN beat length there is rejected, while on an inherited
/// line it disables tick generation.
pub(crate) fn decode(data: &mut BeatmapData, line: &str) -> Result<(), ControlPointFault> {
    let fields = split_fields(line);
    if fields.len() < 2 {
        return Err(ControlPointFault::TooFewFields(fields.len()));
    }

    let time = data.offset_time(parse_double(fields[0], false)?);
    let beat_length = parse_double(fields[1], true)?;

    let meter = match fields.get(2) {
        Some(text) => parse_int(text)?,
        None => DEFAULT_METER,
    };
    if meter < 1 {
        return Err(ControlPointFault::InvalidMeter(meter));
    }

    let uninherited = fields.get(6).is_none_or(|f| f.trim() == "1");

    if uninherited {
        if beat_length.is_nan() {
            return Err(ControlPointFault::NanBeatLength);
        }
        data.control_points
            .timing
            .add(TimingControlPoint::new(time, beat_length, meter));
    }

    // NaN compares false, so a NaN beat length keeps the 1.0 multiplier
    let speed_multiplier = if beat_length < 0.0 {
        100.0 / -beat_length
    } else {
        1.0
    };
    data.control_points.difficulty.add(DifficultyControlPoint::new(
        time,
        speed_multiplier,
        !beat_length.is_nan(),
    ));

    data.raw_timing_points.push(line.to_string());
    Ok(())
}
