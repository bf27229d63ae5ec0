use crate::beatmap::BeatmapData;
use crate::error::HitObjectFault;
use crate::hit_object::{HitObject, HitObjectType, Slider, SliderTiming};
use crate::math::Vector2;
use crate::slider_path::{PathType, SliderPath};

use super::values::{parse_double, parse_float, parse_int, split_fields};

const MAX_REPEATS: i32 = 9000;

/// Decode one `[HitObjects]` line: `x,y,time,type,hitSound[,params...]`.
pub(crate) fn decode(data: &mut BeatmapData, line: &str) -> Result<(), HitObjectFault> {
    let fields = split_fields(line);
    require(&fields, 4)?;

    let position = Vector2::new(parse_float(fields[0])?, parse_float(fields[1])?);
    let time = data.offset_time(parse_double(fields[2], false)?);
    let raw_type = parse_int(fields[3])?;
    let object_type = HitObjectType::from_bits_retain(raw_type);
    let new_combo = object_type.contains(HitObjectType::NEW_COMBO);

    // Types without a circle, slider or spinner bit are rejected rather than read as spinners
    let object = if object_type.contains(HitObjectType::CIRCLE) {
        HitObject::circle(time, position, new_combo)
    } else if object_type.contains(HitObjectType::SLIDER) {
        HitObject::slider(decode_slider(data, time, position, &fields)?, new_combo)
    } else if object_type.contains(HitObjectType::SPINNER) {
        require(&fields, 6)?;
        let end_time = data.offset_time(parse_double(fields[5], false)?);
        HitObject::spinner(time, end_time, new_combo)
    } else {
        return Err(HitObjectFault::UnknownType(raw_type));
    };

    data.raw_hit_objects.push(line.to_string());
    data.hit_objects.get_or_insert_with(Vec::new).push(object);
    Ok(())
}

fn require(fields: &[&str], expected: usize) -> Result<(), HitObjectFault> {
    if fields.len() < expected {
        return Err(HitObjectFault::TooFewFields {
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

/// Slider fields: `curve,repeats,length` at indices 5 to 7.
fn decode_slider(
    data: &BeatmapData,
    time: f64,
    position: Vector2,
    fields: &[&str],
) -> Result<Slider, HitObjectFault> {
    require(fields, 8)?;

    let repeats = parse_int(fields[6])?;
    if repeats > MAX_REPEATS {
        return Err(HitObjectFault::TooManyRepeats(repeats));
    }
    let length = parse_double(fields[7], false)?.max(0.0);

    let (mut path_type, control_points) = decode_curve(fields[5], position)?;
    if path_type == PathType::PerfectCurve {
        if control_points.len() != 3 {
            path_type = PathType::Bezier;
        } else if is_collinear(&control_points) {
            path_type = PathType::Linear;
        }
    }
    let path = SliderPath::new(path_type, control_points, length);

    let timing_point = data.control_points.timing.at_or_first(time);
    let difficulty_point = data.control_points.difficulty.at(time);
    let tick_distance_multiplier = if data.format_version < 8 {
        1.0 / difficulty_point.speed_multiplier
    } else {
        1.0
    };

    let timing = SliderTiming {
        beat_length: timing_point.beat_length,
        speed_multiplier: difficulty_point.speed_multiplier,
        generate_ticks: difficulty_point.generate_ticks,
        slider_multiplier: data.difficulty.slider_multiplier,
        tick_rate: data.difficulty.slider_tick_rate,
        tick_distance_multiplier,
    };
    Ok(Slider::new(time, position, repeats, path, &timing))
}

/// `T|x:y|x:y...` into a path type and control points relative to `origin`.
fn decode_curve(text: &str, origin: Vector2) -> Result<(PathType, Vec<Vector2>), HitObjectFault> {
    let mut tokens: Vec<&str> = text.split('|').collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    let path_type = tokens
        .first()
        .and_then(|t| t.chars().next())
        .map(PathType::from_char)
        .ok_or(HitObjectFault::EmptyCurve)?;

    let mut points = vec![Vector2::ZERO];
    for token in &tokens[1..] {
        let (x, y) = token
            .split_once(':')
            .ok_or_else(|| HitObjectFault::InvalidNumber(token.to_string()))?;
        let point = Vector2::new(parse_float(x)?, parse_float(y)?);
        points.push(point - origin);
    }

    // Old charts repeat the head position as the first curve point
    if points.len() >= 2 && points[0] == points[1] {
        points.remove(0);
    }
    Ok((path_type, points))
}

fn is_collinear(points: &[Vector2]) -> bool {
    let [a, b, c] = points else {
        return false;
    };
    let cross = (b.y - a.y) * (c.x - a.x) - (b.x - a.x) * (c.y - a.y);
    cross.abs() < 1e-3
}
