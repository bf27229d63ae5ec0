use std::str::FromStr;

use thiserror::Error;

use crate::error::{ControlPointFault, HitObjectFault};

/// Numbers in a chart must stay within ±i32::MAX
const PARSE_LIMIT: f64 = i32::MAX as f64;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid number {0:?}")]
pub(crate) struct InvalidValue(pub String);

impl From<InvalidValue> for ControlPointFault {
    fn from(e: InvalidValue) -> Self {
        Self::InvalidNumber(e.0)
    }
}

impl From<InvalidValue> for HitObjectFault {
    fn from(e: InvalidValue) -> Self {
        Self::InvalidNumber(e.0)
    }
}

pub(crate) fn parse_int(text: &str) -> Result<i32, InvalidValue> {
    let text = text.trim();
    // i32 parsing already rejects anything beyond the limit except i32::MIN
    match text.parse::<i32>() {
        Ok(v) if v != i32::MIN => Ok(v),
        _ => Err(InvalidValue(text.to_string())),
    }
}

pub(crate) fn parse_double(text: &str, allow_nan: bool) -> Result<f64, InvalidValue> {
    parse_bounded(text, allow_nan)
}

pub(crate) fn parse_float(text: &str) -> Result<f32, InvalidValue> {
    parse_bounded::<f32>(text, false)
}

fn parse_bounded<T>(text: &str, allow_nan: bool) -> Result<T, InvalidValue>
where
    T: FromStr + Copy + Into<f64>,
{
    let text = text.trim();
    let value: T = text
        .parse()
        .map_err(|_| InvalidValue(text.to_string()))?;
    let wide: f64 = value.into();
    if wide.is_nan() {
        return if allow_nan {
            Ok(value)
        } else {
            Err(InvalidValue(text.to_string()))
        };
    }
    if !(-PARSE_LIMIT..=PARSE_LIMIT).contains(&wide) {
        return Err(InvalidValue(text.to_string()));
    }
    Ok(value)
}

/// Split `Key: Value` at the first colon, trimming both halves.
pub(crate) fn split_property(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Comma-separated fields with trailing empty fields dropped.
pub(crate) fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(',').collect();
    while fields.last().is_some_and(|f| f.is_empty()) {
        fields.pop();
    }
    fields
}
