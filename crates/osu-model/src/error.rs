use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("not an osu! beatmap: missing or malformed format header")]
    Format,
    #[error("unsupported game mode {0}")]
    UnsupportedMode(i32),
    #[error("malformed timing point {line:?}: {fault}")]
    MalformedControlPoint {
        line: String,
        fault: ControlPointFault,
    },
    #[error("malformed hit object {line:?}: {fault}")]
    MalformedHitObject { line: String, fault: HitObjectFault },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a `[TimingPoints]` line was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlPointFault {
    #[error("expected at least 2 fields, found {0}")]
    TooFewFields(usize),
    #[error("uninherited timing point with NaN beat length")]
    NanBeatLength,
    #[error("meter must be at least 1, found {0}")]
    InvalidMeter(i32),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
}

/// Why a `[HitObjects]` line was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HitObjectFault {
    #[error("expected at least {expected} fields, found {found}")]
    TooFewFields { expected: usize, found: usize },
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("unknown hit object type {0}")]
    UnknownType(i32),
    #[error("repeat count {0} exceeds 9000")]
    TooManyRepeats(i32),
    #[error("slider has no control points")]
    EmptyCurve,
}
