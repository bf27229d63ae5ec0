// osu! chart data model: decoder, control points, hit objects, stacking

mod beatmap;
mod control_point;
mod decode;
mod error;
mod hit_object;
mod math;
mod sections;
mod slider_path;
mod stacking;

pub use beatmap::{BeatmapData, ControlPoints, DEFAULT_FORMAT_VERSION};
pub use control_point::{
    ControlPoint, ControlPointManager, DifficultyControlPoint, TimingControlPoint,
};
pub use decode::{BeatmapDecoder, Section};
pub use error::{ControlPointFault, DecodeError, HitObjectFault};
pub use hit_object::{
    HitObject, HitObjectKind, HitObjectType, NestedKind, OBJECT_RADIUS, Slider, SliderNestedObject,
    SliderTiming,
};
pub use math::Vector2;
pub use sections::{
    BreakPeriod, Colours, ComboColour, Countdown, Difficulty, Events, General, Metadata, Rgba,
    SampleBank,
};
pub use slider_path::{PathType, SliderPath};
pub use stacking::{STACK_DISTANCE, apply_stacking, reset_stacking};
