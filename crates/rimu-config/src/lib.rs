// Configuration records (logging, decoding, playback clock)

pub mod clock_config;
pub mod config;

pub use clock_config::ClockConfig;
pub use config::{Config, DecodeConfig};
