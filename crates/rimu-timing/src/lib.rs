// Playback timing: audio-synced clock, clock observers and control point cursors.

pub mod audio;
pub mod clock;
pub mod cursor;
pub mod observer;

pub use audio::{AudioSource, AudioState, SimulatedAudio};
pub use clock::{ClockFrame, PlaybackClock};
pub use cursor::ControlPointCursor;
pub use observer::ClockObserver;
