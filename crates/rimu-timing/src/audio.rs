/// Playback state reported by an audio stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioState {
    Playing,
    #[default]
    Paused,
    Stopped,
}

/// Abstraction over the audio stream the clock follows.
/// Implementations: the platform audio backend, [`SimulatedAudio`] (testing).
///
/// Every query must be cheap and non-blocking; the clock calls them each frame.
pub trait AudioSource {
    /// Playback position in milliseconds, monotonic while playing.
    fn position(&self) -> f64;
    /// Playback rate multiplier (tempo).
    fn speed(&self) -> f32;
    fn state(&self) -> AudioState;
}

/// Audio stream that advances only when told to, for deterministic runs.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedAudio {
    position_ms: f64,
    speed: f32,
    state: AudioState,
}

impl SimulatedAudio {
    pub fn new() -> Self {
        Self {
            position_ms: 0.0,
            speed: 1.0,
            state: AudioState::Paused,
        }
    }

    pub fn play(&mut self) {
        self.state = AudioState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = AudioState::Paused;
    }

    /// Stop and rewind to the start.
    pub fn stop(&mut self) {
        self.state = AudioState::Stopped;
        self.position_ms = 0.0;
    }

    pub fn set_state(&mut self, state: AudioState) {
        self.state = state;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    /// Jump to `position_ms`, clamped at zero.
    pub fn seek(&mut self, position_ms: f64) {
        self.position_ms = position_ms.max(0.0);
    }

    /// Play `frame_secs` of wall time at the current speed. No effect unless playing.
    pub fn advance(&mut self, frame_secs: f64) {
        if self.state == AudioState::Playing {
            self.position_ms += frame_secs * self.speed as f64 * 1000.0;
        }
    }
}

impl Default for SimulatedAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for SimulatedAudio {
    fn position(&self) -> f64 {
        self.position_ms
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn state(&self) -> AudioState {
        self.state
    }
}
