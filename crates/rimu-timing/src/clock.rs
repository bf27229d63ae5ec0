//! Frame clock kept in step with an audio stream.
//!
//! Rendering and audio decoding tick on independent clocks. Each frame the
//! clock compares its own position against the audio position and nudges its
//! rate so the two converge without visible jumps. A gap larger than the seek
//! threshold means the track was seeked; the clock then runs at a fixed fast
//! rate toward the audio position until it is close again.

use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use rimu_config::ClockConfig;

use crate::audio::{AudioSource, AudioState};
use crate::observer::ClockObserver;

/// State of one clock step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockFrame {
    pub elapsed_ms: f64,
    /// Signed advance this frame, rate applied
    pub delta_ms: f64,
    pub rate: f32,
    /// Clock minus audio position in seconds, measured before this step
    pub time_difference: f64,
    pub is_seeking: bool,
}

/// Audio-synced playback clock.
///
/// Driven once per frame from the render thread via [`PlaybackClock::on_frame`].
pub struct PlaybackClock {
    config: ClockConfig,
    elapsed_ms: f64,
    rate: f32,
    is_seeking: bool,
    observers: Vec<Rc<RefCell<dyn ClockObserver>>>,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new(ClockConfig::default())
    }
}

impl PlaybackClock {
    pub fn new(config: ClockConfig) -> Self {
        Self {
            config,
            elapsed_ms: 0.0,
            rate: 1.0,
            is_seeking: false,
            observers: Vec::new(),
        }
    }

    pub fn config(&self) -> &ClockConfig {
        &self.config
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn is_seeking(&self) -> bool {
        self.is_seeking
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn add_observer(&mut self, observer: Rc<RefCell<dyn ClockObserver>>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    /// Back to the start: zero elapsed time, unit rate, not seeking.
    /// Observers stay registered.
    pub fn reset(&mut self) {
        debug!("Playback clock reset");
        self.elapsed_ms = 0.0;
        self.rate = 1.0;
        self.is_seeking = false;
    }

    /// Advance by one rendered frame of `frame_delta_secs` seconds.
    ///
    /// Returns `None` and leaves the clock untouched unless `audio` is playing.
    pub fn on_frame<A: AudioSource + ?Sized>(
        &mut self,
        audio: &A,
        frame_delta_secs: f64,
    ) -> Option<ClockFrame> {
        if audio.state() != AudioState::Playing {
            return None;
        }

        let audio_secs = audio.position() / 1000.0;
        let time_difference = self.elapsed_ms / 1000.0 + frame_delta_secs - audio_secs;
        self.update_seeking(time_difference);

        self.rate = if self.is_seeking {
            self.config.seek_rate
        } else {
            let correction = -time_difference * self.config.drift_correction_gain;
            (audio.speed() as f64 + correction).max(0.0) as f32
        };

        let mut delta_secs = frame_delta_secs * self.rate as f64;
        // Clock is ahead of the audio: run backwards to meet it
        if self.is_seeking && time_difference > 0.0 {
            delta_secs = -delta_secs;
        }

        let delta_ms = delta_secs * 1000.0;
        self.elapsed_ms += delta_ms;
        self.notify(delta_ms);

        Some(ClockFrame {
            elapsed_ms: self.elapsed_ms,
            delta_ms,
            rate: self.rate,
            time_difference,
            is_seeking: self.is_seeking,
        })
    }

    fn update_seeking(&mut self, time_difference: f64) {
        let threshold = self.config.seek_threshold;
        if !self.is_seeking {
            if time_difference.abs() > threshold + self.config.expected_frame_time {
                self.is_seeking = true;
                debug!("Seek detected, clock is {time_difference:.3}s off the audio");
            }
        } else if (0.0..threshold).contains(&time_difference) {
            self.is_seeking = false;
            debug!("Seek finished, clock is {time_difference:.3}s off the audio");
        }
    }

    fn notify(&self, delta_ms: f64) {
        for observer in &self.observers {
            match observer.try_borrow_mut() {
                Ok(mut observer) => observer.on_clock_update(self.elapsed_ms, delta_ms),
                Err(_) => warn!("Clock observer is already borrowed, skipping this frame"),
            }
        }
    }
}
