use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use log::info;
use osu_model::{BeatmapData, DifficultyControlPoint, TimingControlPoint};
use rimu_config::ClockConfig;
use rimu_timing::{AudioSource, ClockFrame, ControlPointCursor, PlaybackClock, SimulatedAudio};

#[derive(Debug, Clone)]
pub struct SimulateOptions {
    pub seconds: f64,
    pub fps: f64,
    pub speed: f32,
    /// Audio position in seconds at which the track is seeked once
    pub seek_at: Option<f64>,
    pub seek_by: f64,
}

/// Clock and cursor state at the end of a simulated run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    pub frames: usize,
    pub seeks: usize,
    pub last_frame: Option<ClockFrame>,
    pub audio_ms: f64,
    pub timing_changes: usize,
    pub difficulty_changes: usize,
    pub timing: TimingControlPoint,
    pub difficulty: DifficultyControlPoint,
}

/// Drive a [`PlaybackClock`] over `data` at a fixed frame rate with timing and
/// difficulty cursors attached.
pub fn run(data: &BeatmapData, clock_config: ClockConfig, options: &SimulateOptions) -> SimulationReport {
    let timing = Arc::new(data.control_points.timing.clone());
    let difficulty = Arc::new(data.control_points.difficulty.clone());

    let timing_cursor = Rc::new(RefCell::new(ControlPointCursor::new(timing).with_callback(
        |p: &TimingControlPoint| {
            info!(
                "Timing point at {:.0}ms: {:.1} BPM, {}/4",
                p.time,
                p.bpm(),
                p.meter
            );
        },
    )));
    let difficulty_cursor = Rc::new(RefCell::new(
        ControlPointCursor::new(difficulty).with_callback(|p: &DifficultyControlPoint| {
            info!(
                "Difficulty point at {:.0}ms: x{:.2} scroll speed{}",
                p.time,
                p.speed_multiplier,
                if p.generate_ticks { "" } else { ", no ticks" }
            );
        }),
    ));

    let mut clock = PlaybackClock::new(clock_config);
    clock.add_observer(timing_cursor.clone());
    clock.add_observer(difficulty_cursor.clone());

    let mut audio = SimulatedAudio::new();
    audio.set_speed(options.speed);
    audio.play();

    let frame_secs = 1.0 / options.fps;
    let frames = (options.seconds * options.fps).ceil() as usize;
    let mut seek_pending = options.seek_at.map(|s| s * 1000.0);
    let mut seeks = 0;
    let mut was_seeking = false;
    let mut last_frame = None;

    for _ in 0..frames {
        if let Some(at) = seek_pending
            && audio.position() >= at
        {
            let target = audio.position() + options.seek_by * 1000.0;
            info!("Seeking audio from {:.0}ms to {:.0}ms", audio.position(), target);
            audio.seek(target);
            seek_pending = None;
        }

        audio.advance(frame_secs);
        let Some(frame) = clock.on_frame(&audio, frame_secs) else {
            continue;
        };

        if frame.is_seeking && !was_seeking {
            seeks += 1;
            info!(
                "Clock seeking at {:.0}ms, {:.3}s off the audio",
                frame.elapsed_ms, frame.time_difference
            );
        } else if !frame.is_seeking && was_seeking {
            info!("Clock back in sync at {:.0}ms", frame.elapsed_ms);
        }
        was_seeking = frame.is_seeking;
        last_frame = Some(frame);
    }

    let timing_cursor = timing_cursor.borrow();
    let difficulty_cursor = difficulty_cursor.borrow();
    SimulationReport {
        frames,
        seeks,
        last_frame,
        audio_ms: audio.position(),
        timing_changes: timing_cursor.changes(),
        difficulty_changes: difficulty_cursor.changes(),
        timing: timing_cursor.current().clone(),
        difficulty: difficulty_cursor.current().clone(),
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Frames: {}", self.frames)?;
        match &self.last_frame {
            Some(frame) => {
                writeln!(
                    f,
                    "Clock: {:.1}ms, audio: {:.1}ms, rate {:.3}x{}",
                    frame.elapsed_ms,
                    self.audio_ms,
                    frame.rate,
                    if frame.is_seeking { " (seeking)" } else { "" }
                )?;
            }
            None => writeln!(f, "Clock: not started")?,
        }
        writeln!(f, "Seeks: {}", self.seeks)?;
        writeln!(
            f,
            "Timing: {:.1} BPM ({} changes)",
            self.timing.bpm(),
            self.timing_changes
        )?;
        writeln!(
            f,
            "Scroll speed: x{:.2} ({} changes)",
            self.difficulty.speed_multiplier, self.difficulty_changes
        )
    }
}

#[cfg(test)]
mod tests {
    use osu_model::BeatmapDecoder;

    use super::*;

    const CHART: &str = "\
osu file format v14
[TimingPoints]
0,500,4,2,0,60,1,0
2000,-50,4,2,0,60,0,0
4000,400,3,2,0,60,1,0
";

    fn options() -> SimulateOptions {
        SimulateOptions {
            seconds: 6.0,
            fps: 60.0,
            speed: 1.0,
            seek_at: None,
            seek_by: 3.0,
        }
    }

    #[test]
    fn test_plain_run() {
        let data = BeatmapDecoder::new().decode_str(CHART).unwrap();
        let report = run(&data, ClockConfig::default(), &options());

        assert_eq!(report.frames, 360);
        assert_eq!(report.seeks, 0);
        let frame = report.last_frame.unwrap();
        assert!(!frame.is_seeking);
        assert!((frame.elapsed_ms - report.audio_ms).abs() < 1.0);
        assert_eq!(report.timing_changes, 1);
        assert_eq!(report.difficulty_changes, 2);
        assert_eq!(report.timing.meter, 3);
        assert_eq!(report.difficulty.speed_multiplier, 1.0);
    }

    #[test]
    fn test_run_with_seek() {
        let data = BeatmapDecoder::new().decode_str(CHART).unwrap();
        let report = run(
            &data,
            ClockConfig::default(),
            &SimulateOptions {
                seek_at: Some(1.0),
                ..options()
            },
        );

        assert_eq!(report.seeks, 1);
        let frame = report.last_frame.unwrap();
        assert!(!frame.is_seeking);
        assert!(report.audio_ms > 8000.0);
        assert!((frame.elapsed_ms - report.audio_ms).abs() < 1.0);
        assert_eq!(report.timing.meter, 3);
    }

    #[test]
    fn test_zero_seconds() {
        let data = BeatmapDecoder::new().decode_str(CHART).unwrap();
        let report = run(
            &data,
            ClockConfig::default(),
            &SimulateOptions {
                seconds: 0.0,
                ..options()
            },
        );
        assert_eq!(report.frames, 0);
        assert!(report.last_frame.is_none());
        assert!(report.to_string().contains("Clock: not started"));
    }
}
