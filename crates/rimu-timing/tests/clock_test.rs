use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use osu_model::{BeatmapDecoder, ControlPointManager, TimingControlPoint};
use proptest::prelude::*;
use rimu_config::ClockConfig;
use rimu_timing::{AudioSource, ControlPointCursor, PlaybackClock, SimulatedAudio};

const FRAME: f64 = 1.0 / 60.0;

fn playing_at(position_ms: f64, speed: f32) -> SimulatedAudio {
    let mut audio = SimulatedAudio::new();
    audio.set_speed(speed);
    audio.seek(position_ms);
    audio.play();
    audio
}

/// Run `frames` frames of `dt` seconds, audio first then clock.
fn run(clock: &mut PlaybackClock, audio: &mut SimulatedAudio, frames: usize, dt: f64) {
    for _ in 0..frames {
        audio.advance(dt);
        clock.on_frame(&*audio, dt);
    }
}

proptest! {
    #[test]
    fn prop_rate_converges_to_audio_speed(
        speed in 0.5f32..2.0,
        dt in (1.0f64 / 240.0)..(1.0 / 30.0),
    ) {
        let mut clock = PlaybackClock::default();
        let mut audio = playing_at(0.0, speed);

        for _ in 0..3000 {
            audio.advance(dt);
            let frame = clock.on_frame(&audio, dt).unwrap();
            prop_assert!(!frame.is_seeking);
            prop_assert!(frame.rate >= 0.0);
        }
        prop_assert!((clock.rate() - speed).abs() < 1e-3);
        // The clock trails the audio by at most one frame of tempo difference
        let lag_ms = (audio.position() - clock.elapsed_ms()).abs();
        prop_assert!(lag_ms <= dt * 1000.0 + 1e-3);
    }
}

#[test]
fn test_forward_jump_enters_seek_then_recovers() {
    let mut clock = PlaybackClock::default();
    let mut audio = playing_at(0.0, 1.0);
    run(&mut clock, &mut audio, 120, FRAME);
    assert!(!clock.is_seeking());

    audio.seek(audio.position() + 3000.0);
    audio.advance(FRAME);
    let frame = clock.on_frame(&audio, FRAME).unwrap();
    assert!(frame.is_seeking);
    assert_eq!(frame.rate, 6.0);
    assert!(frame.time_difference < -2.9);
    assert!(frame.delta_ms > 0.0);

    let mut frames = 1;
    while clock.is_seeking() {
        audio.advance(FRAME);
        let frame = clock.on_frame(&audio, FRAME).unwrap();
        if frame.is_seeking {
            assert_eq!(frame.rate, 6.0);
        } else {
            assert!((0.0..1.0).contains(&frame.time_difference));
        }
        frames += 1;
        assert!(frames < 200, "seek never finished");
    }

    // 3s closed at 5x net speed is about 36 frames
    assert!((30..45).contains(&frames));

    run(&mut clock, &mut audio, 600, FRAME);
    assert!(!clock.is_seeking());
    assert!((clock.rate() - 1.0).abs() < 1e-3);
    assert!((clock.elapsed_ms() - audio.position()).abs() < 1.0);
}

#[test]
fn test_paused_audio_freezes_clock() {
    let mut clock = PlaybackClock::default();
    let mut audio = playing_at(0.0, 1.0);
    run(&mut clock, &mut audio, 60, FRAME);
    let elapsed = clock.elapsed_ms();

    audio.pause();
    run(&mut clock, &mut audio, 60, FRAME);
    assert_eq!(clock.elapsed_ms(), elapsed);

    audio.play();
    run(&mut clock, &mut audio, 60, FRAME);
    assert!(clock.elapsed_ms() > elapsed);
    assert!(!clock.is_seeking());
}

#[test]
fn test_cursors_follow_clock() {
    let mut timing = ControlPointManager::default();
    timing.add(TimingControlPoint::new(0.0, 500.0, 4));
    timing.add(TimingControlPoint::new(1000.0, 400.0, 4));
    timing.add(TimingControlPoint::new(2000.0, 300.0, 3));
    let timing = Arc::new(timing);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let cursor = Rc::new(RefCell::new(
        ControlPointCursor::new(timing.clone()).with_callback(move |p: &TimingControlPoint| {
            sink.borrow_mut().push(p.time)
        }),
    ));

    let mut clock = PlaybackClock::new(ClockConfig::default());
    clock.add_observer(cursor.clone());

    let mut audio = playing_at(0.0, 1.0);
    run(&mut clock, &mut audio, 150, FRAME);
    assert_eq!(cursor.borrow().current().time, 2000.0);
    assert_eq!(*seen.borrow(), vec![1000.0, 2000.0]);

    // Seek back to the start: the clock rewinds and the cursor follows
    audio.seek(0.0);
    let mut frames = 0;
    loop {
        audio.advance(FRAME);
        clock.on_frame(&audio, FRAME);
        frames += 1;
        if !clock.is_seeking() || frames > 200 {
            break;
        }
    }
    assert_eq!(
        cursor.borrow().current(),
        timing.at(clock.elapsed_ms()),
        "cursor out of step at {}ms",
        clock.elapsed_ms()
    );
    assert_eq!(seen.borrow().first(), Some(&1000.0));
}

#[test]
fn test_cursor_over_decoded_chart() {
    let chart = "\
osu file format v14
[TimingPoints]
0,500,4,2,0,60,1,0
500,-50,4,2,0,60,0,0
1000,-200,4,2,0,60,0,0
";
    let data = BeatmapDecoder::new().decode_str(chart).unwrap();
    let difficulty = Arc::new(data.control_points.difficulty);
    let cursor = Rc::new(RefCell::new(ControlPointCursor::new(difficulty)));

    let mut clock = PlaybackClock::default();
    clock.add_observer(cursor.clone());
    let mut audio = playing_at(0.0, 1.0);

    run(&mut clock, &mut audio, 45, FRAME);
    assert_eq!(cursor.borrow().current().speed_multiplier, 2.0);
    run(&mut clock, &mut audio, 30, FRAME);
    assert_eq!(cursor.borrow().current().speed_multiplier, 0.5);
    assert_eq!(cursor.borrow().changes(), 2);
    assert!(audio.position() > 1000.0);
}
