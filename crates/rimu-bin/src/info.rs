use std::fmt::Write;

use osu_model::BeatmapData;

/// Human-readable chart summary, one fact per line.
pub fn summary(data: &BeatmapData) -> String {
    let mut out = String::new();
    let meta = &data.metadata;
    let _ = writeln!(
        out,
        "{} - {} [{}] (mapped by {})",
        meta.display_artist(),
        meta.display_title(),
        meta.version,
        meta.creator
    );
    let _ = writeln!(out, "Format: v{}", data.format_version);
    let _ = writeln!(
        out,
        "Audio: {} (preview at {}ms)",
        data.general.audio_filename, data.general.preview_time
    );

    let difficulty = &data.difficulty;
    let _ = writeln!(
        out,
        "Difficulty: CS {} AR {} OD {} HP {}",
        difficulty.cs,
        difficulty.ar(),
        difficulty.od,
        difficulty.hp
    );

    let points = &data.control_points;
    let _ = writeln!(
        out,
        "Control points: {} timing, {} difficulty",
        points.timing.len(),
        points.difficulty.len()
    );
    match data.bpm_range() {
        Some((min, max)) if (max - min).abs() < 1e-6 => {
            let _ = writeln!(out, "BPM: {min:.0}");
        }
        Some((min, max)) => {
            let _ = writeln!(out, "BPM: {min:.0}-{max:.0}");
        }
        None => {
            let _ = writeln!(out, "BPM: unknown");
        }
    }

    match &data.hit_objects {
        Some(objects) => {
            let circles = objects.iter().filter(|o| o.is_circle()).count();
            let sliders = objects.iter().filter(|o| o.is_slider()).count();
            let spinners = objects.iter().filter(|o| o.is_spinner()).count();
            let stacked = objects.iter().filter(|o| o.stack_height != 0).count();
            let _ = writeln!(
                out,
                "Objects: {} ({circles} circles, {sliders} sliders, {spinners} spinners)",
                objects.len()
            );
            let _ = writeln!(out, "Stacked objects: {stacked}");
            if let Some(max_combo) = data.max_combo() {
                let _ = writeln!(out, "Max combo: {max_combo}");
            }
            if let Some((start, end)) = data.play_range() {
                let _ = writeln!(out, "Play range: {start:.0}ms to {end:.0}ms");
            }
        }
        None => {
            let _ = writeln!(out, "Objects: not decoded");
        }
    }

    let _ = writeln!(out, "MD5: {}", data.md5);
    out
}
