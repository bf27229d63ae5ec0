//! Stack heights for overlapping hit objects.
//!
//! Objects that start close in time and within [`STACK_DISTANCE`] of each
//! other are drawn offset along the diagonal so each stays readable.

use crate::hit_object::HitObject;

/// Max distance in osu!pixels for two objects to count as overlapping
pub const STACK_DISTANCE: f32 = 3.0;

/// Zero every stack height so the next pass starts clean.
pub fn reset_stacking(objects: &mut [HitObject]) {
    for object in objects {
        object.stack_height = 0;
    }
}

/// Assign stack heights to `objects`, which must be sorted by start time.
///
/// `time_preempt` is the approach time in milliseconds; objects stack when
/// their gap is within `time_preempt * stack_leniency`. Charts before format
/// v6 use the legacy pass. Heights are reset first, so repeated calls agree.
pub fn apply_stacking(
    format_version: i32,
    objects: &mut [HitObject],
    time_preempt: f64,
    stack_leniency: f32,
) {
    reset_stacking(objects);
    if objects.is_empty() {
        return;
    }

    let threshold = time_preempt * stack_leniency as f64;
    if format_version >= 6 {
        apply(objects, threshold);
    } else {
        apply_legacy(objects, threshold);
    }
}

fn overlaps(a: &HitObject, b: &HitObject) -> bool {
    a.position.distance(b.position) < STACK_DISTANCE
}

fn end_overlaps(a: &HitObject, b: &HitObject) -> bool {
    a.end_position().distance(b.position) < STACK_DISTANCE
}

/// Walks backwards so each object is stacked onto the ones after it. An
/// object that already has a height was claimed by a later stack and is skipped.
fn apply(objects: &mut [HitObject], threshold: f64) {
    for i in (1..objects.len()).rev() {
        if objects[i].stack_height != 0 || objects[i].is_spinner() {
            continue;
        }

        let mut current = i;
        if objects[i].is_circle() {
            let mut n = i;
            while n > 0 {
                n -= 1;
                if objects[n].is_spinner() {
                    continue;
                }
                if objects[current].start_time - objects[n].end_time() > threshold {
                    break;
                }

                // Circles under the end of a slider stack downwards from it
                if objects[n].is_slider() && end_overlaps(&objects[n], &objects[current]) {
                    let offset = objects[current].stack_height - objects[n].stack_height + 1;
                    let slider_end = objects[n].end_position();
                    for object in &mut objects[n + 1..=i] {
                        if slider_end.distance(object.position) < STACK_DISTANCE {
                            object.stack_height -= offset;
                        }
                    }
                    // The slider keeps height 0 and becomes a base on a later iteration
                    break;
                }

                if overlaps(&objects[n], &objects[current]) {
                    objects[n].stack_height = objects[current].stack_height + 1;
                    current = n;
                }
            }
        } else if objects[i].is_slider() {
            let mut n = i;
            while n > 0 {
                n -= 1;
                if objects[n].is_spinner() {
                    continue;
                }
                if objects[current].start_time - objects[n].start_time > threshold {
                    break;
                }
                if end_overlaps(&objects[n], &objects[current]) {
                    objects[n].stack_height = objects[current].stack_height + 1;
                    current = n;
                }
            }
        }
    }
}

fn apply_legacy(objects: &mut [HitObject], threshold: f64) {
    for i in 0..objects.len() {
        if objects[i].stack_height != 0 && !objects[i].is_slider() {
            continue;
        }

        let mut start_time = objects[i].end_time();
        let mut slider_stack = 0;
        let position = objects[i].position;
        let end_position = match objects[i].as_slider() {
            Some(slider) => slider.position + slider.path.position_at(1.0),
            None => position,
        };

        for j in i + 1..objects.len() {
            if objects[j].start_time - threshold > start_time {
                break;
            }

            if objects[j].position.distance(position) < STACK_DISTANCE {
                objects[i].stack_height += 1;
                start_time = objects[j].start_time;
            } else if objects[j].position.distance(end_position) < STACK_DISTANCE {
                // Objects at a slider's end are pushed down and right instead
                slider_stack += 1;
                objects[j].stack_height -= slider_stack;
                start_time = objects[j].start_time;
            }
        }
    }
}
