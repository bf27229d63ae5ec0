#![no_main]

use libfuzzer_sys::fuzz_target;
use osu_model::BeatmapDecoder;

fuzz_target!(|data: &[u8]| {
    let _ = BeatmapDecoder::new().decode_bytes(data);
    let _ = BeatmapDecoder::new().with_hit_objects(false).decode_bytes(data);
});
