mod hit_objects;
mod sections;
mod timing_points;
mod values;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::LazyLock;

use log::{debug, info, warn};
use md5::{Digest, Md5};
use regex::Regex;

use crate::beatmap::{BeatmapData, DEFAULT_FORMAT_VERSION};
use crate::error::DecodeError;

static HEADER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"osu file format v(\d+)").ok());

/// Chart section selected by the last `[Name]` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    General,
    Editor,
    Metadata,
    Difficulty,
    Events,
    TimingPoints,
    Colours,
    HitObjects,
}

impl Section {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "General" => Some(Self::General),
            "Editor" => Some(Self::Editor),
            "Metadata" => Some(Self::Metadata),
            "Difficulty" => Some(Self::Difficulty),
            "Events" => Some(Self::Events),
            "TimingPoints" => Some(Self::TimingPoints),
            "Colours" => Some(Self::Colours),
            "HitObjects" => Some(Self::HitObjects),
            _ => None,
        }
    }
}

/// `.osu` file decoder.
///
/// Holds only options; every call owns its line buffer and output, so one
/// decoder can serve any number of sequential or concurrent decodes.
#[derive(Debug, Clone, Copy)]
pub struct BeatmapDecoder {
    with_hit_objects: bool,
}

impl Default for BeatmapDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BeatmapDecoder {
    pub fn new() -> Self {
        Self {
            with_hit_objects: true,
        }
    }

    /// Skip `[HitObjects]` when false, for fast metadata-only reads
    pub fn with_hit_objects(mut self, with_hit_objects: bool) -> Self {
        self.with_hit_objects = with_hit_objects;
        self
    }

    pub fn decode_file(&self, path: &Path) -> Result<BeatmapData, DecodeError> {
        let file = File::open(path)?;
        let mut data = self.decode(BufReader::new(file))?;
        data.filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        data.folder = path.parent().map(|p| p.to_string_lossy().into_owned());
        Ok(data)
    }

    pub fn decode_str(&self, content: &str) -> Result<BeatmapData, DecodeError> {
        self.decode_bytes(content.as_bytes())
    }

    pub fn decode_bytes(&self, bytes: &[u8]) -> Result<BeatmapData, DecodeError> {
        self.decode(bytes)
    }

    /// Decode a chart from `reader`.
    ///
    /// A read error ends the decode and the partial chart is dropped; closing
    /// the underlying source is how a caller cancels.
    pub fn decode<R: BufRead>(&self, mut reader: R) -> Result<BeatmapData, DecodeError> {
        let mut hasher = Md5::new();
        let mut buf = Vec::new();

        if !next_line(&mut reader, &mut buf, &mut hasher)? {
            return Err(DecodeError::Format);
        }
        let format_version = {
            let head = String::from_utf8_lossy(strip_eol(&buf));
            let captures = HEADER
                .as_ref()
                .and_then(|re| re.captures(&head))
                .ok_or(DecodeError::Format)?;
            captures[1].parse().unwrap_or(DEFAULT_FORMAT_VERSION)
        };

        let mut data = BeatmapData {
            format_version,
            hit_objects: self.with_hit_objects.then(Vec::new),
            ..Default::default()
        };
        let mut section = None;

        while next_line(&mut reader, &mut buf, &mut hasher)? {
            ensure_standard_mode(&data)?;

            let raw = String::from_utf8_lossy(strip_eol(&buf));
            if raw.starts_with(' ') || raw.starts_with('_') {
                continue;
            }
            let line = raw.trim_matches(|c: char| c <= ' ');
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Section::parse(name);
                match section {
                    Some(s) => debug!("Entering section {:?}", s),
                    None => warn!("Unknown section [{}], skipping its lines", name),
                }
                continue;
            }

            let Some(current) = section else {
                continue;
            };
            self.decode_line(&mut data, current, line)?;
        }

        ensure_standard_mode(&data)?;

        data.md5 = format!("{:x}", hasher.finalize());
        data.populate_object_data();

        info!(
            "Decoded beatmap v{}: {} timing points, {} difficulty points, {} hit objects",
            data.format_version,
            data.control_points.timing.len(),
            data.control_points.difficulty.len(),
            data.hit_objects().len()
        );
        Ok(data)
    }

    fn decode_line(
        &self,
        data: &mut BeatmapData,
        section: Section,
        line: &str,
    ) -> Result<(), DecodeError> {
        let skipped = match section {
            Section::General => sections::general(data, line),
            Section::Metadata => sections::metadata(data, line),
            Section::Difficulty => sections::difficulty(data, line),
            Section::Events => sections::events(data, line),
            Section::Colours => sections::colours(data, line),
            Section::TimingPoints => {
                return timing_points::decode(data, line).map_err(|fault| {
                    DecodeError::MalformedControlPoint {
                        line: line.to_string(),
                        fault,
                    }
                });
            }
            Section::HitObjects => {
                if !self.with_hit_objects {
                    return Ok(());
                }
                return hit_objects::decode(data, line).map_err(|fault| {
                    DecodeError::MalformedHitObject {
                        line: line.to_string(),
                        fault,
                    }
                });
            }
            Section::Editor => Ok(()),
        };

        if let Err(reason) = skipped {
            debug!("Skipping [{:?}] line {:?}: {}", section, line, reason);
        }
        Ok(())
    }
}

fn ensure_standard_mode(data: &BeatmapData) -> Result<(), DecodeError> {
    match data.general.mode {
        0 => Ok(()),
        mode => Err(DecodeError::UnsupportedMode(mode)),
    }
}

/// Read the next line into `buf`, hashing the raw bytes. Returns false at end of input.
fn next_line<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    hasher: &mut Md5,
) -> Result<bool, DecodeError> {
    buf.clear();
    let read = reader.read_until(b'\n', buf)?;
    hasher.update(&buf[..]);
    Ok(read > 0)
}

fn strip_eol(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ControlPointFault, HitObjectFault};

    fn decode_inline(content: &str) -> BeatmapData {
        BeatmapDecoder::new().decode_str(content).unwrap()
    }

    const MINIMAL: &str = "\
osu file format v14

[General]
Mode: 0

[TimingPoints]
0,500,4,,,,1,0
";

    #[test]
    fn test_minimal() {
        let data = decode_inline(MINIMAL);
        assert_eq!(data.format_version, 14);
        let timing = data.control_points.timing.points();
        assert_eq!(timing.len(), 1);
        assert_eq!(timing[0].time, 0.0);
        assert_eq!(timing[0].beat_length, 500.0);
        assert_eq!(timing[0].meter, 4);
        assert_eq!(data.hit_objects, Some(Vec::new()));
    }

    #[test]
    fn test_legacy_version_offsets_timing() {
        let data = decode_inline(&MINIMAL.replace("v14", "v4"));
        assert_eq!(data.format_version, 4);
        assert_eq!(data.control_points.timing.points()[0].time, 24.0);
    }

    #[test]
    fn test_header_required() {
        let decoder = BeatmapDecoder::new();
        assert!(matches!(decoder.decode_str(""), Err(DecodeError::Format)));
        assert!(matches!(
            decoder.decode_str("[General]\nMode: 0\n"),
            Err(DecodeError::Format)
        ));
        assert!(matches!(
            decoder.decode_str("osu file format\n"),
            Err(DecodeError::Format)
        ));
    }

    #[test]
    fn test_header_with_bom_and_crlf() {
        let data = decode_inline("\u{feff}osu file format v9\r\n[General]\r\nStackLeniency: 0.4\r\n");
        assert_eq!(data.format_version, 9);
        assert_eq!(data.general.stack_leniency, 0.4);
    }

    #[test]
    fn test_oversized_version_uses_default() {
        let data = decode_inline("osu file format v99999999999\n");
        assert_eq!(data.format_version, DEFAULT_FORMAT_VERSION);
    }

    #[test]
    fn test_unsupported_mode() {
        let content = "\
osu file format v14
[General]
Mode: 1
[Metadata]
Title: Taiko
";
        let err = BeatmapDecoder::new().decode_str(content).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedMode(1)));
    }

    #[test]
    fn test_unsupported_mode_on_last_line() {
        let err = BeatmapDecoder::new()
            .decode_str("osu file format v14\n[General]\nMode: 3")
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedMode(3)));
    }

    #[test]
    fn test_comments_and_unknown_sections() {
        let content = "\
osu file format v14
// comment
Title: outside any section
[Metadata]
 Title: space comment
_Title: underscore comment
Title: Real
[Fonts]
Title: ignored
";
        let data = decode_inline(content);
        assert_eq!(data.metadata.title, "Real");
    }

    #[test]
    fn test_malformed_control_point_aborts() {
        let content = "osu file format v14\n[TimingPoints]\n1000\n";
        let err = BeatmapDecoder::new().decode_str(content).unwrap_err();
        match err {
            DecodeError::MalformedControlPoint { line, fault } => {
                assert_eq!(line, "1000");
                assert_eq!(fault, ControlPointFault::TooFewFields(1));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_malformed_hit_object_aborts() {
        let content = "osu file format v14\n[HitObjects]\n1,2\n";
        let err = BeatmapDecoder::new().decode_str(content).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedHitObject {
                fault: HitObjectFault::TooFewFields { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_without_hit_objects() {
        let content = "osu file format v14\n[HitObjects]\nnot even a hit object\n";
        let data = BeatmapDecoder::new()
            .with_hit_objects(false)
            .decode_str(content)
            .unwrap();
        assert_eq!(data.hit_objects, None);
        assert!(data.raw_hit_objects.is_empty());
        assert_eq!(data.max_combo(), None);
    }

    #[test]
    fn test_md5() {
        let data = decode_inline("osu file format v14\n");
        let expected = format!("{:x}", Md5::digest(b"osu file format v14\n"));
        assert_eq!(data.md5, expected);
        let again = decode_inline("osu file format v14\n");
        assert_eq!(data.md5, again.md5);
        let other = decode_inline("osu file format v13\n");
        assert_ne!(data.md5, other.md5);
    }

    #[test]
    fn test_read_error_propagates() {
        struct Failing;
        impl std::io::Read for Failing {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("source closed"))
            }
        }
        let err = BeatmapDecoder::new()
            .decode(BufReader::new(Failing))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Io(_)));
    }

    #[test]
    fn test_section_parse() {
        assert_eq!(Section::parse("HitObjects"), Some(Section::HitObjects));
        assert_eq!(Section::parse("Colours"), Some(Section::Colours));
        assert_eq!(Section::parse("Fonts"), None);
    }
}
