use serde::{Deserialize, Serialize};

/// Playback clock tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct ClockConfig {
    /// Seconds per rendered frame the seek threshold allows for.
    pub expected_frame_time: f64,
    /// Seconds of drift that count as a seek.
    pub seek_threshold: f64,
    /// Clock rate while catching up with a seek.
    pub seek_rate: f32,
    /// Rate correction per second of drift.
    pub drift_correction_gain: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            expected_frame_time: 1.0 / 60.0,
            seek_threshold: 1.0,
            seek_rate: 6.0,
            drift_correction_gain: 10.0,
        }
    }
}

impl ClockConfig {
    pub fn validate(&mut self) {
        self.expected_frame_time = finite_or(self.expected_frame_time, 1.0 / 60.0)
            .clamp(1.0 / 1000.0, 1.0 / 10.0);
        self.seek_threshold = finite_or(self.seek_threshold, 1.0).clamp(0.1, 10.0);
        self.seek_rate = if self.seek_rate.is_finite() {
            self.seek_rate.clamp(1.0, 32.0)
        } else {
            6.0
        };
        self.drift_correction_gain = finite_or(self.drift_correction_gain, 10.0).clamp(0.0, 60.0);
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = ClockConfig::default();
        assert_eq!(c.expected_frame_time, 1.0 / 60.0);
        assert_eq!(c.seek_threshold, 1.0);
        assert_eq!(c.seek_rate, 6.0);
        assert_eq!(c.drift_correction_gain, 10.0);
    }

    #[test]
    fn test_validate_clamps() {
        let mut c = ClockConfig {
            expected_frame_time: 1.0,
            seek_threshold: 0.0,
            seek_rate: 100.0,
            drift_correction_gain: -5.0,
        };
        c.validate();
        assert_eq!(c.expected_frame_time, 0.1);
        assert_eq!(c.seek_threshold, 0.1);
        assert_eq!(c.seek_rate, 32.0);
        assert_eq!(c.drift_correction_gain, 0.0);
    }

    #[test]
    fn test_validate_keeps_defaults() {
        let mut c = ClockConfig::default();
        c.validate();
        assert_eq!(c, ClockConfig::default());
    }

    #[test]
    fn test_validate_non_finite() {
        let mut c = ClockConfig {
            seek_threshold: f64::NAN,
            seek_rate: f32::INFINITY,
            ..Default::default()
        };
        c.validate();
        assert_eq!(c.seek_threshold, 1.0);
        assert_eq!(c.seek_rate, 6.0);
    }

    #[test]
    fn test_camel_case_keys() {
        let json = serde_json::to_string(&ClockConfig::default()).unwrap();
        assert!(json.contains("\"expectedFrameTime\""));
        assert!(json.contains("\"driftCorrectionGain\""));
    }
}
