use crate::error::{Error, Result};

/// Options that control frame assembly and boundary detection.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// Binaries are responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI/server context
/// - other frontends (tests, batch jobs) can construct options programmatically
///
/// The defaults match the geometry Silero VAD expects at 16 kHz: 512-sample
/// frames (~32 ms each), so 60 frames ≈ 2 s and 156 frames ≈ 5 s.
#[derive(Debug, Clone)]
pub struct VadConfig {
    /// Input sample rate in Hz. All sessions share it.
    pub sample_rate: u32,

    /// Samples per analysis frame handed to the classifier.
    pub frame_size: usize,

    /// Probability cutoff above which a frame counts as speech.
    ///
    /// The comparison is strict: a frame at exactly the cutoff is non-speech.
    pub speech_threshold: f32,

    /// Consecutive non-speech frames after speech before `speech_ended` fires.
    pub silence_after_speech_frames: u32,

    /// Consecutive non-speech frames on a session that never spoke before
    /// `speech_ended` fires anyway.
    pub never_started_frames: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            frame_size: 512,
            speech_threshold: 0.5,
            silence_after_speech_frames: 60,
            never_started_frames: 156,
        }
    }
}

impl VadConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig(
                "sample_rate must be greater than 0".to_owned(),
            ));
        }

        if self.frame_size == 0 {
            return Err(Error::InvalidConfig(
                "frame_size must be greater than 0".to_owned(),
            ));
        }

        if !(0.0..=1.0).contains(&self.speech_threshold) {
            return Err(Error::InvalidConfig(
                "speech_threshold must be between 0.0 and 1.0".to_owned(),
            ));
        }

        if self.silence_after_speech_frames == 0 || self.never_started_frames == 0 {
            return Err(Error::InvalidConfig(
                "frame thresholds must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Byte length of one complete frame of 16-bit PCM.
    pub fn frame_bytes(&self) -> usize {
        self.frame_size * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = VadConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frame_size, 512);
        assert_eq!(config.frame_bytes(), 1024);
    }

    #[test]
    fn validate_rejects_zero_frame_size() {
        let config = VadConfig {
            frame_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_threshold() {
        let config = VadConfig {
            speech_threshold: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_frame_thresholds() {
        let config = VadConfig {
            silence_after_speech_frames: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
