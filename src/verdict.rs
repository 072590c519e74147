use serde::Serialize;

/// The result surface returned to callers for each processed chunk.
///
/// When one chunk yields several complete frames, every frame still advances
/// the session's detector in order, but only the verdict of the *last* frame
/// is reported. This mirrors the wire behavior callers already depend on; an
/// intermediate `speech_ended` inside the same chunk is not individually
/// surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameVerdict {
    /// Whether the last classified frame was speech.
    pub has_speech: bool,

    /// Whether this frame closed out an utterance (or a never-started silence run).
    pub speech_ended: bool,

    /// The classifier's probability for the last frame, in `[0.0, 1.0]`.
    pub confidence: f32,
}

impl FrameVerdict {
    /// Verdict returned while a chunk is still accumulating toward one full frame.
    ///
    /// No classifier call was made and no counter moved.
    pub(crate) fn accumulating() -> Self {
        Self {
            has_speech: false,
            speech_ended: false,
            confidence: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_snake_case_fields() -> anyhow::Result<()> {
        let verdict = FrameVerdict {
            has_speech: true,
            speech_ended: false,
            confidence: 0.875,
        };

        let value = serde_json::to_value(verdict)?;
        assert_eq!(value["has_speech"], true);
        assert_eq!(value["speech_ended"], false);
        assert!((value["confidence"].as_f64().unwrap() - 0.875).abs() < 1e-6);
        Ok(())
    }
}
