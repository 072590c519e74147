use tracing::{debug, info};

use crate::config::VadConfig;
use crate::verdict::FrameVerdict;

/// Detector activity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechState {
    /// No utterance in progress.
    Idle,

    /// An utterance is in progress.
    Speaking,
}

/// Hysteresis state machine that turns per-frame speech probabilities into
/// utterance boundary decisions.
///
/// A single 32 ms frame is far too noisy to flip a boundary on, so two
/// counters gate the decision:
/// - `silence_frames` counts consecutive non-speech frames while Speaking;
///   at `silence_after_speech_frames` the utterance is declared over.
/// - `no_speech_frames` counts consecutive non-speech frames regardless of
///   state and is zeroed by any speech frame; at `never_started_frames` a
///   session that never spoke gets a `speech_ended` anyway, and the counter
///   restarts so the event repeats for continued silence.
pub struct SpeechBoundaryDetector {
    speech_threshold: f32,
    silence_after_speech_frames: u32,
    never_started_frames: u32,
    state: SpeechState,
    silence_frames: u32,
    no_speech_frames: u32,
}

/// Counter/state snapshot used to roll a session back after a failed chunk.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DetectorSnapshot {
    state: SpeechState,
    silence_frames: u32,
    no_speech_frames: u32,
}

impl SpeechBoundaryDetector {
    pub fn new(config: &VadConfig) -> Self {
        Self {
            speech_threshold: config.speech_threshold,
            silence_after_speech_frames: config.silence_after_speech_frames,
            never_started_frames: config.never_started_frames,
            state: SpeechState::Idle,
            silence_frames: 0,
            no_speech_frames: 0,
        }
    }

    /// Apply one classified frame to the state machine.
    pub fn observe(&mut self, confidence: f32) -> FrameVerdict {
        let has_speech = confidence > self.speech_threshold;
        let mut speech_ended = false;

        if has_speech {
            if self.state == SpeechState::Idle {
                self.state = SpeechState::Speaking;
                info!(confidence, "speech started");
            }
            self.silence_frames = 0;
            self.no_speech_frames = 0;
        } else {
            self.no_speech_frames += 1;

            match self.state {
                SpeechState::Speaking => {
                    self.silence_frames += 1;
                    debug!(
                        silence_frames = self.silence_frames,
                        threshold = self.silence_after_speech_frames,
                        "silence while speaking"
                    );

                    if self.silence_frames >= self.silence_after_speech_frames {
                        speech_ended = true;
                        self.state = SpeechState::Idle;
                        info!(
                            silence_frames = self.silence_frames,
                            "speech ended after speaking"
                        );
                        self.silence_frames = 0;
                        self.no_speech_frames = 0;
                    }
                }
                SpeechState::Idle => {
                    debug!(
                        no_speech_frames = self.no_speech_frames,
                        threshold = self.never_started_frames,
                        "silence with no speech yet"
                    );

                    if self.no_speech_frames >= self.never_started_frames {
                        speech_ended = true;
                        info!(
                            no_speech_frames = self.no_speech_frames,
                            "speech ended without any speech detected"
                        );
                        self.no_speech_frames = 0;
                    }
                }
            }
        }

        FrameVerdict {
            has_speech,
            speech_ended,
            confidence,
        }
    }

    /// Current activity state.
    pub fn state(&self) -> SpeechState {
        self.state
    }

    /// Consecutive non-speech frames observed while Speaking. Always 0 while Idle.
    pub fn silence_frames(&self) -> u32 {
        self.silence_frames
    }

    /// Consecutive non-speech frames since the last speech frame, in any state.
    pub fn no_speech_frames(&self) -> u32 {
        self.no_speech_frames
    }

    /// Return to the initial Idle state with both counters zeroed.
    pub fn reset(&mut self) {
        self.state = SpeechState::Idle;
        self.silence_frames = 0;
        self.no_speech_frames = 0;
    }

    pub(crate) fn snapshot(&self) -> DetectorSnapshot {
        DetectorSnapshot {
            state: self.state,
            silence_frames: self.silence_frames,
            no_speech_frames: self.no_speech_frames,
        }
    }

    pub(crate) fn restore(&mut self, snapshot: DetectorSnapshot) {
        self.state = snapshot.state;
        self.silence_frames = snapshot.silence_frames;
        self.no_speech_frames = snapshot.no_speech_frames;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPEECH: f32 = 0.9;
    const SILENCE: f32 = 0.1;

    fn detector() -> SpeechBoundaryDetector {
        SpeechBoundaryDetector::new(&VadConfig::default())
    }

    #[test]
    fn first_speech_frame_flips_idle_to_speaking() {
        let mut det = detector();
        assert_eq!(det.state(), SpeechState::Idle);

        let verdict = det.observe(SPEECH);
        assert!(verdict.has_speech);
        assert!(!verdict.speech_ended);
        assert_eq!(verdict.confidence, SPEECH);
        assert_eq!(det.state(), SpeechState::Speaking);
    }

    #[test]
    fn confidence_at_cutoff_is_not_speech() {
        let mut det = detector();
        let verdict = det.observe(0.5);
        assert!(!verdict.has_speech);
        assert_eq!(det.state(), SpeechState::Idle);
    }

    #[test]
    fn speech_ends_after_exactly_sixty_silent_frames() {
        let mut det = detector();
        det.observe(SPEECH);

        for _ in 0..59 {
            let verdict = det.observe(SILENCE);
            assert!(!verdict.speech_ended);
            assert_eq!(det.state(), SpeechState::Speaking);
        }

        let verdict = det.observe(SILENCE);
        assert!(verdict.speech_ended);
        assert_eq!(det.state(), SpeechState::Idle);
        assert_eq!(det.silence_frames(), 0);
        assert_eq!(det.no_speech_frames(), 0);
    }

    #[test]
    fn silence_counter_stays_zero_while_idle() {
        let mut det = detector();

        for _ in 0..100 {
            det.observe(SILENCE);
            assert_eq!(det.silence_frames(), 0);
        }
    }

    #[test]
    fn never_started_silence_fires_at_156_and_repeats() {
        let mut det = detector();

        for _ in 0..155 {
            assert!(!det.observe(SILENCE).speech_ended);
        }
        assert!(det.observe(SILENCE).speech_ended);
        assert_eq!(det.state(), SpeechState::Idle);

        // Counter restarts, so the event repeats every 156 frames of silence.
        for _ in 0..155 {
            assert!(!det.observe(SILENCE).speech_ended);
        }
        assert!(det.observe(SILENCE).speech_ended);
    }

    #[test]
    fn speech_frame_zeroes_both_counters() {
        let mut det = detector();
        det.observe(SPEECH);

        for _ in 0..30 {
            det.observe(SILENCE);
        }
        assert_eq!(det.silence_frames(), 30);
        assert_eq!(det.no_speech_frames(), 30);

        det.observe(SPEECH);
        assert_eq!(det.silence_frames(), 0);
        assert_eq!(det.no_speech_frames(), 0);
        assert_eq!(det.state(), SpeechState::Speaking);
    }

    #[test]
    fn long_speech_run_never_reports_an_end() {
        let mut det = detector();

        for _ in 0..600 {
            let verdict = det.observe(SPEECH);
            assert!(verdict.has_speech);
            assert!(!verdict.speech_ended);
        }
    }

    #[test]
    fn reset_returns_to_initial_state() {
        let mut det = detector();
        det.observe(SPEECH);
        for _ in 0..10 {
            det.observe(SILENCE);
        }

        det.reset();
        assert_eq!(det.state(), SpeechState::Idle);
        assert_eq!(det.silence_frames(), 0);
        assert_eq!(det.no_speech_frames(), 0);
    }
}
