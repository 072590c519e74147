use std::time::{Duration, Instant};

use crate::assembler::FrameAssembler;
use crate::config::VadConfig;
use crate::detector::{DetectorSnapshot, SpeechBoundaryDetector};

/// One caller's isolated stream state.
///
/// A session pairs the frame assembler (buffered carry-over between chunks)
/// with the boundary detector (hysteresis counters), plus the activity
/// timestamp used for idle eviction. Sessions are created lazily on the first
/// chunk for an unseen id and live until removed or evicted; nothing
/// persists across process restarts.
pub struct AudioSession {
    pub(crate) assembler: FrameAssembler,
    pub(crate) detector: SpeechBoundaryDetector,
    pub(crate) last_activity: Instant,
}

/// Pre-call state captured so a failed chunk can be rolled back wholesale.
pub(crate) struct SessionSnapshot {
    buffer: Vec<f32>,
    detector: DetectorSnapshot,
}

impl AudioSession {
    pub(crate) fn new(config: &VadConfig) -> Self {
        Self {
            assembler: FrameAssembler::new(config.frame_size),
            detector: SpeechBoundaryDetector::new(config),
            last_activity: Instant::now(),
        }
    }

    /// Mark the session as active now.
    pub(crate) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Re-initialize in place: empty buffer, Idle, both counters zeroed.
    ///
    /// Observably identical to a brand-new session under the same id.
    pub(crate) fn reset(&mut self) {
        self.assembler.clear();
        self.detector.reset();
        self.touch();
    }

    pub(crate) fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            buffer: self.assembler.snapshot(),
            detector: self.detector.snapshot(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: SessionSnapshot) {
        self.assembler.restore(snapshot.buffer);
        self.detector.restore(snapshot.detector);
    }

    /// The session's boundary detector, for state inspection.
    pub fn detector(&self) -> &SpeechBoundaryDetector {
        &self.detector
    }

    /// Samples currently carried over between chunks. Always less than one
    /// frame at rest.
    pub fn pending_samples(&self) -> usize {
        self.assembler.pending_samples()
    }
}
