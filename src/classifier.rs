//! The frame-classifier boundary.
//!
//! The engine never implements a speech model itself. It calls whatever
//! [`FrameClassifier`] it was constructed with, which keeps the assembler and
//! boundary detector independently testable against a deterministic stub and
//! lets deployments swap model runtimes without touching session logic.

use anyhow::Result;

#[cfg(feature = "silero")]
mod silero;

#[cfg(feature = "silero")]
pub use silero::SileroClassifier;

/// A binary speech classifier over one fixed-size frame.
///
/// Implementations receive exactly `frame_size` normalized mono samples plus
/// the configured sample rate and return a speech probability in
/// `[0.0, 1.0]`. A failure (model unavailable, malformed input) must surface
/// as an error rather than a fallback probability; the engine propagates it
/// and rolls the session back.
pub trait FrameClassifier: Send {
    fn classify(&mut self, frame: &[f32], sample_rate: u32) -> Result<f32>;
}
