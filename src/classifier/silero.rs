use std::path::Path;

use anyhow::{Context, Result, anyhow, bail, ensure};
use ort::session::{Session, SessionInputValue};
use ort::value::Tensor;
use tracing::info;

use super::FrameClassifier;

/// Flattened length of the model's recurrent state tensor (`[2, 1, 128]`).
const STATE_LEN: usize = 2 * 128;

/// Classifier backed by a Silero VAD ONNX export, run via ONNX Runtime (`ort`).
///
/// Silero's streaming models are recurrent: each call consumes the state
/// tensor produced by the previous call, so consecutive frames are scored as
/// one continuous stream. `reset_state` zeroes the carried state.
pub struct SileroClassifier {
    session: Session,
    state: Vec<f32>,
}

impl SileroClassifier {
    /// Load an ONNX model from disk and initialize a classifier.
    pub fn new(model_path: impl AsRef<Path>) -> Result<Self> {
        let session = Session::builder()
            .context("failed to create ONNX Runtime session builder")?
            .commit_from_file(model_path.as_ref())
            .with_context(|| {
                format!(
                    "failed to load Silero VAD model from '{}'",
                    model_path.as_ref().display()
                )
            })?;

        info!(model = %model_path.as_ref().display(), "Silero VAD model loaded");

        Ok(Self {
            session,
            state: vec![0.0; STATE_LEN],
        })
    }

    /// Zero the carried recurrent state.
    pub fn reset_state(&mut self) {
        self.state.fill(0.0);
    }
}

impl FrameClassifier for SileroClassifier {
    fn classify(&mut self, frame: &[f32], sample_rate: u32) -> Result<f32> {
        // Silero VAD exports score fixed windows: 512 samples at 16 kHz, 256 at 8 kHz.
        let window = match sample_rate {
            16_000 => 512,
            8_000 => 256,
            other => bail!("unsupported sample rate {other} Hz (Silero VAD expects 8000 or 16000)"),
        };
        ensure!(
            frame.len() == window,
            "frame of {} samples does not match the {window}-sample window for {sample_rate} Hz",
            frame.len()
        );

        // The standard Silero VAD export takes three named inputs:
        // - `input`: audio as [batch=1, samples]
        // - `state`: recurrent state as [2, 1, 128]
        // - `sr`: scalar sample rate
        let audio =
            Tensor::from_array(([1usize, frame.len()], frame.to_vec().into_boxed_slice()))
                .context("failed to build audio input tensor")?;
        let state = Tensor::from_array(([2usize, 1, 128], self.state.clone().into_boxed_slice()))
            .context("failed to build recurrent state input tensor")?;
        let sr = Tensor::from_array(((), vec![sample_rate as i64].into_boxed_slice()))
            .context("failed to build sample-rate input tensor")?;

        let inputs: Vec<(String, SessionInputValue<'static>)> = vec![
            ("input".to_owned(), SessionInputValue::Owned(audio.into_dyn())),
            ("state".to_owned(), SessionInputValue::Owned(state.into_dyn())),
            ("sr".to_owned(), SessionInputValue::Owned(sr.into_dyn())),
        ];

        let outputs = self
            .session
            .run(inputs)
            .context("failed to run Silero VAD model")?;

        ensure!(
            outputs.len() >= 2,
            "Silero VAD model produced {} outputs (expected probability and state)",
            outputs.len()
        );

        let (_, probs) = outputs[0]
            .try_extract_tensor::<f32>()
            .context("failed to read probability output")?;
        let confidence = *probs
            .first()
            .ok_or_else(|| anyhow!("Silero VAD model returned an empty probability tensor"))?;

        let (_, next_state) = outputs[1]
            .try_extract_tensor::<f32>()
            .context("failed to read recurrent state output")?;
        ensure!(
            next_state.len() == STATE_LEN,
            "unexpected recurrent state length {} (expected {STATE_LEN})",
            next_state.len()
        );
        self.state.copy_from_slice(next_state);

        Ok(confidence)
    }
}
