use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result, ensure};
use clap::Parser;
use hound::WavReader;

use voicegate::classifier::SileroClassifier;
use voicegate::{VadConfig, VadEngine};

#[derive(Parser, Debug)]
#[command(name = "voicegate-cli")]
#[command(about = "Run streaming voice activity detection over a WAV file")]
struct Params {
    /// Path to a Silero VAD ONNX model file.
    #[arg(short = 'm', long = "model")]
    pub model_path: String,

    /// Path to a 16 kHz mono 16-bit WAV file.
    #[arg(short = 'a', long = "audio")]
    pub audio_path: String,

    /// Bytes of PCM delivered to the engine per call. Deliberately decoupled
    /// from the frame size so carry-over paths get exercised.
    #[arg(long = "chunk-bytes", default_value_t = 2000)]
    pub chunk_bytes: usize,
}

fn main() -> Result<()> {
    voicegate::logging::init();
    let params = Params::parse();

    ensure!(
        params.chunk_bytes >= 2 && params.chunk_bytes % 2 == 0,
        "chunk-bytes must be a positive multiple of 2"
    );

    let config = VadConfig::default();
    let classifier = SileroClassifier::new(&params.model_path)?;
    let engine = VadEngine::new(config.clone(), classifier)?;

    let pcm = read_pcm_bytes(&params.audio_path, &config)?;
    let session_id = uuid::Uuid::new_v4().to_string();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    // One JSON verdict line per chunk, the same surface the server returns.
    for chunk in pcm.chunks(params.chunk_bytes) {
        let verdict = engine.process_chunk(&session_id, chunk)?;
        serde_json::to_writer(&mut out, &verdict)?;
        out.write_all(b"\n")?;
    }

    out.flush()?;
    Ok(())
}

/// Load a WAV file and return its raw little-endian PCM bytes.
///
/// Format requirements mirror what the engine expects on the wire: mono,
/// the configured sample rate, 16-bit integer samples.
fn read_pcm_bytes(path: &str, config: &VadConfig) -> Result<Vec<u8>> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("failed to open WAV file '{path}'"))?;
    let spec = reader.spec();

    ensure!(
        spec.channels == 1,
        "expected mono WAV (1 channel), got {} channels",
        spec.channels
    );
    ensure!(
        spec.sample_rate == config.sample_rate,
        "expected {} Hz sample rate, got {} Hz",
        config.sample_rate,
        spec.sample_rate
    );
    ensure!(
        spec.bits_per_sample == 16 && spec.sample_format == hound::SampleFormat::Int,
        "expected 16-bit integer samples"
    );

    let mut pcm = Vec::new();
    for sample in reader.samples::<i16>() {
        let s = sample.context("failed to read WAV sample")?;
        pcm.extend_from_slice(&s.to_le_bytes());
    }

    Ok(pcm)
}
