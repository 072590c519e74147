// A small CLI utility to download known Silero VAD ONNX models into a
// target directory.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "model-downloader")]
#[command(about = "Download Silero VAD models for voicegate", long_about = None)]
struct Args {
    /// List supported model names and exit.
    #[arg(long)]
    list: bool,

    /// Model name (examples: silero-vad-v5.1.2, silero-vad-v5.1.2-half)
    ///
    /// We intentionally keep an allowlist of known-good model artifacts.
    #[arg(long, required_unless_present = "list")]
    name: Option<String>,

    /// Target directory to store models (created if missing).
    #[arg(long, default_value = "./models")]
    dir: PathBuf,
}

/// Download source for a known model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModelSpec {
    /// Friendly name users type (e.g. "silero-vad-v5.1.2").
    name: &'static str,

    /// Filename written to disk (e.g. "silero_vad.onnx").
    filename: &'static str,

    /// Full download URL.
    url: &'static str,
}

// These URLs point at tagged releases of the upstream silero-vad repository,
// so a given name always resolves to the same artifact.
static VAD_MODELS: &[ModelSpec] = &[
    ModelSpec {
        name: "silero-vad-v5.1.2",
        filename: "silero_vad.onnx",
        url: "https://github.com/snakers4/silero-vad/raw/v5.1.2/src/silero_vad/data/silero_vad.onnx",
    },
    ModelSpec {
        name: "silero-vad-v5.1.2-half",
        filename: "silero_vad_half.onnx",
        url: "https://github.com/snakers4/silero-vad/raw/v5.1.2/src/silero_vad/data/silero_vad_half.onnx",
    },
    ModelSpec {
        name: "silero-vad-v4.0",
        filename: "silero_vad_v4.onnx",
        url: "https://github.com/snakers4/silero-vad/raw/v4.0/files/silero_vad.onnx",
    },
];

fn main() -> Result<()> {
    let args = Args::parse();

    if args.list {
        print_model_list();
        return Ok(());
    }

    let name = args.name.as_deref().expect("clap should require --name");

    fs::create_dir_all(&args.dir)
        .with_context(|| format!("failed to create target dir: {}", args.dir.display()))?;

    let spec = lookup_model(name).with_context(|| {
        format!("unknown model '{name}'. Run with --list to see supported models.")
    })?;

    let dest_path = args.dir.join(spec.filename);

    if dest_path.exists() {
        println!("✅ already exists: {}", dest_path.display());
        return Ok(());
    }

    println!("⬇️  downloading {}", spec.filename);
    println!("    {}", spec.url);

    let client = Client::builder()
        .user_agent("voicegate-model-downloader")
        .build()
        .context("failed to build HTTP client")?;

    download_to_path(&client, spec.url, &dest_path)?;

    println!("✅ saved: {}", dest_path.display());
    Ok(())
}

fn lookup_model(name: &str) -> Option<&'static ModelSpec> {
    VAD_MODELS.iter().find(|m| m.name == name)
}

fn print_model_list() {
    print!("{}", model_list_string());
}

fn model_list_string() -> String {
    let mut out = String::new();

    out.push_str("VAD models:\n");
    for m in VAD_MODELS {
        out.push_str("  - ");
        out.push_str(m.name);
        out.push('\n');
    }

    out
}

/// Download a URL into `dest_path` safely:
/// - download to `dest_path.part`
/// - fsync + rename to final path
fn download_to_path(client: &Client, url: &str, dest_path: &Path) -> Result<()> {
    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request failed: {url}"))?
        .error_for_status()
        .with_context(|| format!("download failed (bad status): {url}"))?;

    let total = resp.content_length();
    download_to_path_with_reader(resp, total, dest_path)
}

fn download_to_path_with_reader<R: Read>(
    mut reader: R,
    total_bytes: Option<u64>,
    dest_path: &Path,
) -> Result<()> {
    let total = total_bytes.unwrap_or(0);

    let pb = if total > 0 {
        ProgressBar::new(total)
    } else {
        ProgressBar::new_spinner()
    };

    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {bytes}/{total_bytes} {bar:40.cyan/blue} {eta}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );

    let tmp_path = PathBuf::from(format!("{}.part", dest_path.display()));

    let result = (|| -> Result<()> {
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

        let mut buf = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            pb.inc(n as u64);
        }

        file.sync_all()?;
        pb.finish_and_clear();

        fs::rename(&tmp_path, dest_path)
            .with_context(|| format!("failed to move into place: {}", dest_path.display()))?;

        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
        pb.finish_and_clear();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_model_finds_known_specs() {
        let spec = lookup_model("silero-vad-v5.1.2").expect("expected v5 model spec");
        assert_eq!(spec.filename, "silero_vad.onnx");

        assert!(lookup_model("definitely-not-a-model").is_none());
    }

    #[test]
    fn model_list_string_includes_known_names() {
        let list = model_list_string();
        assert!(list.contains("VAD models:\n"));
        assert!(list.contains("  - silero-vad-v5.1.2\n"));
        assert!(list.contains("  - silero-vad-v4.0\n"));
    }

    #[test]
    fn args_parse_requires_name_unless_list() {
        let err = Args::try_parse_from(["model-downloader"])
            .err()
            .expect("expected missing-args error");
        assert!(err.to_string().contains("--name"));

        let args =
            Args::try_parse_from(["model-downloader", "--list"]).expect("parse list params");
        assert!(args.list);
        assert!(args.name.is_none());
    }

    #[test]
    fn download_to_path_with_reader_writes_and_renames() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let dest_path = dir.path().join("model.onnx");
        let tmp_path = PathBuf::from(format!("{}.part", dest_path.display()));

        let bytes = b"abc123".to_vec();
        download_to_path_with_reader(
            std::io::Cursor::new(bytes.clone()),
            Some(bytes.len() as u64),
            &dest_path,
        )?;

        assert!(dest_path.exists());
        assert!(!tmp_path.exists());
        assert_eq!(std::fs::read(&dest_path)?, bytes);
        Ok(())
    }

    struct ErrorAfterNBytes {
        bytes: Vec<u8>,
        fail_at: usize,
        pos: usize,
    }

    impl Read for ErrorAfterNBytes {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.fail_at {
                return Err(std::io::Error::other("simulated read failure"));
            }

            let remaining = &self.bytes[self.pos..];
            let n = remaining.len().min(buf.len());
            buf[..n].copy_from_slice(&remaining[..n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn download_to_path_with_reader_cleans_up_part_file_on_error() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let dest_path = dir.path().join("model.onnx");
        let tmp_path = PathBuf::from(format!("{}.part", dest_path.display()));

        let reader = ErrorAfterNBytes {
            bytes: b"abc123".to_vec(),
            fail_at: 1,
            pos: 0,
        };

        let err = download_to_path_with_reader(reader, Some(6), &dest_path).unwrap_err();
        assert!(err.to_string().contains("simulated read failure"));
        assert!(!dest_path.exists());
        assert!(!tmp_path.exists());
        Ok(())
    }
}
