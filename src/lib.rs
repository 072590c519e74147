//! `voicegate` — a streaming voice-activity-detection session engine.
//!
//! This crate provides:
//! - Frame reassembly from arbitrary-length raw PCM chunks
//! - Hysteresis-based speech boundary detection (speech started / speech ended)
//! - A concurrency-safe, multi-tenant session registry with idle eviction
//! - A pluggable frame-classifier boundary, with a Silero VAD backend behind
//!   the `silero` feature
//!
//! The library is designed to sit behind thin ingress layers (an HTTP server,
//! a CLI) that route uploaded chunks by session id, with an emphasis on
//! deterministic state transitions and clean failure semantics.

// High-level API (most consumers should start here).
pub mod engine;

// Core per-frame machinery.
pub mod assembler;
pub mod detector;

// Session lifecycle and registry.
pub mod session;
pub mod store;

// Data model and configuration.
pub mod config;
pub mod error;
pub mod verdict;

// The external classifier boundary.
pub mod classifier;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

pub use classifier::FrameClassifier;
pub use config::VadConfig;
pub use engine::VadEngine;
pub use error::{Error, Result};
pub use verdict::FrameVerdict;
