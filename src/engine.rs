//! High-level detection engine.
//!
//! We expose a single, ergonomic entry point (`VadEngine`) that wraps the
//! lower-level assembly, classification, and boundary-detection logic.
//!
//! The intent is:
//! - We construct the classifier once (model loading is expensive).
//! - We keep all per-caller state in the session store, created lazily.
//! - Ingress layers (HTTP, CLI) hand us a session id plus raw bytes and get
//!   back the last frame's verdict; they never touch session internals.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use tracing::debug;

use crate::classifier::FrameClassifier;
use crate::config::VadConfig;
use crate::error::{Error, Result};
use crate::session::AudioSession;
use crate::store::{SessionStore, lock_unpoisoned};
use crate::verdict::FrameVerdict;

/// The main multi-tenant detection entry point.
///
/// `VadEngine` owns the long-lived resources:
/// - the injected [`FrameClassifier`] (shared across sessions behind a lock)
/// - the [`SessionStore`] holding every caller's assembler + detector pair
///
/// Typical usage:
/// - Construct once with a classifier.
/// - Call `process_chunk` for every uploaded chunk, routed by session id.
/// - Wire `reset_session` / `remove_session` / `evict_idle` to the
///   administrative surface.
pub struct VadEngine<C: FrameClassifier> {
    config: VadConfig,
    store: SessionStore,
    classifier: Mutex<C>,
}

impl<C: FrameClassifier> VadEngine<C> {
    /// Create an engine from validated configuration and a classifier.
    pub fn new(config: VadConfig, classifier: C) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            store: SessionStore::new(config.clone()),
            config,
            classifier: Mutex::new(classifier),
        })
    }

    /// Ingest one raw PCM16LE chunk for `session_id` and return the verdict
    /// of the last complete frame it produced.
    ///
    /// The session is created on first use. Frames are applied
    /// transactionally: if classification fails partway through a chunk, the
    /// session is rolled back to its pre-call state so a retry with the same
    /// bytes is well-defined. A chunk too short to complete a frame returns
    /// the quiet verdict without invoking the classifier.
    pub fn process_chunk(&self, session_id: &str, chunk: &[u8]) -> Result<FrameVerdict> {
        if session_id.is_empty() {
            return Err(Error::EmptySessionId);
        }
        if chunk.is_empty() {
            return Err(Error::EmptyInput);
        }
        if chunk.len() % 2 != 0 {
            return Err(Error::UnalignedChunk(chunk.len()));
        }

        let slot = self.store.get_or_create(session_id);
        let mut session = lock_unpoisoned(&slot);

        let snapshot = session.snapshot();
        match self.apply_chunk(&mut session, chunk) {
            Ok(verdict) => Ok(verdict),
            Err(err) => {
                session.restore(snapshot);
                Err(err)
            }
        }
    }

    fn apply_chunk(&self, session: &mut AudioSession, chunk: &[u8]) -> Result<FrameVerdict> {
        session.assembler.feed(chunk)?;

        let mut last = None;
        while let Some(frame) = session.assembler.next_frame() {
            let confidence = self.classify(&frame)?;
            last = Some(session.detector.observe(confidence));
        }

        match last {
            Some(verdict) => Ok(verdict),
            None => {
                debug!(
                    pending = session.assembler.pending_samples(),
                    frame_size = self.config.frame_size,
                    "buffer below one frame, accumulating"
                );
                Ok(FrameVerdict::accumulating())
            }
        }
    }

    fn classify(&self, frame: &[f32]) -> Result<f32> {
        let confidence = lock_unpoisoned(&self.classifier)
            .classify(frame, self.config.sample_rate)
            .map_err(Error::Classifier)?;

        if !(0.0..=1.0).contains(&confidence) {
            return Err(Error::Classifier(anyhow!(
                "probability {confidence} outside [0, 1]"
            )));
        }

        Ok(confidence)
    }

    /// Re-initialize a session in place, as if it had just been created.
    pub fn reset_session(&self, session_id: &str) -> Result<()> {
        if self.store.reset(session_id) {
            Ok(())
        } else {
            Err(Error::UnknownSession(session_id.to_owned()))
        }
    }

    /// Delete a session outright.
    pub fn remove_session(&self, session_id: &str) -> Result<()> {
        if self.store.remove(session_id) {
            Ok(())
        } else {
            Err(Error::UnknownSession(session_id.to_owned()))
        }
    }

    /// Sweep out sessions idle for longer than `max_idle`; returns the number evicted.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        self.store.evict_idle(max_idle)
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.store.count()
    }

    /// The engine's configuration.
    pub fn config(&self) -> &VadConfig {
        &self.config
    }
}
