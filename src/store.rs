use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::time::Duration;

use tracing::{debug, info};

use crate::config::VadConfig;
use crate::session::AudioSession;

/// Lock a mutex, recovering the inner data if a previous holder panicked.
pub(crate) fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Concurrency-safe registry mapping caller-supplied session ids to live sessions.
///
/// The map lock covers only the id→session lookup/insert/remove path; all
/// per-session work happens under each session's own lock, so independent
/// callers never serialize on one another. Pipelined chunks for the *same* id
/// queue on that session's lock and are applied in arrival order.
pub struct SessionStore {
    config: VadConfig,
    sessions: Mutex<HashMap<String, Arc<Mutex<AudioSession>>>>,
}

impl SessionStore {
    pub fn new(config: VadConfig) -> Self {
        Self {
            config,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Return the session for `session_id`, constructing a fresh one (Idle,
    /// empty buffer, zeroed counters) if the id is unseen. Always refreshes
    /// the session's activity timestamp.
    pub fn get_or_create(&self, session_id: &str) -> Arc<Mutex<AudioSession>> {
        let slot = {
            let mut sessions = lock_unpoisoned(&self.sessions);
            sessions
                .entry(session_id.to_owned())
                .or_insert_with(|| {
                    info!(%session_id, "session created");
                    Arc::new(Mutex::new(AudioSession::new(&self.config)))
                })
                .clone()
        };

        lock_unpoisoned(&slot).touch();
        slot
    }

    /// Re-initialize an existing session in place. Returns `false` if the id
    /// is unknown.
    pub fn reset(&self, session_id: &str) -> bool {
        let slot = {
            let sessions = lock_unpoisoned(&self.sessions);
            match sessions.get(session_id) {
                Some(slot) => slot.clone(),
                None => return false,
            }
        };

        lock_unpoisoned(&slot).reset();
        info!(%session_id, "session reset");
        true
    }

    /// Delete a session outright. Returns `false` if the id is unknown.
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = lock_unpoisoned(&self.sessions).remove(session_id).is_some();
        if removed {
            info!(%session_id, "session removed");
        }
        removed
    }

    /// Sweep out sessions idle for longer than `max_idle`, returning how many
    /// were dropped.
    ///
    /// A session whose lock is held at sweep time is mid-call and is skipped;
    /// the next sweep reclaims it once it has actually gone idle.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = lock_unpoisoned(&self.sessions);
        let before = sessions.len();

        sessions.retain(|session_id, slot| match slot.try_lock() {
            Ok(session) => {
                let keep = session.idle_for() <= max_idle;
                if !keep {
                    info!(%session_id, "evicting idle session");
                }
                keep
            }
            Err(TryLockError::WouldBlock) => true,
            Err(TryLockError::Poisoned(_)) => false,
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "idle sweep complete");
        }
        evicted
    }

    /// Number of live sessions.
    pub fn count(&self) -> usize {
        lock_unpoisoned(&self.sessions).len()
    }
}
