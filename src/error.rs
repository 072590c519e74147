use thiserror::Error;

/// Voicegate's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Voicegate's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs. The classifier boundary is the exception: it
/// reports failures as `anyhow::Error`, which the engine wraps in [`Error::Classifier`].
#[derive(Debug, Error)]
pub enum Error {
    /// A zero-length audio chunk. Recoverable; callers should treat it as a no-op.
    #[error("empty audio chunk")]
    EmptyInput,

    /// A chunk whose byte length is not a whole number of 16-bit samples.
    #[error("audio chunk of {0} bytes is not a whole number of 16-bit samples")]
    UnalignedChunk(usize),

    /// The only format constraint placed on caller-supplied session ids.
    #[error("session id must not be empty")]
    EmptySessionId,

    /// An operation referenced a session id that is not in the store.
    #[error("unknown session '{0}'")]
    UnknownSession(String),

    /// The external classifier failed or returned an out-of-range probability.
    ///
    /// The session this chunk targeted was restored to its pre-call state, so a retry
    /// with the same bytes sees exactly what the failed call saw.
    #[error("classifier failed: {0:#}")]
    Classifier(anyhow::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
