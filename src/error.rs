//! The engine's error taxonomy.
//!
//! A single enum spans every fallible path in the crate. Nothing is ever raised through global
//! or thread-local state; every fallible operation returns a `Result`.

use thiserror::Error;

/// Every way an operation in this crate can fail.
#[derive(Debug, Error)]
pub enum Error {
    /// An invalid `N`, `t`, `q_bits` combination, or a parameter search that didn't converge.
    /// Raised at construction time; fatal.
    #[error("invalid parameters: {0}")]
    ParameterError(String),

    /// An operation needed a key (secret, public, or relinearization) that wasn't present in
    /// the supplied [`crate::keys::KeyMaterial`].
    #[error("required key not present: {0}")]
    KeyError(String),

    /// Two ciphertexts (or a ciphertext and a key) were combined despite using different
    /// `Parameters`, detected by fingerprint mismatch.
    #[error("parameters mismatch: {0}")]
    ParameterMismatch(String),

    /// Malformed wire data: bad magic, unknown version, truncated buffer, or an out-of-range
    /// coefficient.
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// A sampler was asked to draw from an invalid distribution (e.g. non-positive sigma).
    #[error("invalid sampler parameters: {0}")]
    SamplerError(String),

    /// The requested acceleration backend isn't available. Per policy this is never returned
    /// from engine construction (which always falls back to `Native` and logs a diagnostic
    /// instead); the variant is retained so any caller-facing diagnostic channel can name the
    /// condition precisely.
    #[error("backend {0} is unavailable, falling back to native")]
    BackendUnavailable(String),
}

/// A convenience alias for this crate's fallible operations.
pub type Result<T> = std::result::Result<T, Error>;
