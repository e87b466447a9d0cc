//! Error types for lorenz-trail.
//!
//! The simulation itself has exactly one failure mode, [`NumericFault`]. The
//! remaining types cover loading configuration and running the off-thread
//! worker.

use glam::DVec3;
use thiserror::Error;

/// Integration produced a non-finite coordinate.
///
/// Raised eagerly by [`generate`](crate::lorenz::generate) the first time any
/// of `x`, `y` or `z` overflows to infinity or becomes NaN. The fault is
/// deterministic for a given seed and parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error(
    "numeric overflow at integration step {step}: state left the finite range after \
     {last_valid}. Reduce dt or choose less extreme parameters."
)]
pub struct NumericFault {
    /// Zero-based index of the step whose result was non-finite.
    ///
    /// Equal to the number of points the faulting call returned.
    pub step: usize,
    /// State the failing step started from: the last point handed out, or the
    /// start state when step 0 fails (which is non-finite if the start was).
    pub last_valid: DVec3,
}

/// Errors that can occur while loading, saving or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the configuration file.
    #[error("failed to access configuration file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid configuration JSON.
    #[error("failed to parse configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// A value is outside the range the simulation can run with.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur when running the trajectory worker thread.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The OS refused to spawn the worker thread.
    #[error("failed to spawn trajectory worker thread: {0}")]
    Spawn(#[source] std::io::Error),
    /// The worker rejected its configuration before starting.
    #[error("trajectory worker configuration rejected: {0}")]
    Config(#[from] ConfigError),
    /// The worker thread is gone and can no longer be reached.
    #[error("trajectory worker disconnected")]
    Disconnected,
    /// The worker thread panicked.
    #[error("trajectory worker panicked")]
    Panicked,
}
