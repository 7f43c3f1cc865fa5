//! Error types for measurement and logging.

use thiserror::Error;

/// The memory probe could not produce a byte count.
#[derive(Debug, Error)]
pub enum MeasurementError {
    /// sysinfo has no backend for this OS
    #[error("memory measurement is not supported on this platform")]
    Unsupported,

    /// The current process id could not be resolved
    #[error("cannot resolve current process id: {0}")]
    Pid(&'static str),

    /// The process vanished from the process table between refreshes
    #[error("process {0} is not visible to the memory probe")]
    ProcessNotFound(u32),

    /// Failure reported by a custom or stub measurer
    #[error("memory probe failed: {0}")]
    Probe(String),
}

/// Errors surfaced by the memory point log and the session around it.
#[derive(Debug, Error)]
pub enum LogError {
    #[error(transparent)]
    Measurement(#[from] MeasurementError),

    /// Suffix search ran past its bound. Indicates a logic defect.
    #[error("no free label for {base:?} after {attempts} attempts")]
    LabelCollisionExhausted { base: String, attempts: usize },

    /// A measurer was installed after the session already existed
    #[error("tracemem session is already installed")]
    AlreadyInstalled,
}
