//! Error types for the progress model and review scheduler.

/// Result alias used by the core library.
pub type Result<T> = std::result::Result<T, ProgressError>;

/// Errors raised by progress and scheduling operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    /// Caller passed a value that cannot come from well-formed data
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A progress record violates its counter invariants
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Date arithmetic left the representable range
    #[error("Date out of range: {0}")]
    OutOfRange(String),
}
