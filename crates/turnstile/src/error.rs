//! Error types for turnstile

use thiserror::Error;

/// Error type for lock acquisition.
///
/// There is a single kind: the lock was unavailable to the caller. It is
/// raised when a guarded call finds the lock already held, and when a
/// suspending acquire reaches the front of the wait chain only to find the
/// lock taken through the guarded path in the meantime. Neither failure
/// disturbs the lock itself; later acquisition attempts are unaffected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// The lock is already held and the caller cannot wait for it
    #[error("lock unavailable: already held")]
    Unavailable,
}

/// Result type alias for turnstile operations
pub type Result<T> = std::result::Result<T, LockError>;
