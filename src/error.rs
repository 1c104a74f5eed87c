//! Unified error types for the production counter.
//!
//! A single `Error` funnel every subsystem converts into, keeping the
//! top-level control loop's error handling uniform. All variants are `Copy`
//! so they pass through the dispatch step without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the supervisory core funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A session operation was invalid for the current session state.
    Session(SessionError),
    /// A persisted snapshot failed structural validation.
    Snapshot(SnapshotError),
    /// The storage collaborator reported an I/O failure.
    Storage(IoError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session(e) => write!(f, "session: {e}"),
            Self::Snapshot(e) => write!(f, "snapshot: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Invalid session operations. Returned to the caller, logged, never fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// `start` was called while a session is already running.
    AlreadyActive,
    /// `stop` was called with no session running.
    NotActive,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyActive => write!(f, "session already active"),
            Self::NotActive => write!(f, "no active session"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<SessionError> for Error {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Snapshot validation errors
// ---------------------------------------------------------------------------

/// Reasons a recovery snapshot is rejected by `ProductionSession::restore`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotError {
    /// Count exceeds the configured maximum.
    CountOutOfRange,
    /// Marked active but carries no start timestamp.
    ActiveWithoutStart,
    /// Completed session whose stop time precedes its start time.
    InvertedTimestamps,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CountOutOfRange => write!(f, "count out of range"),
            Self::ActiveWithoutStart => write!(f, "active session without start time"),
            Self::InvertedTimestamps => write!(f, "stop time precedes start time"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<SnapshotError> for Error {
    fn from(e: SnapshotError) -> Self {
        Self::Snapshot(e)
    }
}

// ---------------------------------------------------------------------------
// Storage I/O errors
// ---------------------------------------------------------------------------

/// Failures from the storage collaborator. Logged by the caller; a failed
/// persist never blocks a transition (degraded durability, not degraded
/// correctness for the live session).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoError {
    /// Backing medium could not be read.
    ReadFailed,
    /// Backing medium could not be written.
    WriteFailed,
    /// Stored blob exists but failed deserialization.
    Corrupted,
    /// Backing medium is not present or not mounted.
    Unavailable,
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed => write!(f, "read failed"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::Corrupted => write!(f, "stored data corrupted"),
            Self::Unavailable => write!(f, "storage unavailable"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Self::Storage(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
