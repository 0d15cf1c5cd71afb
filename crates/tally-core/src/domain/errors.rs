//! Errors - classification of collaborator failures.
//!
//! The engine itself never fails. Everything that can go wrong happens in a
//! port adapter, and the application layer only needs to know which bucket a
//! failure falls into to pick its reaction.

/// ErrorKind is the operational classification of a collaborator failure.
///
/// - Transient: retry later (the next reconciliation pass will).
/// - Conflict: the snapshot moved underneath us; re-read and decide again.
/// - NotFound: the poll does not exist (any more).
/// - Permanent: retrying will not help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transient,
    Conflict,
    NotFound,
    Permanent,
}

/// Implemented by every port error so callers can react by kind.
pub trait Classify {
    fn kind(&self) -> ErrorKind;

    fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient | ErrorKind::Conflict)
    }
}
