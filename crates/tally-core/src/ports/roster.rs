//! RosterResolver port - who may vote on a poll.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::errors::{Classify, ErrorKind};
use crate::domain::ids::{GroupId, VoterId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("roster lookup for group {group} failed: {reason}")]
    Lookup { group: GroupId, reason: String },

    #[error("group {0} does not exist")]
    UnknownGroup(GroupId),
}

impl Classify for RosterError {
    fn kind(&self) -> ErrorKind {
        match self {
            RosterError::Lookup { .. } => ErrorKind::Transient,
            RosterError::UnknownGroup(_) => ErrorKind::Permanent,
        }
    }
}

/// Resolves the current human members of a group.
///
/// Implementations drop automated accounts before returning. A failed lookup
/// must surface as an error, never as an empty list.
#[async_trait]
pub trait RosterResolver: Send + Sync {
    async fn resolve(&self, group: &GroupId) -> Result<Vec<VoterId>, RosterError>;
}
