//! PollStore port - 正本（source of truth）of poll snapshots.
//!
//! The store hands out snapshots together with a version token and accepts
//! partial updates (`PollPatch`) conditioned on that token. A moved version
//! is reported as `StoreError::Conflict`; callers must then re-read and decide
//! again instead of re-sending the stale patch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::errors::{Classify, ErrorKind};
use crate::domain::ids::PollId;
use crate::domain::poll::{ConditionState, PollSnapshot, PollStatus};
use crate::domain::voter::VoterSet;

/// A value read from the store plus the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    pub version: u64,
    pub value: T,
}

/// Fields of `PollStatus` to overwrite. `None` leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollPatch {
    pub voters: Option<VoterSet>,
    pub last_notification_time: Option<DateTime<Utc>>,
    pub finalized: Option<bool>,
    pub condition: Option<ConditionState>,
}

impl PollPatch {
    /// The smallest patch turning `before` into `after`.
    pub fn between(before: &PollStatus, after: &PollStatus) -> Self {
        Self {
            voters: (before.voters != after.voters).then(|| after.voters.clone()),
            last_notification_time: if before.last_notification_time != after.last_notification_time {
                after.last_notification_time
            } else {
                None
            },
            finalized: (before.finalized != after.finalized).then_some(after.finalized),
            condition: (before.condition != after.condition).then_some(after.condition),
        }
    }

    pub fn voters(voters: VoterSet) -> Self {
        Self {
            voters: Some(voters),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply to a stored status.
    ///
    /// Store implementations go through this so the monotonic fields hold
    /// whatever a caller sends: `finalized` never goes back to false and
    /// `last_notification_time` never moves backwards.
    pub fn apply_to(&self, status: &mut PollStatus) {
        if let Some(voters) = &self.voters {
            status.voters = voters.clone();
        }
        if let Some(sent_at) = self.last_notification_time
            && status.last_notification_time.is_none_or(|prev| sent_at > prev)
        {
            status.last_notification_time = Some(sent_at);
        }
        if self.finalized == Some(true) {
            status.finalized = true;
        }
        if let Some(condition) = self.condition {
            status.condition = condition;
        }
        if status.finalized {
            status.condition = ConditionState::Closed;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("poll {0} not found")]
    NotFound(PollId),

    #[error("poll {id} changed concurrently (expected version {expected}, found {actual})")]
    Conflict { id: PollId, expected: u64, actual: u64 },

    #[error("store backend error: {0}")]
    Backend(String),
}

impl Classify for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Conflict { .. } => ErrorKind::Conflict,
            StoreError::Backend(_) => ErrorKind::Transient,
        }
    }
}

/// PollStore は poll snapshot の正本
///
/// # 設計原則
/// - `patch` is conditional on the version returned by `get`
/// - only status fields are patchable; id, creation time and spec are immutable
#[async_trait]
pub trait PollStore: Send + Sync {
    async fn get(&self, id: PollId) -> Result<Versioned<PollSnapshot>, StoreError>;

    /// Returns the new version on success.
    async fn patch(
        &self,
        id: PollId,
        expected_version: u64,
        patch: PollPatch,
    ) -> Result<u64, StoreError>;

    /// Ids of every stored poll, finalized ones included.
    async fn list(&self) -> Result<Vec<PollId>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::VoterId;
    use crate::domain::voter::Choice;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    #[test]
    fn identical_statuses_give_an_empty_patch() {
        let status = PollStatus::default();
        assert!(PollPatch::between(&status, &status.clone()).is_empty());
    }

    #[test]
    fn patch_carries_only_changed_fields() {
        let before = PollStatus::default();
        let mut after = before.clone();
        after.last_notification_time = Some(t(10));

        let patch = PollPatch::between(&before, &after);
        assert_eq!(patch.last_notification_time, Some(t(10)));
        assert_eq!(patch.voters, None);
        assert_eq!(patch.finalized, None);
        assert_eq!(patch.condition, None);
    }

    #[test]
    fn applying_the_diff_reproduces_the_target() {
        let mut before = PollStatus::default();
        before.voters.record(VoterId::new("a"), Choice::Yes);
        let mut after = PollStatus::default();
        after.finalized = true;
        after.condition = ConditionState::Closed;

        let mut stored = before.clone();
        PollPatch::between(&before, &after).apply_to(&mut stored);
        assert_eq!(stored, after);
    }

    #[test]
    fn finalized_cannot_be_unset_through_a_patch() {
        let mut status = PollStatus {
            finalized: true,
            condition: ConditionState::Closed,
            ..PollStatus::default()
        };
        let patch = PollPatch {
            finalized: Some(false),
            condition: Some(ConditionState::Pending),
            ..PollPatch::default()
        };
        patch.apply_to(&mut status);
        assert!(status.finalized);
        assert_eq!(status.condition, ConditionState::Closed);
    }

    #[test]
    fn notification_time_only_moves_forward() {
        let mut status = PollStatus {
            last_notification_time: Some(t(100)),
            ..PollStatus::default()
        };
        PollPatch {
            last_notification_time: Some(t(50)),
            ..PollPatch::default()
        }
        .apply_to(&mut status);
        assert_eq!(status.last_notification_time, Some(t(100)));

        PollPatch {
            last_notification_time: Some(t(1000)),
            ..PollPatch::default()
        }
        .apply_to(&mut status);
        assert_eq!(status.last_notification_time, Some(t(1000)));
    }

    #[test]
    fn store_errors_are_classified() {
        let id = PollId::from_ulid(ulid::Ulid::new());
        assert_eq!(StoreError::NotFound(id).kind(), ErrorKind::NotFound);
        let conflict = StoreError::Conflict { id, expected: 1, actual: 2 };
        assert_eq!(conflict.kind(), ErrorKind::Conflict);
        assert!(conflict.is_retryable());
        assert!(StoreError::Backend("down".into()).is_retryable());
    }
}
