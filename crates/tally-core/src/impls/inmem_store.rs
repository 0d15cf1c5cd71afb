//! InMemoryPollStore - 開発用の poll store
//!
//! # 学習ポイント
//! - optimistic concurrency with a per-record version counter
//! - tokio Mutex: the lock is never held across another await

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ids::PollId;
use crate::domain::poll::PollSnapshot;
use crate::ports::{PollPatch, PollStore, StoreError, Versioned};

/// InMemoryPollStore keeps every poll with a version that bumps on each write.
///
/// # 使用例
/// ```ignore
/// let store = InMemoryPollStore::new();
/// store.insert(snapshot).await;
/// let current = store.get(id).await?;
/// store.patch(id, current.version, patch).await?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryPollStore {
    polls: Arc<Mutex<HashMap<PollId, Versioned<PollSnapshot>>>>,
}

impl InMemoryPollStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new poll (or replace an existing one), returning its id.
    pub async fn insert(&self, snapshot: PollSnapshot) -> PollId {
        let id = snapshot.id;
        let mut polls = self.polls.lock().await;
        let version = polls.get(&id).map_or(1, |v| v.version + 1);
        polls.insert(
            id,
            Versioned {
                version,
                value: snapshot,
            },
        );
        id
    }

    /// Current snapshots, ordered by id.
    pub async fn snapshots(&self) -> Vec<PollSnapshot> {
        let polls = self.polls.lock().await;
        let mut all: Vec<_> = polls.values().map(|v| v.value.clone()).collect();
        all.sort_by_key(|p| p.id);
        all
    }
}

#[async_trait]
impl PollStore for InMemoryPollStore {
    async fn get(&self, id: PollId) -> Result<Versioned<PollSnapshot>, StoreError> {
        self.polls
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    async fn patch(
        &self,
        id: PollId,
        expected_version: u64,
        patch: PollPatch,
    ) -> Result<u64, StoreError> {
        let mut polls = self.polls.lock().await;
        let entry = polls.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if entry.version != expected_version {
            return Err(StoreError::Conflict {
                id,
                expected: expected_version,
                actual: entry.version,
            });
        }
        patch.apply_to(&mut entry.value.status);
        entry.version += 1;
        Ok(entry.version)
    }

    async fn list(&self) -> Result<Vec<PollId>, StoreError> {
        let mut ids: Vec<_> = self.polls.lock().await.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{GroupId, VoterId};
    use crate::domain::poll::{DueOrderTime, PollSpec};
    use crate::domain::voter::{Choice, VoterSet};
    use chrono::{TimeZone, Utc};
    use ulid::Ulid;

    fn poll() -> PollSnapshot {
        PollSnapshot::open(
            PollId::from_ulid(Ulid::new()),
            Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap(),
            PollSpec::new("lunch", GroupId::new("C1"), DueOrderTime::from_secs(3600)),
        )
    }

    #[tokio::test]
    async fn insert_then_get() {
        let store = InMemoryPollStore::new();
        let snapshot = poll();
        let id = store.insert(snapshot.clone()).await;

        let got = store.get(id).await.unwrap();
        assert_eq!(got.version, 1);
        assert_eq!(got.value, snapshot);
    }

    #[tokio::test]
    async fn missing_poll_is_not_found() {
        let store = InMemoryPollStore::new();
        let id = PollId::from_ulid(Ulid::new());
        assert_eq!(store.get(id).await, Err(StoreError::NotFound(id)));
        assert_eq!(
            store.patch(id, 1, PollPatch::default()).await,
            Err(StoreError::NotFound(id))
        );
    }

    #[tokio::test]
    async fn patch_bumps_version_and_applies_fields() {
        let store = InMemoryPollStore::new();
        let id = store.insert(poll()).await;

        let mut voters = VoterSet::new();
        voters.record(VoterId::new("alice"), Choice::Yes);
        let version = store.patch(id, 1, PollPatch::voters(voters.clone())).await.unwrap();

        assert_eq!(version, 2);
        let got = store.get(id).await.unwrap();
        assert_eq!(got.version, 2);
        assert_eq!(got.value.status.voters, voters);
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let store = InMemoryPollStore::new();
        let id = store.insert(poll()).await;
        store.patch(id, 1, PollPatch::default()).await.unwrap();

        let err = store.patch(id, 1, PollPatch::default()).await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Conflict {
                id,
                expected: 1,
                actual: 2
            }
        );
    }

    #[tokio::test]
    async fn list_returns_sorted_ids() {
        let store = InMemoryPollStore::new();
        let a = store.insert(poll()).await;
        let b = store.insert(poll()).await;
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(store.list().await.unwrap(), expected);
    }
}
