//! BallotBox - 投票の受付
//!
//! 投票者の回答を poll の voter set に書き込み、本人に受付メッセージを返す。
//! 終了済みの poll への投票はエラーとして返す（黙って捨てない）。

use std::sync::Arc;

use crate::app::poll_locks::PollLocks;
use crate::domain::errors::{Classify, ErrorKind};
use crate::domain::ids::{PollId, VoterId};
use crate::domain::message::{AckMessage, Message, Recipient};
use crate::domain::voter::Choice;
use crate::ports::{Notifier, PollPatch, PollStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    #[error("poll {0} is closed")]
    PollClosed(PollId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("poll {id} kept changing underneath us; gave up after {attempts} attempts")]
    ConflictRetriesExhausted { id: PollId, attempts: u32 },
}

impl Classify for VoteError {
    fn kind(&self) -> ErrorKind {
        match self {
            VoteError::PollClosed(_) => ErrorKind::Permanent,
            VoteError::Store(e) => e.kind(),
            VoteError::ConflictRetriesExhausted { .. } => ErrorKind::Conflict,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastReceipt {
    /// The voter's choice before this cast (`Unset` if they had none).
    pub previous: Choice,
    pub acknowledged: bool,
}

pub struct BallotBox {
    store: Arc<dyn PollStore>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<PollLocks>,
    max_conflict_retries: u32,
}

impl BallotBox {
    pub fn new(
        store: Arc<dyn PollStore>,
        notifier: Arc<dyn Notifier>,
        locks: Arc<PollLocks>,
        max_conflict_retries: u32,
    ) -> Self {
        Self {
            store,
            notifier,
            locks,
            max_conflict_retries,
        }
    }

    /// Record `voter`'s answer. `Choice::Unset` withdraws a previous answer.
    #[tracing::instrument(level = "debug", skip(self, id, voter), fields(poll_id = %id, voter = %voter))]
    pub async fn cast(
        &self,
        id: PollId,
        voter: VoterId,
        choice: Choice,
    ) -> Result<CastReceipt, VoteError> {
        let _guard = self.locks.lock(id).await;

        let mut conflicts = 0;
        let (poll, previous) = loop {
            let current = self.store.get(id).await?;
            if current.value.is_finalized() {
                return Err(VoteError::PollClosed(id));
            }

            let mut voters = current.value.status.voters.clone();
            let previous = voters.record(voter.clone(), choice).unwrap_or_default();
            match self
                .store
                .patch(id, current.version, PollPatch::voters(voters))
                .await
            {
                Ok(_) => break (current.value, previous),
                Err(StoreError::Conflict { .. }) => {
                    conflicts += 1;
                    if conflicts > self.max_conflict_retries {
                        return Err(VoteError::ConflictRetriesExhausted {
                            id,
                            attempts: conflicts,
                        });
                    }
                }
                Err(e) => return Err(e.into()),
            }
        };
        tracing::info!(%choice, %previous, "vote recorded");

        let ack = Message::Ack(AckMessage::for_vote(&poll, choice));
        let recipient = Recipient::Voter(voter);
        let acknowledged = match self.notifier.send(&recipient, &ack).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(%recipient, error = %e, "vote acknowledgement failed");
                false
            }
        };

        Ok(CastReceipt {
            previous,
            acknowledged,
        })
    }
}
