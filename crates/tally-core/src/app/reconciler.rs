//! Reconciler - one read/decide/write/dispatch pass over a single poll
//!
//! # フロー
//! 1. PollStore::get() で snapshot と version を取得
//! 2. RosterResolver::resolve() で有権者リストを取得（失敗時は Unavailable）
//! 3. Decider::decide() で次の snapshot と actions を計算
//! 4. PollStore::patch() で差分を書き込み（version 不一致なら再読込して再試行）
//! 5. 書き込み成功後に reminder / result を送信
//!
//! 送信は書き込みの後。送信失敗は記録するだけで、状態は巻き戻さない。

use std::sync::Arc;

use serde::Serialize;

use crate::app::config::ReconcilerConfig;
use crate::app::poll_locks::PollLocks;
use crate::domain::decision::{Action, Anomaly, Decider, Decision, LifecycleDecider};
use crate::domain::due::DueReason;
use crate::domain::errors::{Classify, ErrorKind};
use crate::domain::ids::PollId;
use crate::domain::message::{Message, Recipient};
use crate::domain::poll::{ConditionState, PollSnapshot};
use crate::domain::roster::Roster;
use crate::ports::{Clock, Notifier, PollPatch, PollStore, RosterResolver, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("poll {id} kept changing underneath us; gave up after {attempts} attempts")]
    ConflictRetriesExhausted { id: PollId, attempts: u32 },
}

impl Classify for ReconcileError {
    fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::Store(e) => e.kind(),
            ReconcileError::ConflictRetriesExhausted { .. } => ErrorKind::Conflict,
        }
    }
}

/// What one pass did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub poll_id: PollId,
    pub condition: ConditionState,

    /// Set when this pass closed the poll.
    pub due: Option<DueReason>,

    /// The snapshot changed and was written back.
    pub written: bool,

    /// Writes rejected because of a concurrent change before this one went through.
    pub conflicts: u32,

    pub reminders_sent: usize,
    pub reminders_failed: usize,

    /// `Some(true)` when a result message went out, `Some(false)` when it failed.
    pub result_delivered: Option<bool>,

    pub anomalies: Vec<Anomaly>,
}

pub struct Reconciler {
    store: Arc<dyn PollStore>,
    roster: Arc<dyn RosterResolver>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    decider: LifecycleDecider,
    locks: Arc<PollLocks>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn PollStore>,
        roster: Arc<dyn RosterResolver>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        locks: Arc<PollLocks>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            store,
            roster,
            notifier,
            clock,
            decider: LifecycleDecider::new(config.engine()),
            locks,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn PollStore> {
        &self.store
    }

    #[tracing::instrument(level = "debug", skip(self, id), fields(poll_id = %id))]
    pub async fn reconcile(&self, id: PollId) -> Result<ReconcileReport, ReconcileError> {
        let _guard = self.locks.lock(id).await;

        let mut conflicts = 0;
        loop {
            let current = self.store.get(id).await?;
            let roster = self.resolve_roster(&current.value).await;
            let now = self.clock.now();
            let decision = self.decider.decide(&current.value, now, &roster);

            let patch = PollPatch::between(&current.value.status, &decision.snapshot.status);
            let written = !patch.is_empty();
            if written {
                match self.store.patch(id, current.version, patch).await {
                    Ok(_) => {}
                    Err(StoreError::Conflict { expected, actual, .. }) => {
                        conflicts += 1;
                        if conflicts > self.config.max_conflict_retries {
                            return Err(ReconcileError::ConflictRetriesExhausted {
                                id,
                                attempts: conflicts,
                            });
                        }
                        tracing::debug!(expected, actual, "write conflict, re-reading poll");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            return Ok(self.dispatch(id, decision, written, conflicts).await);
        }
    }

    async fn resolve_roster(&self, poll: &PollSnapshot) -> Roster {
        // 終了済みの poll は roster を参照しない
        if poll.is_finalized() {
            return Roster::Unavailable;
        }
        match self.roster.resolve(&poll.spec.group).await {
            Ok(members) => Roster::resolved(members),
            Err(e) => {
                tracing::warn!(
                    group = %poll.spec.group,
                    kind = ?e.kind(),
                    error = %e,
                    "roster lookup failed, evaluating without quorum"
                );
                Roster::Unavailable
            }
        }
    }

    async fn dispatch(
        &self,
        id: PollId,
        decision: Decision,
        written: bool,
        conflicts: u32,
    ) -> ReconcileReport {
        let mut report = ReconcileReport {
            poll_id: id,
            condition: decision.condition(),
            due: decision.due,
            written,
            conflicts,
            reminders_sent: 0,
            reminders_failed: 0,
            result_delivered: None,
            anomalies: decision.anomalies.clone(),
        };

        for anomaly in &decision.anomalies {
            // the unavailable roster was already logged with its cause
            if *anomaly != Anomaly::RosterUnavailable {
                tracing::warn!(?anomaly, "poll data anomaly");
            }
        }

        if decision.is_noop() {
            tracing::debug!(condition = ?report.condition, "nothing to do");
            return report;
        }

        for action in decision.actions {
            match action {
                Action::Reminder(reminder) => {
                    let message = Message::Reminder(reminder.message);
                    for voter in reminder.recipients {
                        let recipient = Recipient::Voter(voter);
                        match self.notifier.send(&recipient, &message).await {
                            Ok(()) => report.reminders_sent += 1,
                            Err(e) => {
                                report.reminders_failed += 1;
                                tracing::warn!(%recipient, error = %e, "reminder delivery failed");
                            }
                        }
                    }
                    tracing::info!(
                        sent = report.reminders_sent,
                        failed = report.reminders_failed,
                        "reminder round"
                    );
                }
                Action::Finalize(finalized) => {
                    let group = self
                        .config
                        .results_channel
                        .clone()
                        .unwrap_or_else(|| decision.snapshot.spec.group.clone());
                    let recipient = Recipient::Group(group);
                    let delivered = match self
                        .notifier
                        .send(&recipient, &Message::Result(finalized.message))
                        .await
                    {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!(%recipient, error = %e, "result delivery failed");
                            false
                        }
                    };
                    report.result_delivered = Some(delivered);
                    tracing::info!(
                        reason = ?report.due,
                        yes = finalized.tally.yes,
                        no = finalized.tally.no,
                        "poll finalized"
                    );
                }
            }
        }

        report
    }
}
