//! Decision model: what one reconciliation pass should do with a poll.
//!
//! This module defines the Decision type (next snapshot + actions) and the
//! Decider trait (how to compute it from the observed snapshot, the time and
//! the roster). Deciders are pure: the caller persists the snapshot and
//! executes the actions.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::due::{DueReason, due_reason};
use super::finalize::{FinalizeAction, finalize};
use super::ids::VoterId;
use super::message::ReminderMessage;
use super::poll::{ConditionState, PollSnapshot};
use super::roster::Roster;
use super::throttle::{DEFAULT_NOTIFY_WINDOW, should_notify};

/// Ask the outstanding voters to answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderAction {
    pub recipients: Vec<VoterId>,
    pub message: ReminderMessage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Reminder(ReminderAction),
    Finalize(FinalizeAction),
}

/// Data-quality observations. None of them stops the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "anomaly", rename_all = "snake_case")]
pub enum Anomaly {
    /// The roster lookup failed; only the deadline can close the poll this pass.
    RosterUnavailable,

    /// More answers than eligible voters; quorum is ignored, the deadline decides.
    MoreVotesThanEligible { voted: usize, eligible: usize },

    /// `created_at + due_order_time` is not representable; only quorum can close the poll.
    DeadlineOutOfRange { due_order_secs: u64 },

    /// Stored condition says Closed but the poll was never finalized.
    ClosedWithoutFinalize,
}

/// Result of one pass: the snapshot to write back and the actions to run after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub snapshot: PollSnapshot,
    pub actions: Vec<Action>,

    /// Set when this pass closed the poll.
    pub due: Option<DueReason>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<Anomaly>,
}

impl Decision {
    pub fn condition(&self) -> ConditionState {
        self.snapshot.status.condition
    }

    pub fn reminder(&self) -> Option<&ReminderAction> {
        self.actions.iter().find_map(|a| match a {
            Action::Reminder(r) => Some(r),
            _ => None,
        })
    }

    pub fn finalization(&self) -> Option<&FinalizeAction> {
        self.actions.iter().find_map(|a| match a {
            Action::Finalize(f) => Some(f),
            _ => None,
        })
    }

    pub fn is_noop(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Knobs of the pure engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Minimum interval between two reminder rounds.
    pub notify_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            notify_window: DEFAULT_NOTIFY_WINDOW,
        }
    }
}

/// Trait for deciding the next step of a poll.
///
/// Implementations must be pure: the same inputs always give the same
/// `Decision`, and nothing outside the returned value is touched.
pub trait Decider: Send + Sync {
    fn decide(&self, snapshot: &PollSnapshot, now: DateTime<Utc>, roster: &Roster) -> Decision;
}

/// The poll lifecycle state machine.
///
/// - Closed (finalized): no actions, condition reaffirmed as `Closed`.
/// - Pending, due: finalize once, emit `Action::Finalize`.
/// - Pending, not due: emit `Action::Reminder` when the throttle allows a round
///   and somebody is still outstanding; the round advances
///   `last_notification_time`.
#[derive(Debug, Clone, Default)]
pub struct LifecycleDecider {
    config: EngineConfig,
}

impl LifecycleDecider {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Decider for LifecycleDecider {
    fn decide(&self, snapshot: &PollSnapshot, now: DateTime<Utc>, roster: &Roster) -> Decision {
        if snapshot.status.finalized {
            let mut next = snapshot.clone();
            next.status.condition = ConditionState::Closed;
            return Decision {
                snapshot: next,
                actions: Vec::new(),
                due: None,
                anomalies: Vec::new(),
            };
        }

        let anomalies = observe_anomalies(snapshot, roster);
        let eligible = match roster.eligible_count() {
            Some(n) if snapshot.status.voters.count_voted() > n => None,
            other => other,
        };

        if let Some(reason) = due_reason(snapshot, now, eligible) {
            let (next, action) = finalize(snapshot);
            return Decision {
                snapshot: next,
                actions: action.map(Action::Finalize).into_iter().collect(),
                due: Some(reason),
                anomalies,
            };
        }

        let mut next = snapshot.clone();
        next.status.condition = ConditionState::Pending;
        let mut actions = Vec::new();

        if let Some(sent_at) = should_notify(snapshot, now, self.config.notify_window) {
            let recipients = roster.outstanding(&snapshot.status.voters);
            if !recipients.is_empty() {
                next.status.last_notification_time = Some(sent_at);
                actions.push(Action::Reminder(ReminderAction {
                    recipients,
                    message: ReminderMessage::for_poll(snapshot),
                }));
            }
        }

        Decision {
            snapshot: next,
            actions,
            due: None,
            anomalies,
        }
    }
}

fn observe_anomalies(snapshot: &PollSnapshot, roster: &Roster) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    if snapshot.status.condition == ConditionState::Closed {
        anomalies.push(Anomaly::ClosedWithoutFinalize);
    }
    if snapshot.deadline().is_none() {
        anomalies.push(Anomaly::DeadlineOutOfRange {
            due_order_secs: snapshot.spec.due_order_time.as_secs(),
        });
    }
    match roster.eligible_count() {
        None => anomalies.push(Anomaly::RosterUnavailable),
        Some(eligible) => {
            let voted = snapshot.status.voters.count_voted();
            if voted > eligible {
                anomalies.push(Anomaly::MoreVotesThanEligible { voted, eligible });
            }
        }
    }
    anomalies
}
