//! Poll record: immutable spec + mutable status, read and replaced as one snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{GroupId, PollId};
use super::voter::VoterSet;

/// Time allowed for voting, in seconds counted from `created_at`.
///
/// Absolute deadlines are converted with [`DueOrderTime::from_deadline`] at
/// the store boundary; the engine only ever sees the relative form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DueOrderTime(u64);

impl DueOrderTime {
    pub fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    /// Convert an absolute deadline. A deadline before `created_at` means "already due".
    pub fn from_deadline(created_at: DateTime<Utc>, deadline: DateTime<Utc>) -> Self {
        let secs = (deadline - created_at).num_seconds();
        Self(u64::try_from(secs).unwrap_or(0))
    }

    pub fn as_secs(self) -> u64 {
        self.0
    }

    /// `created_at + self`, or `None` when the sum leaves the representable range.
    pub fn deadline_from(self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.0).ok()?;
        let delta = chrono::Duration::try_seconds(secs)?;
        created_at.checked_add_signed(delta)
    }
}

/// Texts shown to voters. Defaults keep a poll usable without any configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollMessages {
    /// Body of the reminder asking a voter to answer.
    pub question: String,

    /// Acknowledgement sent back after a vote is recorded.
    pub response: String,

    /// Header of the closing message carrying the tally.
    pub result: String,
}

impl Default for PollMessages {
    fn default() -> Self {
        Self {
            question: "Please cast your vote.".to_string(),
            response: "Thanks, your vote has been recorded.".to_string(),
            result: "Poll is closed".to_string(),
        }
    }
}

/// What the poll is about and who may vote. Fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSpec {
    pub title: String,

    /// Group whose human members form the roster.
    pub group: GroupId,

    pub due_order_time: DueOrderTime,

    #[serde(default)]
    pub messages: PollMessages,
}

impl PollSpec {
    pub fn new(title: impl Into<String>, group: GroupId, due_order_time: DueOrderTime) -> Self {
        Self {
            title: title.into(),
            group,
            due_order_time,
            messages: PollMessages::default(),
        }
    }

    pub fn with_messages(mut self, messages: PollMessages) -> Self {
        self.messages = messages;
        self
    }
}

/// Sync status mirrored to the orchestrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionState {
    #[default]
    Pending,
    Closed,
}

/// Mutable part of a poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollStatus {
    pub voters: VoterSet,

    /// When the last reminder round went out; `None` means never.
    pub last_notification_time: Option<DateTime<Utc>>,

    /// Once true, never false again.
    pub finalized: bool,

    pub condition: ConditionState,
}

/// The full persisted state of one poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSnapshot {
    pub id: PollId,
    pub created_at: DateTime<Utc>,
    pub spec: PollSpec,
    #[serde(default)]
    pub status: PollStatus,
}

impl PollSnapshot {
    /// A freshly created poll: pending, nobody notified, no votes.
    pub fn open(id: PollId, created_at: DateTime<Utc>, spec: PollSpec) -> Self {
        Self {
            id,
            created_at,
            spec,
            status: PollStatus::default(),
        }
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.spec.due_order_time.deadline_from(self.created_at)
    }

    pub fn is_finalized(&self) -> bool {
        self.status.finalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ulid::Ulid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap()
    }

    #[test]
    fn open_poll_starts_pending() {
        let spec = PollSpec::new("lunch", GroupId::new("C1"), DueOrderTime::from_secs(3600));
        let poll = PollSnapshot::open(PollId::from_ulid(Ulid::new()), t0(), spec);
        assert!(!poll.is_finalized());
        assert_eq!(poll.status.condition, ConditionState::Pending);
        assert!(poll.status.voters.is_empty());
        assert_eq!(poll.status.last_notification_time, None);
        assert_eq!(
            poll.deadline(),
            Some(t0() + chrono::Duration::seconds(3600))
        );
    }

    #[test]
    fn absolute_deadline_converts_to_relative_seconds() {
        let deadline = t0() + chrono::Duration::seconds(5400);
        assert_eq!(DueOrderTime::from_deadline(t0(), deadline).as_secs(), 5400);

        let past = t0() - chrono::Duration::seconds(10);
        assert_eq!(DueOrderTime::from_deadline(t0(), past).as_secs(), 0);
    }

    #[test]
    fn out_of_range_deadline_is_none() {
        assert_eq!(DueOrderTime::from_secs(u64::MAX).deadline_from(t0()), None);
        assert_eq!(
            DueOrderTime::from_secs(i64::MAX as u64).deadline_from(t0()),
            None
        );
    }

    #[test]
    fn snapshot_without_status_deserializes_as_fresh() {
        let json = r#"
        {
          "id": "01HMZ0000000000000000000AA",
          "created_at": "2024-01-01T11:00:00Z",
          "spec": { "title": "lunch", "group": "C1", "due_order_time": 3600 }
        }"#;
        let poll: PollSnapshot = serde_json::from_str(json).expect("deserialize");
        assert_eq!(poll.status, PollStatus::default());
        assert_eq!(poll.spec.messages, PollMessages::default());
        assert_eq!(poll.created_at, t0());
    }
}
