//! Due/completion evaluation: is it time to close the poll?

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::poll::PollSnapshot;

/// Why a poll became due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueReason {
    /// `now` reached `created_at + due_order_time`.
    Deadline,

    /// Every eligible voter has answered before the deadline.
    Quorum,
}

/// Decide whether the poll is due, and why.
///
/// The deadline is checked first so that it stays the safety net when the
/// participation numbers cannot be trusted. Full participation only counts
/// against a known, non-empty roster: `eligible_count == None` (lookup failed)
/// or `Some(0)` never closes a poll on its own.
pub fn due_reason(
    snapshot: &PollSnapshot,
    now: DateTime<Utc>,
    eligible_count: Option<usize>,
) -> Option<DueReason> {
    if let Some(deadline) = snapshot.deadline()
        && now >= deadline
    {
        return Some(DueReason::Deadline);
    }
    match eligible_count {
        Some(eligible) if eligible > 0 && snapshot.status.voters.count_voted() == eligible => {
            Some(DueReason::Quorum)
        }
        _ => None,
    }
}

pub fn is_due(snapshot: &PollSnapshot, now: DateTime<Utc>, eligible_count: Option<usize>) -> bool {
    due_reason(snapshot, now, eligible_count).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{GroupId, PollId, VoterId};
    use crate::domain::poll::{DueOrderTime, PollSpec};
    use crate::domain::voter::Choice;
    use chrono::{Duration, TimeZone};
    use rstest::rstest;
    use ulid::Ulid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap()
    }

    fn poll(due_secs: u64, votes: &[(&str, Choice)]) -> PollSnapshot {
        let spec = PollSpec::new("lunch", GroupId::new("C1"), DueOrderTime::from_secs(due_secs));
        let mut poll = PollSnapshot::open(PollId::from_ulid(Ulid::new()), t0(), spec);
        for (who, choice) in votes {
            poll.status.voters.record(VoterId::new(*who), *choice);
        }
        poll
    }

    #[rstest]
    #[case::before(3599, None)]
    #[case::at(3600, Some(DueReason::Deadline))]
    #[case::after(7200, Some(DueReason::Deadline))]
    fn deadline_boundary(#[case] offset: i64, #[case] expected: Option<DueReason>) {
        let poll = poll(3600, &[]);
        assert_eq!(due_reason(&poll, t0() + Duration::seconds(offset), Some(3)), expected);
    }

    #[test]
    fn full_participation_beats_deadline() {
        let poll = poll(3600, &[("a", Choice::Yes), ("b", Choice::No), ("c", Choice::Yes)]);
        assert_eq!(
            due_reason(&poll, t0() + Duration::seconds(10), Some(3)),
            Some(DueReason::Quorum)
        );
    }

    #[test]
    fn unset_entries_do_not_count_towards_quorum() {
        let poll = poll(3600, &[("a", Choice::Yes), ("b", Choice::Unset), ("c", Choice::Yes)]);
        assert!(!is_due(&poll, t0() + Duration::seconds(10), Some(3)));
    }

    #[rstest]
    #[case::empty_roster(Some(0))]
    #[case::unavailable_roster(None)]
    fn vacuous_quorum_never_closes_early(#[case] eligible: Option<usize>) {
        let poll = poll(3600, &[]);
        assert!(!is_due(&poll, t0() + Duration::seconds(10), eligible));
        assert!(is_due(&poll, t0() + Duration::seconds(3600), eligible));
    }

    #[test]
    fn more_votes_than_eligible_falls_back_to_deadline() {
        let poll = poll(3600, &[("a", Choice::Yes), ("b", Choice::Yes), ("c", Choice::No)]);
        assert!(!is_due(&poll, t0() + Duration::seconds(10), Some(2)));
        assert_eq!(
            due_reason(&poll, t0() + Duration::seconds(3600), Some(2)),
            Some(DueReason::Deadline)
        );
    }

    #[test]
    fn out_of_range_deadline_only_closes_by_quorum() {
        let open = poll(u64::MAX, &[("a", Choice::Yes)]);
        assert!(!is_due(&open, DateTime::<Utc>::MAX_UTC, Some(2)));
        assert_eq!(due_reason(&open, t0(), Some(1)), Some(DueReason::Quorum));
    }
}
