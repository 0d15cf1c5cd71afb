//! Notification throttle: at most one reminder round per window.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::poll::PollSnapshot;

/// Reference cool-down between two reminder rounds.
pub const DEFAULT_NOTIFY_WINDOW: Duration = Duration::from_secs(900);

/// Returns the new `last_notification_time` if a round is due, `None` otherwise.
///
/// A round is due when nothing was ever sent, or when `now >= last + window`.
/// A window (or a `last + window`) that does not fit in the time range never
/// elapses. Since the returned time is `now` and `now >= last`, the stored
/// time only moves forward.
pub fn should_notify(
    snapshot: &PollSnapshot,
    now: DateTime<Utc>,
    window: Duration,
) -> Option<DateTime<Utc>> {
    let Some(last) = snapshot.status.last_notification_time else {
        return Some(now);
    };
    let next = chrono::Duration::from_std(window)
        .ok()
        .and_then(|w| last.checked_add_signed(w))?;
    (now >= next).then_some(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{GroupId, PollId};
    use crate::domain::poll::{DueOrderTime, PollSpec};
    use chrono::TimeZone;
    use rstest::rstest;
    use ulid::Ulid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap()
    }

    fn poll(last: Option<DateTime<Utc>>) -> PollSnapshot {
        let spec = PollSpec::new("lunch", GroupId::new("C1"), DueOrderTime::from_secs(3600));
        let mut poll = PollSnapshot::open(PollId::from_ulid(Ulid::new()), t0(), spec);
        poll.status.last_notification_time = last;
        poll
    }

    #[test]
    fn never_sent_is_due_immediately() {
        let now = t0() + chrono::Duration::seconds(10);
        assert_eq!(should_notify(&poll(None), now, DEFAULT_NOTIFY_WINDOW), Some(now));
    }

    #[rstest]
    #[case::same_instant(0, false)]
    #[case::inside(100, false)]
    #[case::last_second(899, false)]
    #[case::boundary(900, true)]
    #[case::later(1000, true)]
    fn window_is_half_open(#[case] offset: i64, #[case] due: bool) {
        let last = t0();
        let now = last + chrono::Duration::seconds(offset);
        let got = should_notify(&poll(Some(last)), now, DEFAULT_NOTIFY_WINDOW);
        assert_eq!(got.is_some(), due);
        if due {
            assert_eq!(got, Some(now));
        }
    }

    #[test]
    fn clock_going_backwards_does_not_rewind() {
        let last = t0() + chrono::Duration::seconds(5000);
        assert_eq!(should_notify(&poll(Some(last)), t0(), DEFAULT_NOTIFY_WINDOW), None);
    }

    #[test]
    fn custom_window_is_honoured() {
        let last = t0();
        let window = Duration::from_secs(60);
        assert!(should_notify(&poll(Some(last)), last + chrono::Duration::seconds(59), window).is_none());
        assert!(should_notify(&poll(Some(last)), last + chrono::Duration::seconds(60), window).is_some());
    }

    #[test]
    fn oversized_window_never_elapses() {
        let last = t0();
        assert!(should_notify(&poll(Some(last)), DateTime::<Utc>::MAX_UTC, Duration::MAX).is_none());
    }
}
