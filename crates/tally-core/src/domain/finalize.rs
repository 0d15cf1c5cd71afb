//! Finalization guard: the one-shot transition that closes a poll.

use serde::{Deserialize, Serialize};

use super::message::{ResultMessage, Tally};
use super::poll::{ConditionState, PollSnapshot};

/// Everything the caller needs to announce the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeAction {
    pub tally: Tally,
    pub message: ResultMessage,
}

/// Close the poll if it is not closed yet.
///
/// On an already finalized snapshot this returns it unchanged together with
/// `None`, however many times it is called. Otherwise the tally is captured,
/// the vote set cleared, `finalized` set and the condition moved to `Closed`.
pub fn finalize(snapshot: &PollSnapshot) -> (PollSnapshot, Option<FinalizeAction>) {
    if snapshot.status.finalized {
        return (snapshot.clone(), None);
    }

    let tally = Tally::of(&snapshot.status.voters);
    let message = ResultMessage::for_poll(snapshot, &tally);

    let mut next = snapshot.clone();
    next.status.voters.clear();
    next.status.finalized = true;
    next.status.condition = ConditionState::Closed;

    (next, Some(FinalizeAction { tally, message }))
}
