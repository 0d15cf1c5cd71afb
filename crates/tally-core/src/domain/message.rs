//! Message payloads handed to the notifier, and the final tally they carry.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ids::{GroupId, PollId, VoterId};
use super::poll::PollSnapshot;
use super::voter::{Choice, Vote, VoterSet};

/// Final count of a poll, captured before the vote set is cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub yes: usize,
    pub no: usize,

    /// Every recorded vote (including unset ones), ordered by identity.
    pub ballots: Vec<Vote>,
}

impl Tally {
    pub fn of(voters: &VoterSet) -> Self {
        Self {
            yes: voters.count(Choice::Yes),
            no: voters.count(Choice::No),
            ballots: voters.votes().collect(),
        }
    }
}

/// Where a message goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    /// Direct message to one voter.
    Voter(VoterId),

    /// Post to a group channel.
    Group(GroupId),
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recipient::Voter(v) => write!(f, "voter:{v}"),
            Recipient::Group(g) => write!(f, "group:{g}"),
        }
    }
}

/// Ask a voter to answer. The poll id doubles as the callback id the answer refers back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderMessage {
    pub poll_id: PollId,
    pub title: String,
    pub text: String,
    pub options: Vec<Choice>,
}

impl ReminderMessage {
    pub fn for_poll(poll: &PollSnapshot) -> Self {
        Self {
            poll_id: poll.id,
            title: poll.spec.title.clone(),
            text: poll.spec.messages.question.clone(),
            options: vec![Choice::Yes, Choice::No],
        }
    }
}

/// Closing message with the final count and who answered what.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultMessage {
    pub poll_id: PollId,
    pub title: String,
    pub text: String,
}

impl ResultMessage {
    pub fn for_poll(poll: &PollSnapshot, tally: &Tally) -> Self {
        let details = tally
            .ballots
            .iter()
            .map(|b| format!("{}: {}", b.identity, b.choice))
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            poll_id: poll.id,
            title: poll.spec.title.clone(),
            text: format!(
                "*{}*\nApproved: *{}*\n\n*Voter Details:*\n{}",
                poll.spec.messages.result, tally.yes, details
            ),
        }
    }
}

/// Sent back to a voter once their answer is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckMessage {
    pub poll_id: PollId,
    pub text: String,
}

impl AckMessage {
    pub fn for_vote(poll: &PollSnapshot, choice: Choice) -> Self {
        Self {
            poll_id: poll.id,
            text: format!("{}\n Selected: {}", poll.spec.messages.response, choice),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Reminder(ReminderMessage),
    Result(ResultMessage),
    Ack(AckMessage),
}

impl Message {
    pub fn poll_id(&self) -> PollId {
        match self {
            Message::Reminder(m) => m.poll_id,
            Message::Result(m) => m.poll_id,
            Message::Ack(m) => m.poll_id,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Message::Reminder(m) => &m.text,
            Message::Result(m) => &m.text,
            Message::Ack(m) => &m.text,
        }
    }
}
