//! Recorded votes: per-voter choices and the tally bookkeeping over them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ids::VoterId;

/// A voter's answer. `Unset` means "asked but not (or no longer) answered".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice {
    #[default]
    #[serde(alias = "")]
    Unset,
    #[serde(alias = "Yes")]
    Yes,
    #[serde(alias = "No")]
    No,
}

impl Choice {
    pub fn is_set(self) -> bool {
        self != Choice::Unset
    }

    /// Label shown to humans (matches the option values offered in reminders).
    pub fn label(self) -> &'static str {
        match self {
            Choice::Unset => "-",
            Choice::Yes => "Yes",
            Choice::No => "No",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown choice '{0}' (expected yes, no or unset)")]
pub struct ParseChoiceError(String);

impl FromStr for Choice {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Choice::Yes),
            "no" => Ok(Choice::No),
            "" | "unset" | "cancel" => Ok(Choice::Unset),
            _ => Err(ParseChoiceError(s.to_string())),
        }
    }
}

/// One `{identity, choice}` pair, the persisted shape of a vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub identity: VoterId,
    #[serde(default)]
    pub choice: Choice,
}

/// The set of recorded votes of a poll, unique by identity.
///
/// Stored ordered by identity so that two snapshots holding the same votes are
/// equal and serialize identically, whatever order the votes arrived in.
/// Duplicate identities in persisted input collapse to the last entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Vote>", into = "Vec<Vote>")]
pub struct VoterSet {
    choices: BTreeMap<VoterId, Choice>,
}

impl VoterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Upsert a voter's choice, returning the previous one if the voter was known.
    pub fn record(&mut self, identity: VoterId, choice: Choice) -> Option<Choice> {
        self.choices.insert(identity, choice)
    }

    /// The recorded choice of `identity`; an unknown voter has not voted.
    pub fn choice_of(&self, identity: &VoterId) -> Choice {
        self.choices.get(identity).copied().unwrap_or_default()
    }

    /// Number of voters with a non-unset choice.
    pub fn count_voted(&self) -> usize {
        self.choices.values().filter(|c| c.is_set()).count()
    }

    pub fn count(&self, choice: Choice) -> usize {
        self.choices.values().filter(|&&c| c == choice).count()
    }

    pub fn votes(&self) -> impl Iterator<Item = Vote> + '_ {
        self.choices.iter().map(|(identity, &choice)| Vote {
            identity: identity.clone(),
            choice,
        })
    }

    /// Drop every recorded vote. Only finalization does this.
    pub(crate) fn clear(&mut self) {
        self.choices.clear();
    }
}

impl From<Vec<Vote>> for VoterSet {
    fn from(votes: Vec<Vote>) -> Self {
        votes.into_iter().collect()
    }
}

impl From<VoterSet> for Vec<Vote> {
    fn from(set: VoterSet) -> Self {
        set.votes().collect()
    }
}

impl FromIterator<Vote> for VoterSet {
    fn from_iter<I: IntoIterator<Item = Vote>>(iter: I) -> Self {
        let mut set = VoterSet::new();
        for vote in iter {
            set.record(vote.identity, vote.choice);
        }
        set
    }
}
