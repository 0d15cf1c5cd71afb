//! Eligible voters as seen by one reconciliation pass.

use std::collections::BTreeSet;

use super::ids::VoterId;
use super::voter::VoterSet;

/// The roster handed to the engine. Never persisted.
///
/// `Unavailable` is what a caller passes when the membership lookup failed.
/// It is deliberately distinct from an empty resolved roster so that a
/// lookup error can never read as "everybody has voted".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Roster {
    Resolved(Vec<VoterId>),
    Unavailable,
}

impl Roster {
    /// Build a resolved roster, dropping repeated identities (first occurrence wins).
    pub fn resolved(members: impl IntoIterator<Item = VoterId>) -> Self {
        let mut seen = BTreeSet::new();
        let members = members
            .into_iter()
            .filter(|m| seen.insert(m.clone()))
            .collect();
        Roster::Resolved(members)
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Roster::Resolved(_))
    }

    /// Number of distinct eligible voters, `None` when the roster is unknown.
    pub fn eligible_count(&self) -> Option<usize> {
        match self {
            Roster::Resolved(members) => Some(members.iter().collect::<BTreeSet<_>>().len()),
            Roster::Unavailable => None,
        }
    }

    /// Members that have not answered yet, in roster order.
    pub fn outstanding(&self, voters: &VoterSet) -> Vec<VoterId> {
        let Roster::Resolved(members) = self else {
            return Vec::new();
        };
        let mut seen = BTreeSet::new();
        members
            .iter()
            .filter(|m| seen.insert(*m))
            .filter(|m| !voters.choice_of(m).is_set())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voter::{Choice, Vote};

    fn ids(names: &[&str]) -> Vec<VoterId> {
        names.iter().map(|n| VoterId::new(*n)).collect()
    }

    #[test]
    fn resolved_roster_drops_duplicates() {
        let roster = Roster::resolved(ids(&["a", "b", "a", "c"]));
        assert_eq!(roster, Roster::Resolved(ids(&["a", "b", "c"])));
        assert_eq!(roster.eligible_count(), Some(3));
    }

    #[test]
    fn eligible_count_is_robust_to_raw_duplicates() {
        let roster = Roster::Resolved(ids(&["a", "a"]));
        assert_eq!(roster.eligible_count(), Some(1));
        assert_eq!(roster.outstanding(&VoterSet::new()), ids(&["a"]));
    }

    #[test]
    fn unavailable_roster_has_no_count_and_no_recipients() {
        assert_eq!(Roster::Unavailable.eligible_count(), None);
        assert!(Roster::Unavailable.outstanding(&VoterSet::new()).is_empty());
        assert!(!Roster::Unavailable.is_available());
    }

    #[test]
    fn outstanding_skips_voters_with_a_choice() {
        let voters: VoterSet = vec![
            Vote { identity: VoterId::new("a"), choice: Choice::Yes },
            Vote { identity: VoterId::new("b"), choice: Choice::Unset },
        ]
        .into();
        let roster = Roster::resolved(ids(&["a", "b", "c"]));
        assert_eq!(roster.outstanding(&voters), ids(&["b", "c"]));
    }
}
