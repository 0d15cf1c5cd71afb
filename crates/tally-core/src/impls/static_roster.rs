//! StaticRoster - fixed group membership for development and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{GroupId, VoterId};
use crate::ports::{RosterError, RosterResolver};

/// A group member as a directory would report it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: VoterId,
    #[serde(default)]
    pub is_bot: bool,
}

impl Member {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: VoterId::new(name),
            is_bot: false,
        }
    }

    pub fn bot(name: impl Into<String>) -> Self {
        Self {
            name: VoterId::new(name),
            is_bot: true,
        }
    }
}

/// Membership table held in memory. Bots are filtered out on resolve, and the
/// whole lookup can be switched to failing to exercise the degraded path.
#[derive(Debug, Default)]
pub struct StaticRoster {
    groups: HashMap<GroupId, Vec<Member>>,
    unavailable: AtomicBool,
}

impl StaticRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: GroupId, members: Vec<Member>) -> Self {
        self.groups.insert(group, members);
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

#[async_trait]
impl RosterResolver for StaticRoster {
    async fn resolve(&self, group: &GroupId) -> Result<Vec<VoterId>, RosterError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(RosterError::Lookup {
                group: group.clone(),
                reason: "directory unavailable".to_string(),
            });
        }
        let members = self
            .groups
            .get(group)
            .ok_or_else(|| RosterError::UnknownGroup(group.clone()))?;
        Ok(members
            .iter()
            .filter(|m| !m.is_bot)
            .map(|m| m.name.clone())
            .collect())
    }
}
