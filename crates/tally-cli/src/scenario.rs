//! Scenario file: groups, polls and scheduled votes for `tally run`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use tally_core::domain::{Choice, DueOrderTime, GroupId, PollMessages, PollSpec, VoterId};
use tally_core::impls::{Member, StaticRoster};

#[derive(Debug, Deserialize)]
pub struct Scenario {
    /// Simulated start time. Defaults to the wall clock.
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,

    #[serde(default)]
    pub groups: BTreeMap<GroupId, Vec<Member>>,

    pub polls: Vec<ScenarioPoll>,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioPoll {
    pub title: String,
    pub group: GroupId,

    /// Seconds after creation at which the poll closes.
    pub due_order_time: u64,

    #[serde(default)]
    pub messages: PollMessages,

    #[serde(default)]
    pub votes: Vec<ScheduledVote>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledVote {
    /// Tick before whose reconcile pass the vote is cast.
    #[serde(default)]
    pub at_tick: u32,
    pub voter: VoterId,
    pub choice: Choice,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn roster(&self) -> StaticRoster {
        self.groups
            .iter()
            .fold(StaticRoster::new(), |roster, (group, members)| {
                roster.with_group(group.clone(), members.clone())
            })
    }
}

impl ScenarioPoll {
    pub fn spec(&self) -> PollSpec {
        PollSpec::new(
            self.title.clone(),
            self.group.clone(),
            DueOrderTime::from_secs(self.due_order_time),
        )
        .with_messages(self.messages.clone())
    }
}
