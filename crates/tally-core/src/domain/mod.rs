//! Domain model (IDs, poll snapshot, votes, messages) and the pure decision engine.
//!
//! - ids, voter, poll, roster, message: data
//! - due, throttle, finalize: the three evaluations of one pass
//! - decision: the state machine that combines them
//! - errors: classification of collaborator failures

pub mod decision;
pub mod due;
pub mod errors;
pub mod finalize;
pub mod ids;
pub mod message;
pub mod poll;
pub mod roster;
pub mod throttle;
pub mod voter;

pub use decision::{Action, Anomaly, Decider, Decision, EngineConfig, LifecycleDecider, ReminderAction};
pub use due::{DueReason, due_reason, is_due};
pub use errors::{Classify, ErrorKind};
pub use finalize::{FinalizeAction, finalize};
pub use ids::{GroupId, PollId, VoterId};
pub use message::{AckMessage, Message, Recipient, ReminderMessage, ResultMessage, Tally};
pub use poll::{ConditionState, DueOrderTime, PollMessages, PollSnapshot, PollSpec, PollStatus};
pub use roster::Roster;
pub use throttle::{DEFAULT_NOTIFY_WINDOW, should_notify};
pub use voter::{Choice, ParseChoiceError, Vote, VoterSet};
