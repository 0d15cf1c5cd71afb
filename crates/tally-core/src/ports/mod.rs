//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! Each trait is the contract the reconciler needs from one external
//! collaborator; adapters live in `impls` (in-memory, for development and
//! tests) or in downstream crates.
//!
//! # 設計原則
//! - PollStore is the source of truth; writes are conditional on a version
//! - the roster is re-resolved on every pass and never cached here
//! - delivery is per recipient and fire-and-forget

pub mod clock;
pub mod id_generator;
pub mod notifier;
pub mod poll_store;
pub mod roster;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::notifier::{NotifyError, Notifier};
pub use self::poll_store::{PollPatch, PollStore, StoreError, Versioned};
pub use self::roster::{RosterError, RosterResolver};
