//! Impls - 実装（開発用・テスト用）
//!
//! このモジュールには ports の実装を含めます。
//!
//! # 含まれる実装
//! - **InMemoryPollStore**: versioned in-memory poll store
//! - **StaticRoster**: fixed group membership, bots filtered out
//! - **RecordingNotifier**: keeps sent messages (tests)
//! - **LogNotifier**: logs messages instead of sending them (CLI)

pub mod inmem_store;
pub mod log_notifier;
pub mod recording_notifier;
pub mod static_roster;

// 主要な型を再エクスポート
pub use self::inmem_store::InMemoryPollStore;
pub use self::log_notifier::LogNotifier;
pub use self::recording_notifier::RecordingNotifier;
pub use self::static_roster::{Member, StaticRoster};
