//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせてアプリケーションロジックを実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: アプリケーションの構築とワイヤリング
//! - **Reconciler**: 一つの poll の read→decide→write→dispatch
//! - **BallotBox**: 投票の受付
//! - **ReconcileLoop**: 周期的に全 poll を reconcile
//! - **ReconcilerConfig**: 実行時設定

pub mod ballot_box;
pub mod builder;
pub mod config;
pub mod poll_locks;
pub mod reconcile_loop;
pub mod reconciler;

// 主要な型を再エクスポート
pub use self::ballot_box::{BallotBox, CastReceipt, VoteError};
pub use self::builder::{App, AppBuilder, BuildError};
pub use self::config::{ConfigError, ReconcilerConfig};
pub use self::poll_locks::PollLocks;
pub use self::reconcile_loop::{PassSummary, ReconcileLoop, reconcile_pass};
pub use self::reconciler::{ReconcileError, ReconcileReport, Reconciler};
