//! tally-core
//!
//! Core building blocks for the poll lifecycle reconciler.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, voter, poll, roster, message）と純粋な判定エンジン（due, throttle, finalize, decision）
//! - **ports**: 抽象化レイヤー（PollStore, RosterResolver, Notifier, Clock, IdGenerator）
//! - **app**: アプリケーションロジック（builder, reconciler, ballot_box, reconcile_loop, config）
//! - **impls**: 実装（InMemoryPollStore など開発用）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
