//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - Reconciler と BallotBox で PollLocks を共有する

use std::sync::Arc;

use crate::app::ballot_box::BallotBox;
use crate::app::config::{ConfigError, ReconcilerConfig};
use crate::app::poll_locks::PollLocks;
use crate::app::reconcile_loop::ReconcileLoop;
use crate::app::reconciler::Reconciler;
use crate::ports::{Clock, Notifier, PollStore, RosterResolver, SystemClock};

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .store(Arc::new(InMemoryPollStore::new()))
///     .roster(Arc::new(roster))
///     .notifier(Arc::new(LogNotifier))
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - store / roster / notifier のどれかが欠けていれば BuildError
/// - clock は省略時 SystemClock
#[derive(Default)]
pub struct AppBuilder {
    store: Option<Arc<dyn PollStore>>,
    roster: Option<Arc<dyn RosterResolver>>,
    notifier: Option<Arc<dyn Notifier>>,
    clock: Option<Arc<dyn Clock>>,
    config: ReconcilerConfig,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing components: {0:?}. These must be provided before build().")]
    MissingComponents(Vec<&'static str>),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(mut self, store: Arc<dyn PollStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn roster(mut self, roster: Arc<dyn RosterResolver>) -> Self {
        self.roster = Some(roster);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<App, BuildError> {
        let mut missing = Vec::new();
        if self.store.is_none() {
            missing.push("store");
        }
        if self.roster.is_none() {
            missing.push("roster");
        }
        if self.notifier.is_none() {
            missing.push("notifier");
        }
        let (Some(store), Some(roster), Some(notifier)) = (self.store, self.roster, self.notifier)
        else {
            return Err(BuildError::MissingComponents(missing));
        };
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let locks = Arc::new(PollLocks::new());
        let ballot_box = BallotBox::new(
            Arc::clone(&store),
            Arc::clone(&notifier),
            Arc::clone(&locks),
            self.config.max_conflict_retries,
        );
        let reconciler = Reconciler::new(store, roster, notifier, clock, locks, self.config);

        Ok(App {
            reconciler: Arc::new(reconciler),
            ballot_box: Arc::new(ballot_box),
        })
    }
}

/// App はアプリケーションのランタイム
pub struct App {
    pub reconciler: Arc<Reconciler>,
    pub ballot_box: Arc<BallotBox>,
}

impl App {
    /// Start the periodic reconcile loop with the configured period.
    pub fn spawn_loop(&self) -> ReconcileLoop {
        ReconcileLoop::spawn(
            Arc::clone(&self.reconciler),
            self.reconciler.config().reconcile_period(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::{GroupId, PollId, VoterId};
    use crate::domain::poll::{DueOrderTime, PollSnapshot, PollSpec};
    use crate::domain::voter::Choice;
    use crate::impls::{InMemoryPollStore, Member, RecordingNotifier, StaticRoster};
    use chrono::Utc;
    use ulid::Ulid;

    #[test]
    fn test_build_missing_components() {
        let app = AppBuilder::new()
            .notifier(Arc::new(RecordingNotifier::new()))
            .build();
        assert!(matches!(
            app,
            Err(BuildError::MissingComponents(missing)) if missing == vec!["store", "roster"]
        ));
    }

    #[test]
    fn test_build_rejects_zero_period() {
        let app = AppBuilder::new()
            .store(Arc::new(InMemoryPollStore::new()))
            .roster(Arc::new(StaticRoster::new()))
            .notifier(Arc::new(RecordingNotifier::new()))
            .config(ReconcilerConfig {
                reconcile_period_ms: 0,
                ..ReconcilerConfig::default()
            })
            .build();
        assert!(matches!(app, Err(BuildError::Config(ConfigError::ZeroPeriod))));
    }

    #[tokio::test]
    async fn test_votes_then_reconcile_closes_by_quorum() {
        let store = Arc::new(InMemoryPollStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let app = AppBuilder::new()
            .store(store.clone())
            .roster(Arc::new(StaticRoster::new().with_group(
                GroupId::new("C1"),
                vec![Member::human("alice"), Member::human("bob")],
            )))
            .notifier(notifier.clone())
            .build()
            .unwrap();

        let id = store
            .insert(PollSnapshot::open(
                PollId::from_ulid(Ulid::new()),
                Utc::now(),
                PollSpec::new("lunch", GroupId::new("C1"), DueOrderTime::from_secs(3600)),
            ))
            .await;
        app.ballot_box.cast(id, VoterId::new("alice"), Choice::Yes).await.unwrap();
        app.ballot_box.cast(id, VoterId::new("bob"), Choice::Yes).await.unwrap();

        let report = app.reconciler.reconcile(id).await.unwrap();
        assert!(report.due.is_some());

        let late = app.ballot_box.cast(id, VoterId::new("bob"), Choice::No).await;
        assert!(late.is_err());
    }
}
