//! ReconcileLoop - 定期的に全 poll を reconcile するループ
//!
//! - 周期ごとに PollStore::list() で poll を列挙し、poll ごとに並列実行
//! - 同じ poll は Reconciler 側の PollLocks で直列化される
//! - `watch` の shutdown シグナルで停止（実行中の pass は最後まで走る）

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::app::reconciler::{ReconcileReport, Reconciler};
use crate::domain::ids::PollId;
use crate::ports::StoreError;

/// Outcome of reconciling every known poll once.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassSummary {
    /// Reports ordered by poll id.
    pub reports: Vec<ReconcileReport>,
    pub failed: Vec<PollId>,
}

impl PassSummary {
    pub fn finalized(&self) -> usize {
        self.reports.iter().filter(|r| r.due.is_some()).count()
    }

    pub fn reminders_sent(&self) -> usize {
        self.reports.iter().map(|r| r.reminders_sent).sum()
    }
}

/// Reconcile every poll in the store once, polls in parallel.
pub async fn reconcile_pass(reconciler: &Arc<Reconciler>) -> Result<PassSummary, StoreError> {
    let ids = reconciler.store().list().await?;

    let mut set = JoinSet::new();
    for id in ids {
        let reconciler = Arc::clone(reconciler);
        set.spawn(async move { (id, reconciler.reconcile(id).await) });
    }

    let mut summary = PassSummary::default();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((_, Ok(report))) => summary.reports.push(report),
            Ok((id, Err(e))) => {
                tracing::warn!(poll_id = %id, error = %e, "reconcile failed");
                summary.failed.push(id);
            }
            Err(e) => tracing::error!(error = %e, "reconcile task panicked"),
        }
    }
    summary.reports.sort_by_key(|r| r.poll_id);
    summary.failed.sort();
    Ok(summary)
}

/// Loop handle.
/// - `request_shutdown()` で次の周期を待たずに止まる
/// - `shutdown_and_join()` で終了を待てる
pub struct ReconcileLoop {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<u64>,
}

impl ReconcileLoop {
    /// Spawn the loop. The first pass runs immediately.
    pub fn spawn(reconciler: Arc<Reconciler>, period: Duration) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(run(reconciler, period, shutdown_rx));
        Self { shutdown_tx, join }
    }

    pub fn request_shutdown(&self) {
        // receiver may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop and wait; returns the number of completed passes.
    pub async fn shutdown_and_join(self) -> u64 {
        self.request_shutdown();
        self.join.await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "reconcile loop panicked");
            0
        })
    }
}

async fn run(
    reconciler: Arc<Reconciler>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) -> u64 {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut passes = 0;
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        tokio::select! {
            changed = shutdown_rx.changed() => {
                // handle dropped
                if changed.is_err() {
                    break;
                }
                continue;
            }
            _ = ticker.tick() => {}
        }

        match reconcile_pass(&reconciler).await {
            Ok(summary) => {
                passes += 1;
                tracing::debug!(
                    polls = summary.reports.len(),
                    failed = summary.failed.len(),
                    finalized = summary.finalized(),
                    "reconcile pass done"
                );
            }
            Err(e) => tracing::warn!(error = %e, "listing polls failed, retrying next period"),
        }
    }
    tracing::info!(passes, "reconcile loop stopped");
    passes
}
