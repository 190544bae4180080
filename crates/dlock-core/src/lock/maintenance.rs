//! Lock maintenance
//!
//! Periodically selects holders that have gone unchecked for the staleness
//! interval, asks each requester whether the lock is still live, and reaps the
//! holders confirmed expired. The table mutex is only held while selecting and
//! while removing; probes run without it.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::model::LongLivedLock;
use super::service::LockServer;
use super::verifier::{LivenessVerifier, ProbeOutcome};
use crate::metrics;

/// Probes in flight at once during a cycle
const PROBE_CONCURRENCY: usize = 16;

/// Counts from one maintenance cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub selected: usize,
    pub live: usize,
    pub expired: usize,
    pub inconclusive: usize,
    pub reaped: usize,
}

pub struct LockMaintenance {
    server: Arc<LockServer>,
    verifier: Arc<dyn LivenessVerifier>,
    staleness: Duration,
}

impl LockMaintenance {
    pub fn new(server: Arc<LockServer>, verifier: Arc<dyn LivenessVerifier>, staleness: Duration) -> Self {
        Self {
            server,
            verifier,
            staleness,
        }
    }

    /// Run one selection / probe / reap round
    pub async fn run_cycle(&self) -> MaintenanceReport {
        let long_lived = self.server.take_long_lived(self.staleness);
        let mut report = MaintenanceReport {
            selected: long_lived.len(),
            ..Default::default()
        };
        if long_lived.is_empty() {
            return report;
        }

        let outcomes: Vec<(LongLivedLock, ProbeOutcome)> = futures::stream::iter(long_lived)
            .map(|stale| async move {
                let outcome = self.verifier.probe(&stale.name, &stale.holder).await;
                (stale, outcome)
            })
            .buffer_unordered(PROBE_CONCURRENCY)
            .collect()
            .await;

        for (stale, outcome) in outcomes {
            match outcome {
                ProbeOutcome::Live => report.live += 1,
                ProbeOutcome::Inconclusive => report.inconclusive += 1,
                ProbeOutcome::Expired => {
                    report.expired += 1;
                    if self.server.remove_if_present(&stale) {
                        report.reaped += 1;
                        info!(
                            name = %stale.name,
                            request_id = %stale.holder.request_id,
                            writer = stale.holder.writer,
                            "Reaped stale lock"
                        );
                    }
                }
            }
        }

        report
    }

    /// Run cycles every `interval` until `shutdown` fires
    pub fn spawn(self, interval: Duration, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                interval_ms = interval.as_millis() as u64,
                staleness_ms = self.staleness.as_millis() as u64,
                "Lock maintenance started"
            );
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = self.run_cycle().await;
                        if report.selected > 0 {
                            debug!(?report, "Lock maintenance cycle finished");
                        }
                        metrics::record_maintenance(&report);
                        metrics::set_lock_stats(&self.server.stats());
                    }
                    _ = shutdown.recv() => {
                        info!("Lock maintenance stopped");
                        break;
                    }
                }
            }
        })
    }
}
