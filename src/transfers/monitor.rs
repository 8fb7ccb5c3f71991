//! Periodic withdrawal settlement.
//!
//! # Responsibilities
//! - Poll pending withdrawals on a fixed interval
//! - Stop cleanly when shutdown is signalled

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::WithdrawalConfig;
use crate::transfers::TransferService;

pub struct SettlementMonitor {
    service: Arc<TransferService>,
    interval: Duration,
}

impl SettlementMonitor {
    pub fn new(service: Arc<TransferService>, config: &WithdrawalConfig) -> Self {
        Self {
            service,
            interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            "Settlement monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let settled = self.service.settle_pending();
                    if settled > 0 {
                        tracing::debug!(settled, "Settled pending withdrawals");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!(
                        pending = self.service.pending_count(),
                        "Settlement monitor received shutdown signal, exiting loop"
                    );
                    break;
                }
            }
        }
    }
}
