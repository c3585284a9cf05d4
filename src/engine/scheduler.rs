//! Fixed-interval cycle scheduler.
//!
//! Runs a cycle, sleeps the full interval, repeats. Each cycle runs in its
//! own task so that even a panic stays inside the cycle boundary. The
//! shutdown signal only interrupts the sleep; a cycle in progress always
//! finishes first.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::engine::cycle::{CycleReport, CycleTask};

pub struct Scheduler<T: CycleTask> {
    task: Arc<T>,
    interval: Duration,
}

impl<T: CycleTask> Scheduler<T> {
    pub fn new(task: Arc<T>, interval: Duration) -> Self {
        Self { task, interval }
    }

    /// Loop until `shutdown` resolves. Returns the number of cycles run.
    pub async fn run<F>(self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut cycle_number = 0u64;

        info!(
            interval_secs = self.interval.as_secs(),
            "Entering scan loop. Press Ctrl+C to stop."
        );

        loop {
            cycle_number += 1;
            let task = Arc::clone(&self.task);
            let handle = tokio::spawn(async move { task.run_cycle(cycle_number).await });

            match handle.await {
                Ok(Ok(report)) => log_cycle_report(&report),
                Ok(Err(e)) => {
                    error!(cycle = cycle_number, error = format!("{e:#}"), "Cycle failed, continuing to next");
                }
                Err(e) => {
                    error!(cycle = cycle_number, error = %e, "Cycle aborted, continuing to next");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received.");
                    break;
                }
            }
        }

        cycle_number
    }
}

/// Log a human-readable cycle summary.
fn log_cycle_report(report: &CycleReport) {
    info!(
        cycle = report.cycle_number,
        cycle_id = %report.cycle_id,
        scanned = report.scanned,
        unavailable = report.unavailable,
        matched = report.matched,
        chunks = report.chunks,
        published = report.published,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "Cycle complete"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
