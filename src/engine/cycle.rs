//! One scan cycle: scan -> pack -> report -> publish.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

use crate::engine::packer;
use crate::engine::report::{build_report, ReportSettings};
use crate::engine::scanner::Scanner;
use crate::market::CandleSource;
use crate::notify::Publisher;
use crate::types::{DisplayChunk, ScanResult, Symbol};

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Summary of a completed cycle, for logging.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub cycle_id: Uuid,
    pub scanned: usize,
    pub unavailable: usize,
    pub matched: usize,
    pub chunks: usize,
    pub published: bool,
    pub elapsed: Duration,
}

/// A unit of work the scheduler runs once per interval.
#[async_trait]
pub trait CycleTask: Send + Sync + 'static {
    async fn run_cycle(&self, cycle_number: u64) -> Result<CycleReport>;
}

// ---------------------------------------------------------------------------
// Scan cycle
// ---------------------------------------------------------------------------

/// Everything a cycle needs, built once at startup and never mutated.
pub struct ScanCycle {
    universe: Arc<[Symbol]>,
    source: Arc<dyn CandleSource>,
    publisher: Arc<dyn Publisher>,
    scanner: Scanner,
    report: ReportSettings,
}

impl ScanCycle {
    pub fn new(
        universe: Vec<Symbol>,
        source: Arc<dyn CandleSource>,
        publisher: Arc<dyn Publisher>,
        scanner: Scanner,
        report: ReportSettings,
    ) -> Self {
        Self {
            universe: universe.into(),
            source,
            publisher,
            scanner,
            report,
        }
    }

    pub fn universe(&self) -> &[Symbol] {
        &self.universe
    }

    /// Scan the universe and pack the matches.
    pub async fn scan_and_pack(&self) -> (ScanResult, Vec<DisplayChunk>) {
        let result = self.scanner.scan(&self.universe, self.source.as_ref()).await;
        let chunks = packer::pack(
            &result.symbols,
            &self.report.prefix,
            self.report.max_chunk_chars,
            self.report.max_chunks,
        );
        (result, chunks)
    }
}

#[async_trait]
impl CycleTask for ScanCycle {
    async fn run_cycle(&self, cycle_number: u64) -> Result<CycleReport> {
        let cycle_id = Uuid::new_v4();
        info!(cycle = cycle_number, %cycle_id, "Starting cycle");

        let (result, chunks) = self.scan_and_pack().await;
        let report = build_report(&chunks, &self.report, Utc::now());

        // A lost report is superseded by the next cycle; never retried.
        let published = match self.publisher.publish(&report).await {
            Ok(()) => true,
            Err(e) => {
                error!(cycle = cycle_number, %cycle_id, error = format!("{e:#}"), "Publish failed");
                false
            }
        };

        Ok(CycleReport {
            cycle_number,
            cycle_id,
            scanned: result.scanned,
            unavailable: result.unavailable,
            matched: result.matched(),
            chunks: chunks.len(),
            published,
            elapsed: result.elapsed,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
