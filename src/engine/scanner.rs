//! Universe scanner.
//!
//! Walks the symbol universe in load order, one symbol at a time:
//! fetch closes, compute the three trailing MAs, classify, and collect
//! the tiered symbols. A fixed pacing delay follows every symbol so the
//! whole scan stays under the data source's rate limit.

use chrono::Utc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::engine::{classifier, indicators};
use crate::market::CandleSource;
use crate::types::{IndicatorSnapshot, ScanResult, Symbol};

// ---------------------------------------------------------------------------
// Per-symbol outcome
// ---------------------------------------------------------------------------

/// What happened to one symbol during a scan.
#[derive(Debug)]
pub enum SymbolOutcome {
    Tiered(IndicatorSnapshot),
    NotTiered(IndicatorSnapshot),
    /// Fetch failed or the series could not produce indicators.
    Unavailable(String),
}

impl SymbolOutcome {
    pub fn is_tiered(&self) -> bool {
        matches!(self, SymbolOutcome::Tiered(_))
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Sequential, paced scanner over a fixed universe.
#[derive(Debug, Clone)]
pub struct Scanner {
    windows: [usize; 3],
    delay: Duration,
}

impl Scanner {
    pub fn new(windows: [usize; 3], delay: Duration) -> Self {
        Self { windows, delay }
    }

    pub fn windows(&self) -> [usize; 3] {
        self.windows
    }

    /// Scan every symbol and return the tiered ones in universe order.
    ///
    /// Never fails: per-symbol problems only exclude that symbol.
    pub async fn scan(&self, universe: &[Symbol], source: &dyn CandleSource) -> ScanResult {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut symbols = Vec::new();
        let mut unavailable = 0usize;

        info!(
            universe = universe.len(),
            delay_ms = self.delay.as_millis() as u64,
            "Starting universe scan..."
        );

        for symbol in universe {
            match self.evaluate(symbol, source).await {
                SymbolOutcome::Tiered(snapshot) => {
                    debug!(symbol = %symbol, %snapshot, "Tiered setup");
                    symbols.push(symbol.display.clone());
                }
                SymbolOutcome::NotTiered(snapshot) => {
                    debug!(symbol = %symbol, %snapshot, "Not tiered");
                }
                SymbolOutcome::Unavailable(reason) => {
                    debug!(symbol = %symbol, reason = %reason, "Symbol unavailable");
                    unavailable += 1;
                }
            }

            tokio::time::sleep(self.delay).await;
        }

        let result = ScanResult {
            symbols,
            scanned: universe.len(),
            unavailable,
            started_at,
            elapsed: clock.elapsed(),
        };

        info!(
            scanned = result.scanned,
            matched = result.matched(),
            unavailable = result.unavailable,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "Universe scan complete"
        );

        result
    }

    /// Fetch, compute and classify a single symbol.
    pub async fn evaluate(&self, symbol: &Symbol, source: &dyn CandleSource) -> SymbolOutcome {
        let closes = match source.fetch_closes(symbol).await {
            Ok(closes) => closes,
            Err(e) => return SymbolOutcome::Unavailable(e.to_string()),
        };

        match indicators::compute(&closes, self.windows) {
            Some(snapshot) if classifier::classify(Some(&snapshot)) => {
                SymbolOutcome::Tiered(snapshot)
            }
            Some(snapshot) => SymbolOutcome::NotTiered(snapshot),
            None => SymbolOutcome::Unavailable(format!(
                "no indicators from {} closes",
                closes.len()
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
