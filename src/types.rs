//! Shared types for the AOTS scanner.
//!
//! These types form the data model passed between the market bindings,
//! the scan engine and the publisher. None of them outlive a scan cycle
//! except `Symbol`, which makes up the universe loaded at startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Symbol
// ---------------------------------------------------------------------------

/// A tradable instrument in the scan universe.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// Identifier used to query the data source ("BTCUSDT", "bitcoin").
    pub id: String,
    /// Normalised name shown in reports ("BTC").
    pub display: String,
}

impl Symbol {
    pub fn new(id: impl Into<String>, display: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display: display.into(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.id == self.display {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.display, self.id)
        }
    }
}

// ---------------------------------------------------------------------------
// Indicators
// ---------------------------------------------------------------------------

/// Trailing moving averages at the last candle of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub short: f64,
    pub medium: f64,
    pub long: f64,
}

impl fmt::Display for IndicatorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "short={:.6} medium={:.6} long={:.6}",
            self.short, self.medium, self.long
        )
    }
}

// ---------------------------------------------------------------------------
// Scan output
// ---------------------------------------------------------------------------

/// Symbols that classified as tiered during one scan cycle.
///
/// `symbols` holds display names in universe order. The counters are
/// bookkeeping for logs only.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub symbols: Vec<String>,
    pub scanned: usize,
    pub unavailable: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl ScanResult {
    pub fn matched(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// One packed text block destined for a single report field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayChunk {
    /// Zero-based slot in the packed output.
    pub index: usize,
    pub text: String,
}

impl DisplayChunk {
    /// Length as the chat surface counts it (Unicode scalar values).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why a candle series could not be obtained for a symbol.
///
/// Every variant is a per-symbol failure: the scanner drops the symbol
/// for the current cycle and moves on.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error ({source_name}): {message}")]
    Http { source_name: String, message: String },

    #[error("API error ({source_name}) {status}: {body}")]
    Status {
        source_name: String,
        status: u16,
        body: String,
    },

    #[error("Malformed response ({source_name}): {message}")]
    Parse { source_name: String, message: String },

    #[error("No candles returned for {0}")]
    Empty(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
