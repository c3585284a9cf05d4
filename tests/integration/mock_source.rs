//! In-memory candle source and publisher for integration testing.
//!
//! `MockSource` serves scripted close series per symbol id and counts
//! requests; `RecordingPublisher` keeps every report it is handed.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use aots::market::CandleSource;
use aots::notify::{Publisher, ScanReport};
use aots::types::{FetchError, Symbol};

/// Deterministic close series keyed by symbol id.
///
/// Symbols without a scripted series get a flat series, which never tiers.
pub struct MockSource {
    series: HashMap<String, Vec<f64>>,
    failing: Vec<String>,
    requests: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self {
            series: HashMap::new(),
            failing: Vec::new(),
            requests: AtomicUsize::new(0),
        }
    }

    /// Strictly rising closes: short MA > medium MA > long MA.
    pub fn rising(mut self, id: &str) -> Self {
        self.series
            .insert(id.to_string(), (1..=150).map(|i| i as f64).collect());
        self
    }

    /// Strictly falling closes: the reverse ordering.
    pub fn falling(mut self, id: &str) -> Self {
        self.series
            .insert(id.to_string(), (1..=150).rev().map(|i| i as f64).collect());
        self
    }

    /// Fewer closes than the long window; still produces indicators.
    pub fn short_history(mut self, id: &str, len: usize) -> Self {
        self.series
            .insert(id.to_string(), (1..=len).map(|i| i as f64).collect());
        self
    }

    /// Every fetch for `id` fails with an HTTP status error.
    pub fn failing(mut self, id: &str) -> Self {
        self.failing.push(id.to_string());
        self
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandleSource for MockSource {
    async fn fetch_closes(&self, symbol: &Symbol) -> Result<Vec<f64>, FetchError> {
        self.requests.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&symbol.id) {
            return Err(FetchError::Status {
                source_name: "mock".into(),
                status: 500,
                body: "internal error".into(),
            });
        }

        Ok(self
            .series
            .get(&symbol.id)
            .cloned()
            .unwrap_or_else(|| vec![42.0; 150]))
    }
}

/// Records every published report; optionally fails every publish.
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    reports: Arc<Mutex<Vec<ScanReport>>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn reports(&self) -> Vec<ScanReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn publish(&self, report: &ScanReport) -> Result<()> {
        self.reports.lock().unwrap().push(report.clone());
        if self.fail {
            return Err(anyhow!("Discord API error 500: unavailable"));
        }
        Ok(())
    }
}

/// `count` symbols named `C000`..; ids carry the `USDT` suffix.
pub fn universe(count: usize) -> Vec<Symbol> {
    (0..count)
        .map(|i| {
            let display = format!("C{i:03}");
            Symbol::new(format!("{display}USDT"), display)
        })
        .collect()
}
