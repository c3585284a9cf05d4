//! Market data bindings.
//!
//! Defines the `SymbolUniverse` and `CandleSource` traits and provides
//! implementations for:
//! - Binance spot (authenticated exchange API, OHLCV klines)
//! - CoinGecko (public API, timestamped price points)
//!
//! Exactly one binding is active per deployment.

pub mod binance;
pub mod coingecko;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{FetchError, Symbol};

/// Source of the symbol universe, loaded once at startup.
#[async_trait]
pub trait SymbolUniverse: Send + Sync {
    /// Load every symbol to scan, in the order they should be scanned.
    async fn load_universe(&self) -> Result<Vec<Symbol>>;
}

/// Source of closing-price series.
///
/// Failures are per-symbol and never abort a scan.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Closing prices for `symbol`, oldest first.
    async fn fetch_closes(&self, symbol: &Symbol) -> Result<Vec<f64>, FetchError>;
}

/// Map a reqwest transport error into the per-symbol failure channel.
pub(crate) fn http_error(source_name: &str, err: reqwest::Error) -> FetchError {
    FetchError::Http {
        source_name: source_name.to_string(),
        message: err.to_string(),
    }
}

/// Turn a non-2xx response into a `FetchError::Status` carrying the body.
pub(crate) async fn check_status(
    source_name: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, FetchError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(FetchError::Status {
        source_name: source_name.to_string(),
        status,
        body,
    })
}
