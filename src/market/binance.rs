//! Binance spot market integration.
//!
//! Supplies the USDT spot universe and daily close series.
//!
//! API docs: https://binance-docs.github.io/apidocs/spot/en/
//! Base URL: https://api.binance.com
//! Rate limit: 6000 request weight/minute per IP (klines weight 2)
//! Auth: `X-MBX-APIKEY` header; signed endpoints add an HMAC-SHA256
//! `signature` over the query string.

use anyhow::{Context, Result};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, info};

use super::{check_status, http_error, CandleSource, SymbolUniverse};
use crate::types::{FetchError, Symbol};

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://api.binance.com";
const SOURCE_NAME: &str = "binance";

/// Index of the close price inside a kline array.
const KLINE_CLOSE_IDX: usize = 4;

/// Only symbols in this state are scanned.
const TRADING_STATUS: &str = "TRADING";

const RECV_WINDOW_MS: u64 = 5000;

// ---------------------------------------------------------------------------
// API response types (Binance JSON -> Rust)
// ---------------------------------------------------------------------------

/// `/api/v3/exchangeInfo`. We only deserialize the fields we need.
#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<ExchangeSymbol>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeSymbol {
    symbol: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    quote_asset: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Binance spot REST client.
pub struct BinanceClient {
    http: Client,
    base_url: String,
    api_key: SecretString,
    api_secret: SecretString,
    quote_asset: String,
    interval: String,
    limit: u32,
}

impl BinanceClient {
    pub fn new(
        api_key: SecretString,
        api_secret: SecretString,
        quote_asset: &str,
        interval: &str,
        limit: u32,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("AOTS/0.1.0 (ma-tier-scanner)")
            .build()
            .context("Failed to build HTTP client for Binance")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            api_key,
            api_secret,
            quote_asset: quote_asset.to_uppercase(),
            interval: interval.to_string(),
            limit,
        })
    }

    /// Point the client at another host (testnet, local proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// HMAC-SHA256 signature of a query string, hex encoded.
    fn sign(&self, query: &str) -> Result<String> {
        let mut mac = HmacSha256::new_from_slice(self.api_secret.expose_secret().as_bytes())
            .context("Invalid Binance API secret")?;
        mac.update(query.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check the key pair against the signed account endpoint.
    ///
    /// The scan itself only touches market endpoints, so callers treat a
    /// failure here as a warning.
    pub async fn verify_credentials(&self) -> Result<()> {
        let query = format!(
            "recvWindow={RECV_WINDOW_MS}&timestamp={}",
            chrono::Utc::now().timestamp_millis()
        );
        let signature = self.sign(&query)?;
        let url = format!("{}/api/v3/account?{query}&signature={signature}", self.base_url);

        let resp = self
            .http
            .get(&url)
            .header("X-MBX-APIKEY", self.api_key.expose_secret())
            .send()
            .await
            .context("Binance account request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Binance credential check failed {status}: {body}");
        }

        info!("Binance credentials verified");
        Ok(())
    }
}

#[async_trait]
impl SymbolUniverse for BinanceClient {
    async fn load_universe(&self) -> Result<Vec<Symbol>> {
        let url = format!("{}/api/v3/exchangeInfo", self.base_url);
        debug!(url = %url, "Fetching Binance exchange info");

        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .context("Binance exchangeInfo request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Binance API error {status}: {body}");
        }

        let info: ExchangeInfo = resp
            .json()
            .await
            .context("Failed to parse Binance exchangeInfo response")?;

        let total = info.symbols.len();
        let symbols = spot_universe(info.symbols, &self.quote_asset);
        info!(
            total,
            kept = symbols.len(),
            quote = %self.quote_asset,
            "Binance spot symbols loaded"
        );
        Ok(symbols)
    }
}

#[async_trait]
impl CandleSource for BinanceClient {
    async fn fetch_closes(&self, symbol: &Symbol) -> Result<Vec<f64>, FetchError> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.base_url,
            urlencoding::encode(&symbol.id),
            urlencoding::encode(&self.interval),
            self.limit,
        );

        let resp = self
            .http
            .get(&url)
            .header("X-MBX-APIKEY", self.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| http_error(SOURCE_NAME, e))?;
        let resp = check_status(SOURCE_NAME, resp).await?;

        let klines: Vec<Vec<Value>> = resp.json().await.map_err(|e| FetchError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        let closes = closes_from_klines(&klines)?;
        if closes.is_empty() {
            return Err(FetchError::Empty(symbol.id.clone()));
        }
        Ok(closes)
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Keep trading symbols quoted in `quote_asset`, preserving API order.
fn spot_universe(symbols: Vec<ExchangeSymbol>, quote_asset: &str) -> Vec<Symbol> {
    symbols
        .into_iter()
        .filter(|s| s.quote_asset == quote_asset && s.status == TRADING_STATUS)
        .map(|s| {
            let display = display_name(&s.symbol, quote_asset);
            Symbol::new(s.symbol, display)
        })
        .collect()
}

/// "BTCUSDT" -> "BTC". Symbols that are nothing but the quote keep their id.
pub fn display_name(symbol: &str, quote_asset: &str) -> String {
    match symbol.strip_suffix(quote_asset) {
        Some(base) if !base.is_empty() => base.to_uppercase(),
        _ => symbol.to_uppercase(),
    }
}

/// Extract close prices from raw kline arrays.
///
/// Binance sends prices as decimal strings; numbers are accepted too.
fn closes_from_klines(klines: &[Vec<Value>]) -> Result<Vec<f64>, FetchError> {
    klines
        .iter()
        .map(|k| {
            let raw = k.get(KLINE_CLOSE_IDX).ok_or_else(|| FetchError::Parse {
                source_name: SOURCE_NAME.to_string(),
                message: format!("kline has {} fields, expected close at {KLINE_CLOSE_IDX}", k.len()),
            })?;
            let close = match raw {
                Value::String(s) => s.parse::<f64>().ok(),
                Value::Number(n) => n.as_f64(),
                _ => None,
            };
            close.ok_or_else(|| FetchError::Parse {
                source_name: SOURCE_NAME.to_string(),
                message: format!("invalid close price {raw}"),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
