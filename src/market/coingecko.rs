//! CoinGecko public market-data integration.
//!
//! Alternative binding for deployments without exchange credentials.
//! The universe is the top-N coins by market cap; candles are the daily
//! price points of `market_chart`.
//!
//! API docs: https://docs.coingecko.com/v3.0.1/reference/introduction
//! Base URL: https://api.coingecko.com/api/v3
//! Rate limit: ~30 calls/minute on the public tier
//! Auth: Optional demo key via `x-cg-demo-api-key`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use super::{check_status, http_error, CandleSource, SymbolUniverse};
use crate::types::{FetchError, Symbol};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const SOURCE_NAME: &str = "coingecko";

/// `/coins/markets` page size cap.
const MAX_PER_PAGE: u32 = 250;

// ---------------------------------------------------------------------------
// API response types (CoinGecko JSON -> Rust)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CoinMarket {
    id: String,
    symbol: String,
}

/// `/coins/{id}/market_chart`: each point is `[timestamp_ms, value]`.
#[derive(Debug, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, Option<f64>)>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct CoinGeckoClient {
    http: Client,
    base_url: String,
    api_key: Option<SecretString>,
    vs_currency: String,
    universe_size: u32,
    days: u32,
}

impl CoinGeckoClient {
    /// `days` is the lookback requested per coin, one point per day.
    pub fn new(
        api_key: Option<SecretString>,
        vs_currency: &str,
        universe_size: u32,
        days: u32,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("AOTS/0.1.0 (ma-tier-scanner)")
            .build()
            .context("Failed to build HTTP client for CoinGecko")?;

        Ok(Self {
            http,
            base_url: BASE_URL.to_string(),
            api_key,
            vs_currency: vs_currency.to_lowercase(),
            universe_size,
            days,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("x-cg-demo-api-key", key.expose_secret()),
            None => req,
        }
    }

    async fn fetch_markets_page(&self, page: u32, per_page: u32) -> Result<Vec<CoinMarket>> {
        let url = format!(
            "{}/coins/markets?vs_currency={}&order=market_cap_desc&per_page={per_page}&page={page}",
            self.base_url,
            urlencoding::encode(&self.vs_currency),
        );
        debug!(url = %url, "Fetching CoinGecko markets page");

        let resp = self
            .authed(self.http.get(&url))
            .send()
            .await
            .context("CoinGecko markets request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("CoinGecko API error {status}: {body}");
        }

        resp.json()
            .await
            .context("Failed to parse CoinGecko markets response")
    }
}

#[async_trait]
impl SymbolUniverse for CoinGeckoClient {
    async fn load_universe(&self) -> Result<Vec<Symbol>> {
        let mut coins = Vec::new();
        for (page, per_page) in pages(self.universe_size) {
            let batch = self.fetch_markets_page(page, per_page).await?;
            let short_page = (batch.len() as u32) < per_page;
            coins.extend(batch);
            if short_page {
                break;
            }
        }

        let symbols = coins_to_symbols(coins, self.universe_size as usize);
        info!(
            count = symbols.len(),
            vs = %self.vs_currency,
            "CoinGecko universe loaded"
        );
        Ok(symbols)
    }
}

#[async_trait]
impl CandleSource for CoinGeckoClient {
    async fn fetch_closes(&self, symbol: &Symbol) -> Result<Vec<f64>, FetchError> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency={}&days={}&interval=daily",
            self.base_url,
            urlencoding::encode(&symbol.id),
            urlencoding::encode(&self.vs_currency),
            self.days,
        );

        let resp = self
            .authed(self.http.get(&url))
            .send()
            .await
            .map_err(|e| http_error(SOURCE_NAME, e))?;
        let resp = check_status(SOURCE_NAME, resp).await?;

        let chart: MarketChart = resp.json().await.map_err(|e| FetchError::Parse {
            source_name: SOURCE_NAME.to_string(),
            message: e.to_string(),
        })?;

        let closes = closes_from_chart(chart)?;
        if closes.is_empty() {
            return Err(FetchError::Empty(symbol.id.clone()));
        }
        Ok(closes)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `(page, per_page)` requests needed to cover `total` coins.
fn pages(total: u32) -> Vec<(u32, u32)> {
    let per_page = total.min(MAX_PER_PAGE);
    if per_page == 0 {
        return Vec::new();
    }
    let count = total.div_ceil(per_page);
    (1..=count).map(|p| (p, per_page)).collect()
}

/// Keep the first `limit` coins, dropping duplicate ids.
fn coins_to_symbols(coins: Vec<CoinMarket>, limit: usize) -> Vec<Symbol> {
    let mut seen = std::collections::HashSet::new();
    coins
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .take(limit)
        .map(|c| Symbol::new(c.id, c.symbol.to_uppercase()))
        .collect()
}

/// Price points are already oldest first; a null price makes the series
/// unusable rather than silently shortening it.
fn closes_from_chart(chart: MarketChart) -> Result<Vec<f64>, FetchError> {
    chart
        .prices
        .into_iter()
        .map(|(ts, price)| {
            price.ok_or_else(|| FetchError::Parse {
                source_name: SOURCE_NAME.to_string(),
                message: format!("missing price at {ts}"),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
