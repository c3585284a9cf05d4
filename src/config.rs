//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! field has a default, so a missing section falls back to the stock AOTS
//! setup (daily candles, 20/50/100 MAs, hourly scans).
//!
//! Secrets (Discord token, exchange keys) are referenced by env-var name
//! in the config and resolved once at startup into [`Secrets`].

use anyhow::{anyhow, bail, Context, Result};
use chrono_tz::Tz;
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

/// Discord limits a single embed to 25 fields of at most 1024 characters.
pub const DISCORD_MAX_FIELDS: usize = 25;
pub const DISCORD_MAX_FIELD_CHARS: usize = 1024;

/// Binance rejects kline requests above this `limit`.
pub const BINANCE_MAX_KLINES: u32 = 1000;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub data_source: DataSourceConfig,
    pub discord: DiscordConfig,
    pub report: ReportConfig,
    pub health: HealthConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScannerConfig {
    /// Candle interval requested from the data source ("1d").
    pub timeframe: String,
    /// Number of candles fetched per symbol.
    pub candle_limit: u32,
    /// Short, medium and long moving-average windows.
    pub windows: [usize; 3],
    /// Sleep between the end of one cycle and the start of the next.
    pub scan_interval_secs: u64,
    /// Pacing floor between two symbols. Unset means the provider default.
    pub request_delay_ms: Option<u64>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            timeframe: "1d".into(),
            candle_limit: 150,
            windows: [20, 50, 100],
            scan_interval_secs: 3600,
            request_delay_ms: None,
        }
    }
}

/// Which candle source binding this deployment uses.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Binance,
    Coingecko,
}

impl Provider {
    /// Pacing used when `scanner.request_delay_ms` is unset.
    pub fn default_request_delay(self) -> Duration {
        match self {
            Provider::Binance => Duration::from_millis(50),
            // Public tier: ~30 calls/minute.
            Provider::Coingecko => Duration::from_millis(2100),
        }
    }

    /// Shortest pacing that stays inside the provider's rate limit.
    pub fn min_request_delay(self) -> Duration {
        match self {
            // 6000 weight/minute, klines cost 2.
            Provider::Binance => Duration::from_millis(20),
            Provider::Coingecko => Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataSourceConfig {
    pub provider: Provider,
    /// Quote asset filter for the Binance universe, stripped for display.
    pub quote_asset: String,
    pub api_key_env: String,
    pub api_secret_env: String,
    pub coingecko: CoinGeckoConfig,
}

impl Default for DataSourceConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Binance,
            quote_asset: "USDT".into(),
            api_key_env: "BINANCE_API_KEY".into(),
            api_secret_env: "BINANCE_API_SECRET".into(),
            coingecko: CoinGeckoConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CoinGeckoConfig {
    pub vs_currency: String,
    /// Number of coins (by market cap) making up the universe.
    pub universe_size: u32,
    /// Optional demo API key; the public API works without one.
    pub api_key_env: String,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            vs_currency: "usd".into(),
            universe_size: 250,
            api_key_env: "COINGECKO_API_KEY".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DiscordConfig {
    pub token_env: String,
    pub channel_id_env: String,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token_env: "DISCORD_TOKEN".into(),
            channel_id_env: "DISCORD_CHANNEL_ID".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
    /// Overrides the description derived from the MA windows.
    pub description: Option<String>,
    /// Field label ("TIER 2", "TIER 2 (part 3)").
    pub label: String,
    /// Prepended to every packed chunk.
    pub prefix: String,
    pub color: u32,
    /// IANA timezone used for the title timestamp.
    pub timezone: String,
    pub timezone_label: String,
    pub max_chunk_chars: usize,
    pub max_chunks: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Automated AOTS Spot Setups".into(),
            description: None,
            label: "TIER 2".into(),
            prefix: "🟢 ".into(),
            color: 0x00ff00,
            timezone: "Asia/Manila".into(),
            timezone_label: "Manila Time".into(),
            max_chunk_chars: 1000,
            max_chunks: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HealthConfig {
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Secrets resolved from the environment at startup.
pub struct Secrets {
    pub discord_token: SecretString,
    pub discord_channel_id: u64,
    pub data_source: DataSourceSecrets,
}

pub enum DataSourceSecrets {
    Binance {
        api_key: SecretString,
        api_secret: SecretString,
    },
    CoinGecko {
        api_key: Option<SecretString>,
    },
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file: {path}"))
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).context("Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the scan pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        let [short, medium, long] = self.scanner.windows;
        if short == 0 || !(short < medium && medium < long) {
            bail!(
                "scanner.windows must be non-zero and strictly increasing, got {:?}",
                self.scanner.windows
            );
        }
        if self.scanner.candle_limit == 0 {
            bail!("scanner.candle_limit must be greater than zero");
        }
        if self.data_source.provider == Provider::Binance
            && self.scanner.candle_limit > BINANCE_MAX_KLINES
        {
            bail!(
                "scanner.candle_limit must be at most {BINANCE_MAX_KLINES} for Binance, got {}",
                self.scanner.candle_limit
            );
        }
        let floor = self.data_source.provider.min_request_delay();
        if self.request_delay() < floor {
            bail!(
                "scanner.request_delay_ms must be at least {} for {:?}, got {}",
                floor.as_millis(),
                self.data_source.provider,
                self.request_delay().as_millis()
            );
        }
        if self.scanner.timeframe.trim().is_empty() {
            bail!("scanner.timeframe must not be empty");
        }
        if !(1..=DISCORD_MAX_FIELDS).contains(&self.report.max_chunks) {
            bail!(
                "report.max_chunks must be between 1 and {DISCORD_MAX_FIELDS}, got {}",
                self.report.max_chunks
            );
        }
        if !(1..=DISCORD_MAX_FIELD_CHARS).contains(&self.report.max_chunk_chars) {
            bail!(
                "report.max_chunk_chars must be between 1 and {DISCORD_MAX_FIELD_CHARS}, got {}",
                self.report.max_chunk_chars
            );
        }
        if self.report.prefix.chars().count() >= self.report.max_chunk_chars {
            bail!("report.prefix does not leave room for any symbol");
        }
        self.timezone()?;
        if self.data_source.provider == Provider::Coingecko
            && self.data_source.coingecko.universe_size == 0
        {
            bail!("data_source.coingecko.universe_size must be greater than zero");
        }
        Ok(())
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.report
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Unknown report.timezone {}: {e}", self.report.timezone))
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scanner.scan_interval_secs)
    }

    pub fn request_delay(&self) -> Duration {
        self.scanner
            .request_delay_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| self.data_source.provider.default_request_delay())
    }

    /// Liveness port; hosting platforms inject `PORT`, which wins.
    pub fn health_port(&self) -> Result<u16> {
        match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {raw}")),
            Err(_) => Ok(self.health.port),
        }
    }

    /// Report description, derived from the windows unless overridden.
    pub fn report_description(&self) -> String {
        if let Some(desc) = &self.report.description {
            return desc.clone();
        }
        let [short, medium, long] = self.scanner.windows;
        let market = match self.data_source.provider {
            Provider::Binance => format!("{} Spot Market", self.data_source.quote_asset),
            Provider::Coingecko => format!(
                "Top {} by market cap ({})",
                self.data_source.coingecko.universe_size,
                self.data_source.coingecko.vs_currency.to_uppercase()
            ),
        };
        format!("**🎯 Tier 2 (AOTS)**\n{short}MA > {medium}MA > {long}MA\n{market}")
    }

    /// Resolve all required secrets from the process environment.
    pub fn resolve_secrets(&self) -> Result<Secrets> {
        self.resolve_secrets_with(|name| std::env::var(name).ok())
    }

    /// Resolve secrets through an arbitrary lookup (used by tests).
    pub fn resolve_secrets_with<F>(&self, lookup: F) -> Result<Secrets>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |env_name: &str| -> Result<String> {
            lookup(env_name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("Environment variable not set: {env_name}"))
        };

        let discord_token = SecretString::new(require(&self.discord.token_env)?);
        let raw_channel = require(&self.discord.channel_id_env)?;
        let discord_channel_id = raw_channel.parse::<u64>().with_context(|| {
            format!(
                "{} is not a valid Discord channel id: {raw_channel}",
                self.discord.channel_id_env
            )
        })?;

        let data_source = match self.data_source.provider {
            Provider::Binance => DataSourceSecrets::Binance {
                api_key: SecretString::new(require(&self.data_source.api_key_env)?),
                api_secret: SecretString::new(require(&self.data_source.api_secret_env)?),
            },
            Provider::Coingecko => DataSourceSecrets::CoinGecko {
                api_key: require(&self.data_source.coingecko.api_key_env)
                    .ok()
                    .map(SecretString::new),
            },
        };

        Ok(Secrets {
            discord_token,
            discord_channel_id,
            data_source,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
