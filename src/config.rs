use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::{
    env,
    fmt::Display,
    net::{IpAddr, Ipv4Addr},
    str::FromStr,
    time::Duration,
};
use tracing::info;

use crate::alert::{TimestampUnit, DEFAULT_EXPLORER_URL};
use crate::error::ConfigError;
use crate::freshness::{
    FreshnessConfig, FreshnessStrategy, DEFAULT_PAGE_DELAY, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use crate::notify::{
    TelegramConfig, DEFAULT_RETRY_DELAY, DEFAULT_TELEGRAM_API_URL, DEFAULT_TIMEOUT, MAX_RETRIES,
};
use crate::rpc::{ProviderConfig, DEFAULT_API_URL, DEFAULT_RPC_URL};
use crate::validator::AmountBand;
use crate::webhook::WebhookShape;

pub const DEFAULT_PORT: u16 = 5003;

#[derive(Debug, Clone)]
pub struct AlertConfig {
    pub explorer_url: String,
    pub timestamp_unit: TimestampUnit,
    pub alert_known_wallets: bool,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub monitored_wallet: String,
    pub amount_band: AmountBand,
    pub webhook_shape: WebhookShape,
    pub freshness: FreshnessConfig,
    pub provider: ProviderConfig,
    pub telegram: TelegramConfig,
    pub alert: AlertConfig,
}

/// Load from the process environment (and `.env`, if present).
pub fn load() -> Result<Config, ConfigError> {
    dotenv().ok();

    let cfg = from_lookup(|name| env::var(name).ok())?;
    info!("Loaded config: {:?}", cfg);

    Ok(cfg)
}

/// Build a [`Config`] from any variable source. Blank values count as unset.
pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let vars = Vars(lookup);

    let low: Decimal = vars.required_parse("MIN_AMOUNT_SOL")?;
    let high: Decimal = vars.required_parse("MAX_AMOUNT_SOL")?;
    let amount_band = AmountBand::new(low, high).map_err(|reason| ConfigError::Invalid {
        name: "MAX_AMOUNT_SOL",
        value: high.to_string(),
        reason,
    })?;

    let page_size: usize = vars.parse_or("SIGNATURE_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ConfigError::Invalid {
            name: "SIGNATURE_PAGE_SIZE",
            value: page_size.to_string(),
            reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
        });
    }

    let notify_retries: u32 = vars.parse_or("NOTIFY_RETRIES", 0)?;
    if notify_retries > MAX_RETRIES {
        return Err(ConfigError::Invalid {
            name: "NOTIFY_RETRIES",
            value: notify_retries.to_string(),
            reason: format!("must be at most {MAX_RETRIES}"),
        });
    }

    let rpc_timeout = vars
        .parse::<u64>("RPC_TIMEOUT_SECS")?
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);

    Ok(Config {
        bind_addr: vars.parse_or("BIND_ADDR", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
        port: vars.parse_or("PORT", DEFAULT_PORT)?,
        monitored_wallet: vars.required("MONITORED_WALLET")?,
        amount_band,
        webhook_shape: vars.parse_or("WEBHOOK_SHAPE", WebhookShape::default())?,
        freshness: FreshnessConfig {
            strategy: vars.parse_or("FRESHNESS_STRATEGY", FreshnessStrategy::default())?,
            page_size,
            page_delay: vars.millis_or("PAGE_DELAY_MS", DEFAULT_PAGE_DELAY)?,
        },
        provider: ProviderConfig {
            rpc_url: vars.get("HELIUS_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            api_url: vars.get("HELIUS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: vars.required("HELIUS_API_KEY")?,
            timeout: rpc_timeout,
        },
        telegram: TelegramConfig {
            api_url: vars
                .get("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            bot_token: vars.required("TELEGRAM_BOT_TOKEN")?,
            chat_id: vars.required("TELEGRAM_CHAT_ID")?,
            timeout: Duration::from_secs(
                vars.parse_or("NOTIFY_TIMEOUT_SECS", DEFAULT_TIMEOUT.as_secs())?,
            ),
            retries: notify_retries,
            retry_delay: vars.millis_or("NOTIFY_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY)?,
        },
        alert: AlertConfig {
            explorer_url: vars
                .get("EXPLORER_URL")
                .unwrap_or_else(|| DEFAULT_EXPLORER_URL.to_string()),
            timestamp_unit: vars.parse_or("TIMESTAMP_UNIT", TimestampUnit::default())?,
            alert_known_wallets: vars.parse_or("ALERT_KNOWN_WALLETS", false)?,
        },
    })
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn parse<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.get(name)
            .map(|raw| {
                raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                    name,
                    value: raw.clone(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    fn required_parse<T>(&self, name: &'static str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.parse(name)?.ok_or(ConfigError::Missing(name))
    }

    fn parse_or<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        Ok(self.parse(name)?.unwrap_or(default))
    }

    fn millis_or(&self, name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
        Ok(self
            .parse::<u64>(name)?
            .map(Duration::from_millis)
            .unwrap_or(default))
    }
}
