// src/freshness.rs
use std::{fmt, str::FromStr, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::alert::short_address;
use crate::error::ProviderError;
use crate::models::{SignatureInfo, TriggerTx};
use crate::rpc::ChainProvider;

pub const DEFAULT_PAGE_SIZE: usize = 100;
pub const MAX_PAGE_SIZE: usize = 1000;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(300);

/// Decides whether a recipient has any history before the triggering
/// transaction.
#[async_trait]
pub trait FreshnessCheck: Send + Sync {
    fn name(&self) -> &'static str;

    /// Raw check; upstream failures are returned to the caller.
    async fn check(&self, address: &str, trigger: &TriggerTx) -> Result<bool, ProviderError>;

    /// Fail-closed wrapper around [`FreshnessCheck::check`]: any error is
    /// logged and reported as "not new".
    async fn is_new_wallet(&self, address: &str, trigger: &TriggerTx) -> bool {
        info!(wallet = %short_address(address), strategy = self.name(), "🔎 Freshness check");

        match self.check(address, trigger).await {
            Ok(is_new) => is_new,
            Err(e) => {
                error!(
                    strategy = self.name(),
                    wallet = %address,
                    kind = e.kind(),
                    error = %e,
                    "freshness check failed, treating wallet as known"
                );
                false
            }
        }
    }
}

/// Which [`FreshnessCheck`] implementation to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FreshnessStrategy {
    #[default]
    SignatureScan,
    HistoryCount,
}

impl FromStr for FreshnessStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "signature-scan" | "scan" => Ok(FreshnessStrategy::SignatureScan),
            "history-count" | "count" => Ok(FreshnessStrategy::HistoryCount),
            other => Err(format!("unknown freshness strategy {other:?}")),
        }
    }
}

impl fmt::Display for FreshnessStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FreshnessStrategy::SignatureScan => "signature-scan",
            FreshnessStrategy::HistoryCount => "history-count",
        })
    }
}

#[derive(Debug, Clone)]
pub struct FreshnessConfig {
    pub strategy: FreshnessStrategy,
    pub page_size: usize,
    pub page_delay: Duration,
}

impl Default for FreshnessConfig {
    fn default() -> Self {
        Self {
            strategy: FreshnessStrategy::default(),
            page_size: DEFAULT_PAGE_SIZE,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// Build the configured strategy on top of `provider`.
pub fn build(cfg: &FreshnessConfig, provider: Arc<dyn ChainProvider>) -> Arc<dyn FreshnessCheck> {
    match cfg.strategy {
        FreshnessStrategy::SignatureScan => Arc::new(SignatureScan::new(
            provider,
            cfg.page_size,
            cfg.page_delay,
        )),
        FreshnessStrategy::HistoryCount => Arc::new(HistoryCount::new(provider)),
    }
}

/// Walks the whole signature history looking for anything older than the
/// trigger.
pub struct SignatureScan {
    provider: Arc<dyn ChainProvider>,
    page_size: usize,
    page_delay: Duration,
}

impl SignatureScan {
    pub fn new(provider: Arc<dyn ChainProvider>, page_size: usize, page_delay: Duration) -> Self {
        Self {
            provider,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            page_delay,
        }
    }
}

/// A record counts as prior history when it is a different transaction in
/// an earlier slot. Without a trigger slot every other transaction counts.
fn predates(record: &SignatureInfo, trigger: &TriggerTx) -> bool {
    if record.signature == trigger.signature {
        return false;
    }
    match trigger.slot {
        Some(slot) => record.slot < slot,
        None => true,
    }
}

#[async_trait]
impl FreshnessCheck for SignatureScan {
    fn name(&self) -> &'static str {
        "signature-scan"
    }

    async fn check(&self, address: &str, trigger: &TriggerTx) -> Result<bool, ProviderError> {
        if !self.provider.account_exists(address).await? {
            info!(wallet = %short_address(address), "✅ Brand new wallet (no account exists)");
            return Ok(true);
        }

        let mut before: Option<String> = None;
        let mut pages = 0usize;
        let mut scanned = 0usize;

        loop {
            sleep(self.page_delay).await; // upstream rate limit

            let page = self
                .provider
                .signatures_for_address(address, before.as_deref(), self.page_size)
                .await?;
            let Some(last) = page.last() else { break };

            pages += 1;
            scanned += page.len();
            debug!(page = pages, records = page.len(), cursor = ?before, "signature page");

            if let Some(prior) = page.iter().find(|r| predates(r, trigger)) {
                info!(
                    wallet = %short_address(address),
                    signature = %short_address(&prior.signature),
                    slot = prior.slot,
                    block_time = ?prior.block_time,
                    "🚫 Found older transaction"
                );
                return Ok(false);
            }

            if before.as_deref() == Some(last.signature.as_str()) {
                return Err(ProviderError::StalledCursor(last.signature.clone()));
            }
            before = Some(last.signature.clone());
        }

        info!(wallet = %short_address(address), pages, scanned, "✅ No older transactions found");
        Ok(true)
    }
}

/// Treats any history at all as "not new".
///
/// This cannot tell the triggering transaction apart from real history: if
/// the provider already indexes the trigger, every wallet reads as known.
pub struct HistoryCount {
    provider: Arc<dyn ChainProvider>,
}

impl HistoryCount {
    pub fn new(provider: Arc<dyn ChainProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl FreshnessCheck for HistoryCount {
    fn name(&self) -> &'static str {
        "history-count"
    }

    async fn check(&self, address: &str, _trigger: &TriggerTx) -> Result<bool, ProviderError> {
        let count = self.provider.transaction_count(address).await?;
        debug!(wallet = %short_address(address), count, "transaction history size");
        Ok(count == 0)
    }
}
