mod alert;
mod api;
mod config;
mod error;
mod freshness;
mod models;
mod notify;
mod rpc;
mod validator;
mod webhook;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::alert::AlertFormatter;
use crate::notify::TelegramNotifier;
use crate::rpc::HeliusClient;
use crate::validator::TransferValidator;
use crate::webhook::WebhookProcessor;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // RUST_LOG overrides the default info level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stdout)
        .with_target(false)
        .init();

    info!("Fresh wallet watcher starting...");

    // Missing or invalid configuration ends the process with a non-zero status
    let cfg = config::load().inspect_err(|e| error!("🚨 Configuration error: {}", e))?;
    info!("  Monitored wallet: {}", cfg.monitored_wallet);
    info!("  Amount band: {}", cfg.amount_band);
    info!("  Webhook shape: {}", cfg.webhook_shape);
    info!("  Freshness strategy: {}", cfg.freshness.strategy);

    let provider = Arc::new(HeliusClient::new(&cfg.provider)?);
    let checker = freshness::build(&cfg.freshness, provider);
    let notifier = Arc::new(TelegramNotifier::new(&cfg.telegram)?);

    let processor = WebhookProcessor::new(
        TransferValidator::new(cfg.monitored_wallet.clone(), cfg.amount_band),
        checker,
        notifier,
        AlertFormatter::new(cfg.alert.explorer_url.clone(), cfg.alert.timestamp_unit),
        cfg.webhook_shape,
    )
    .with_known_wallet_alerts(cfg.alert.alert_known_wallets);

    tokio::select! {
        res = api::serve(&cfg, Arc::new(processor)) => match res {
            Ok(()) => info!("Webhook listener exited cleanly"),
            Err(e) => {
                error!("Webhook listener error: {:?}", e);
                return Err(e);
            }
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    info!("Fresh wallet watcher stopped.");
    Ok(())
}
