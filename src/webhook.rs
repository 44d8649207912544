// src/webhook.rs
use std::{fmt, str::FromStr, sync::Arc};

use serde_json::Value;
use tracing::{error, info, warn};

use crate::alert::{short_address, AlertDetails, AlertFormatter};
use crate::error::WebhookError;
use crate::freshness::FreshnessCheck;
use crate::models::TriggerTx;
use crate::notify::Notifier;
use crate::validator::TransferValidator;

/// Top-level body layout the webhook provider sends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WebhookShape {
    /// JSON array of events.
    #[default]
    Batch,
    /// Exactly one JSON object.
    Single,
}

impl WebhookShape {
    /// Split a decoded body into raw events.
    ///
    /// A batch body that is an object or a string carries no events. Scalars
    /// a batch cannot be walked over are rejected. In single mode the body is
    /// always one event and the validator decides what to make of it.
    pub fn events(self, body: Value) -> Result<Vec<Value>, WebhookError> {
        match (self, body) {
            (WebhookShape::Batch, Value::Array(events)) => Ok(events),
            (WebhookShape::Batch, other @ (Value::Object(_) | Value::String(_))) => {
                warn!(found = json_kind(&other), "⚠️ Batch body is not an array, no events");
                Ok(Vec::new())
            }
            (WebhookShape::Batch, other) => Err(WebhookError::UnexpectedShape {
                expected: WebhookShape::Batch,
                found: json_kind(&other),
            }),
            (WebhookShape::Single, event) => Ok(vec![event]),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl FromStr for WebhookShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batch" | "list" | "array" => Ok(WebhookShape::Batch),
            "single" | "object" => Ok(WebhookShape::Single),
            other => Err(format!("unknown webhook shape {other:?}")),
        }
    }
}

impl fmt::Display for WebhookShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WebhookShape::Batch => "batch",
            WebhookShape::Single => "single",
        })
    }
}

/// What happened to one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Ignored,
    KnownWallet,
    Alerted,
    AlertFailed,
}

/// Per-request counters reported back to the webhook caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub events: usize,
    pub alerts: usize,
}

/// Validator → freshness check → formatter → notifier, per event.
pub struct WebhookProcessor {
    validator: TransferValidator,
    checker: Arc<dyn FreshnessCheck>,
    notifier: Arc<dyn Notifier>,
    formatter: AlertFormatter,
    shape: WebhookShape,
    alert_known_wallets: bool,
}

impl WebhookProcessor {
    pub fn new(
        validator: TransferValidator,
        checker: Arc<dyn FreshnessCheck>,
        notifier: Arc<dyn Notifier>,
        formatter: AlertFormatter,
        shape: WebhookShape,
    ) -> Self {
        Self {
            validator,
            checker,
            notifier,
            formatter,
            shape,
            alert_known_wallets: false,
        }
    }

    /// Also alert on transfers to wallets that already have history.
    pub fn with_known_wallet_alerts(mut self, enabled: bool) -> Self {
        self.alert_known_wallets = enabled;
        self
    }

    /// Handle one webhook body. Only an undecodable body or the wrong
    /// top-level layout is an error; everything per-event is absorbed.
    pub async fn process(&self, body: &[u8]) -> Result<Summary, WebhookError> {
        let body: Value = serde_json::from_slice(body)?;
        let events = self.shape.events(body)?;

        let mut summary = Summary {
            events: events.len(),
            alerts: 0,
        };
        for raw in events {
            if self.process_event(raw).await == EventOutcome::Alerted {
                summary.alerts += 1;
            }
        }

        info!(events = summary.events, alerts = summary.alerts, "webhook processed");
        Ok(summary)
    }

    pub async fn process_event(&self, raw: Value) -> EventOutcome {
        let Some(event) = self.validator.parse_event(raw) else {
            return EventOutcome::Ignored;
        };

        let validation = self.validator.validate(&event);
        if !validation.is_valid {
            return EventOutcome::Ignored;
        }

        let trigger = TriggerTx::from_event(&event);
        let is_new = self
            .checker
            .is_new_wallet(&validation.recipient, &trigger)
            .await;
        if !is_new && !self.alert_known_wallets {
            return EventOutcome::KnownWallet;
        }

        let message = self.formatter.format(&AlertDetails {
            amount: validation.amount,
            sender: self.validator.monitored_wallet(),
            recipient: &validation.recipient,
            signature: event.signature(),
            timestamp: event.timestamp,
            is_new,
        });

        match self.notifier.send(&message).await {
            Ok(()) => {
                info!(
                    recipient = %short_address(&validation.recipient),
                    is_new,
                    "alert dispatched"
                );
                EventOutcome::Alerted
            }
            Err(e) => {
                error!(
                    recipient = %short_address(&validation.recipient),
                    error = %e,
                    "failed to send alert, dropping it"
                );
                EventOutcome::AlertFailed
            }
        }
    }
}
