// src/validator.rs
use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::alert::short_address;
use crate::models::TransferEvent;

/// Lamports carry nine decimal places of SOL.
pub const LAMPORT_DECIMALS: u32 = 9;

/// Exact lamports → SOL conversion.
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(lamports), LAMPORT_DECIMALS)
}

/// Closed interval of SOL amounts that qualify for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountBand {
    pub low: Decimal,
    pub high: Decimal,
}

impl AmountBand {
    pub fn new(low: Decimal, high: Decimal) -> Result<Self, String> {
        if low.is_sign_negative() {
            return Err(format!("lower bound {low} is negative"));
        }
        if low > high {
            return Err(format!("lower bound {low} exceeds upper bound {high}"));
        }
        Ok(Self { low, high })
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        self.low <= amount && amount <= self.high
    }
}

impl fmt::Display for AmountBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}] SOL", self.low, self.high)
    }
}

impl FromStr for AmountBand {
    type Err = String;

    /// Parses `low..high`, mostly handy in tests.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (low, high) = s
            .split_once("..")
            .ok_or_else(|| format!("expected low..high, got {s:?}"))?;
        let low = Decimal::from_str(low.trim()).map_err(|e| e.to_string())?;
        let high = Decimal::from_str(high.trim()).map_err(|e| e.to_string())?;
        Self::new(low, high)
    }
}

/// Outcome of checking one event against the monitored wallet and band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub amount: Decimal, // SOL
    pub recipient: String,
}

impl ValidationResult {
    pub fn matched(amount: Decimal, recipient: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            amount,
            recipient: recipient.into(),
        }
    }

    pub fn no_match() -> Self {
        Self {
            is_valid: false,
            amount: Decimal::ZERO,
            recipient: String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferValidator {
    monitored_wallet: String,
    band: AmountBand,
}

impl TransferValidator {
    pub fn new(monitored_wallet: impl Into<String>, band: AmountBand) -> Self {
        Self {
            monitored_wallet: monitored_wallet.into(),
            band,
        }
    }

    pub fn monitored_wallet(&self) -> &str {
        &self.monitored_wallet
    }

    /// Decode a raw event. Anything that does not fit the event model is
    /// logged and skipped rather than failing the request.
    pub fn parse_event(&self, raw: Value) -> Option<TransferEvent> {
        match serde_json::from_value::<TransferEvent>(raw) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "skipping malformed transfer event");
                None
            }
        }
    }

    /// First transfer out of the monitored wallet whose amount lies in the band.
    pub fn validate(&self, event: &TransferEvent) -> ValidationResult {
        for transfer in event.transfers() {
            if transfer.from_user_account != self.monitored_wallet {
                continue;
            }

            let amount = lamports_to_sol(transfer.amount);
            if !self.band.contains(amount) {
                debug!(%amount, band = %self.band, "outbound transfer outside amount band");
                continue;
            }

            info!(
                amount = %amount.round_dp(2),
                recipient = %short_address(&transfer.to_user_account),
                signature = event.signature(),
                "valid transfer"
            );
            return ValidationResult::matched(amount, transfer.to_user_account);
        }

        ValidationResult::no_match()
    }
}
