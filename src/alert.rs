// src/alert.rs
use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub const DEFAULT_EXPLORER_URL: &str = "https://solscan.io";

/// Epoch unit used by the webhook provider for `timestamp`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampUnit {
    #[default]
    Seconds,
    Millis,
}

impl TimestampUnit {
    pub fn to_datetime(self, value: i64) -> Option<DateTime<Utc>> {
        match self {
            TimestampUnit::Seconds => DateTime::from_timestamp(value, 0),
            TimestampUnit::Millis => DateTime::from_timestamp_millis(value),
        }
    }
}

impl FromStr for TimestampUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "seconds" => Ok(TimestampUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(TimestampUnit::Millis),
            other => Err(format!("unknown timestamp unit {other:?}")),
        }
    }
}

impl fmt::Display for TimestampUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimestampUnit::Seconds => "seconds",
            TimestampUnit::Millis => "millis",
        })
    }
}

/// `H8sMJS...3WjS`. Short inputs are returned as-is.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Everything the alert template needs about one qualifying transfer.
#[derive(Debug, Clone)]
pub struct AlertDetails<'a> {
    pub amount: Decimal,
    pub sender: &'a str,
    pub recipient: &'a str,
    pub signature: &'a str,
    pub timestamp: Option<i64>,
    pub is_new: bool,
}

#[derive(Debug, Clone)]
pub struct AlertFormatter {
    explorer_url: String,
    timestamp_unit: TimestampUnit,
}

impl AlertFormatter {
    pub fn new(explorer_url: impl Into<String>, timestamp_unit: TimestampUnit) -> Self {
        let explorer_url = explorer_url.into().trim_end_matches('/').to_string();
        Self {
            explorer_url,
            timestamp_unit,
        }
    }

    fn format_time(&self, timestamp: Option<i64>) -> String {
        timestamp
            .and_then(|t| self.timestamp_unit.to_datetime(t))
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Render the chat message (Telegram HTML parse mode).
    pub fn format(&self, details: &AlertDetails<'_>) -> String {
        let marker = if details.is_new { " (🆕 NEW WALLET)" } else { "" };

        format!(
            "🚨 SUSPICIOUS TRANSACTION DETECTED\n\
             • Amount: {:.2} SOL\n\
             • From: {}\n\
             • To: {}{}\n\
             • Time: {}\n\
             • Wallet: {}/account/{}\n\
             • TX: {}/tx/{}",
            details.amount.round_dp(2),
            escape_html(&short_address(details.sender)),
            escape_html(&short_address(details.recipient)),
            marker,
            self.format_time(details.timestamp),
            self.explorer_url,
            escape_html(details.recipient),
            self.explorer_url,
            escape_html(details.signature),
        )
    }
}

impl Default for AlertFormatter {
    fn default() -> Self {
        Self::new(DEFAULT_EXPLORER_URL, TimestampUnit::Seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENDER: &str = "H8sMJSCQxfKiFTCfDR3DUMLPwcRbM61LGFJ8N4dK3WjS";
    const RECIPIENT: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

    fn details(is_new: bool, timestamp: Option<i64>) -> AlertDetails<'static> {
        AlertDetails {
            amount: Decimal::new(2_000_000_000, 9),
            sender: SENDER,
            recipient: RECIPIENT,
            signature: "5VERYLONGSIGNATURE",
            timestamp,
            is_new,
        }
    }

    #[test]
    fn shortens_addresses() {
        assert_eq!(short_address(SENDER), "H8sMJS...3WjS");
        assert_eq!(short_address("short"), "short");
        assert_eq!(short_address("0123456789"), "0123456789");
    }

    #[test]
    fn renders_new_wallet_alert() {
        let msg = AlertFormatter::default().format(&details(true, Some(1_700_000_000)));

        assert!(msg.contains("• Amount: 2.00 SOL"));
        assert!(msg.contains("• From: H8sMJS...3WjS"));
        assert!(msg.contains("• To: 9xQeWv...VFin (🆕 NEW WALLET)"));
        assert!(msg.contains("• Time: 2023-11-14 22:13:20 UTC"));
        assert!(msg.contains(&format!("https://solscan.io/account/{RECIPIENT}")));
        assert!(msg.contains("https://solscan.io/tx/5VERYLONGSIGNATURE"));
    }

    #[test]
    fn omits_marker_for_known_wallets() {
        let msg = AlertFormatter::default().format(&details(false, None));
        assert!(!msg.contains("NEW WALLET"));
        assert!(msg.contains("• Time: unknown"));
    }

    #[test]
    fn rounds_amount_to_two_places() {
        let mut d = details(true, None);
        d.amount = Decimal::new(1_234_567_890, 9);
        let msg = AlertFormatter::default().format(&d);
        assert!(msg.contains("1.23 SOL"));
    }

    #[test]
    fn millisecond_timestamps_and_custom_explorer() {
        let formatter = AlertFormatter::new("https://explorer.example/", TimestampUnit::Millis);
        let msg = formatter.format(&details(true, Some(1_700_000_000_000)));
        assert!(msg.contains("2023-11-14 22:13:20 UTC"));
        assert!(msg.contains("https://explorer.example/tx/5VERYLONGSIGNATURE"));
    }

    #[test]
    fn escapes_markup_from_webhook_fields() {
        let mut d = details(true, None);
        d.signature = "a<b>&c";
        d.recipient = "<i>";
        let msg = AlertFormatter::default().format(&d);

        assert!(msg.contains("https://solscan.io/tx/a&lt;b&gt;&amp;c"));
        assert!(msg.contains("• To: &lt;i&gt; (🆕 NEW WALLET)"));
        assert!(!msg.contains("<i>"));
    }

    #[test]
    fn parses_units() {
        assert_eq!("ms".parse::<TimestampUnit>().unwrap(), TimestampUnit::Millis);
        assert_eq!("Seconds".parse::<TimestampUnit>().unwrap(), TimestampUnit::Seconds);
        assert!("minutes".parse::<TimestampUnit>().is_err());
    }
}
