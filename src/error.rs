// src/error.rs
use thiserror::Error;

use crate::webhook::WebhookShape;

/// Longest slice of an upstream response body kept in error messages.
pub const BODY_SNIPPET_CHARS: usize = 300;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Failures talking to the blockchain data provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed response ({source}): {body}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("pagination cursor did not advance past {0}")]
    StalledCursor(String),
}

impl ProviderError {
    /// Short name of the failure class, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Http(_) => "http",
            ProviderError::Status { .. } => "status",
            ProviderError::Rpc { .. } => "rpc",
            ProviderError::Decode { .. } => "decode",
            ProviderError::StalledCursor(_) => "stalled_cursor",
        }
    }
}

/// Failures delivering a chat alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bot api rejected message (HTTP {status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Handler-level failures. These are the only ones answered with HTTP 500.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("request body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("expected a {expected} payload, got {found}")]
    UnexpectedShape {
        expected: WebhookShape,
        found: &'static str,
    },
}

/// First [`BODY_SNIPPET_CHARS`] characters of a response body.
pub fn snippet(body: &str) -> String {
    let mut out: String = body.chars().take(BODY_SNIPPET_CHARS).collect();
    if out.len() < body.len() {
        out.push_str("...");
    }
    out
}
