// Shared fakes for unit tests.
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use axum::Router;

use crate::error::{NotifyError, ProviderError};
use crate::models::SignatureInfo;
use crate::notify::Notifier;
use crate::rpc::ChainProvider;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

enum Mode {
    MissingAccount,
    History,
    Failing,
    Stalled,
}

/// In-memory [`ChainProvider`] with a newest-first signature history.
pub struct FakeProvider {
    mode: Mode,
    history: Vec<SignatureInfo>,
    pages: AtomicUsize,
}

impl FakeProvider {
    fn new(mode: Mode, history: &[(&str, u64)]) -> Self {
        Self {
            mode,
            history: history
                .iter()
                .map(|(signature, slot)| SignatureInfo {
                    signature: signature.to_string(),
                    slot: *slot,
                    block_time: None,
                })
                .collect(),
            pages: AtomicUsize::new(0),
        }
    }

    pub fn missing_account() -> Self {
        Self::new(Mode::MissingAccount, &[])
    }

    pub fn with_history(history: &[(&str, u64)]) -> Self {
        Self::new(Mode::History, history)
    }

    pub fn failing() -> Self {
        Self::new(Mode::Failing, &[])
    }

    /// Ignores the `before` cursor and keeps returning the first page.
    pub fn stalled(history: &[(&str, u64)]) -> Self {
        Self::new(Mode::Stalled, history)
    }

    pub fn pages_requested(&self) -> usize {
        self.pages.load(Ordering::SeqCst)
    }

    fn outage() -> ProviderError {
        ProviderError::Status {
            status: 503,
            body: "service unavailable".into(),
        }
    }
}

#[async_trait]
impl ChainProvider for FakeProvider {
    async fn account_exists(&self, _address: &str) -> Result<bool, ProviderError> {
        match self.mode {
            Mode::MissingAccount => Ok(false),
            Mode::Failing => Err(Self::outage()),
            Mode::History | Mode::Stalled => Ok(true),
        }
    }

    async fn signatures_for_address(
        &self,
        _address: &str,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, ProviderError> {
        self.pages.fetch_add(1, Ordering::SeqCst);

        let start = match (&self.mode, before) {
            (Mode::Failing, _) => return Err(Self::outage()),
            (Mode::Stalled, _) | (_, None) => 0,
            (_, Some(cursor)) => self
                .history
                .iter()
                .position(|s| s.signature == cursor)
                .map_or(self.history.len(), |i| i + 1),
        };
        Ok(self.history.iter().skip(start).take(limit).cloned().collect())
    }

    async fn transaction_count(&self, _address: &str) -> Result<usize, ProviderError> {
        match self.mode {
            Mode::Failing => Err(Self::outage()),
            _ => Ok(self.history.len()),
        }
    }
}

/// [`Notifier`] that records every message instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(NotifyError::Rejected {
                status: 400,
                description: "Bad Request: chat not found".into(),
            });
        }
        Ok(())
    }
}
