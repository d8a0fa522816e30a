//! Cooperative cancellation for network work.

use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinError;

use crate::error::{Error, Result};

/// Owner side: call [`abort`](Self::abort) to cancel every linked signal.
#[derive(Debug)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: Some(self.tx.subscribe()),
        }
    }

    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for AbortHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side, cloned into every task.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl AbortSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_aborted(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolves once aborted; pends forever otherwise.
    pub async fn aborted(&self) {
        if let Some(rx) = &self.rx {
            let mut rx = rx.clone();
            if rx.wait_for(|aborted| *aborted).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }

    /// Run `work` unless aborted first. Abort drops `work` mid-flight.
    pub async fn run<T, F>(&self, work: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.is_aborted() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.aborted() => Err(Error::Cancelled),
            result = work => result,
        }
    }
}

/// Map a failed join: panics propagate, cancellation becomes `Cancelled`.
pub(crate) fn join_error(error: JoinError) -> Error {
    if error.is_panic() {
        std::panic::resume_unwind(error.into_panic());
    }
    Error::Cancelled
}
