//! Cancellation and deadline propagation.
//!
//! A [`Context`] is passed by reference to every collaborator call. Stages
//! race their I/O against [`Context::cancelled`] and abort with
//! [`GateError::Canceled`] when it resolves.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{GateError, GateResult};

/// Cancellation signal plus optional deadline.
#[derive(Debug, Clone, Default)]
pub struct Context {
    signal: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

/// Handle that cancels every [`Context`] derived from it.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Receivers may all be gone already; nothing to do then.
        let _ = self.tx.send(true);
    }
}

impl Context {
    /// Context that is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Context cancelled through the returned handle.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                signal: Some(rx),
                deadline: None,
            },
            CancelHandle { tx },
        )
    }

    /// Add a deadline `timeout` from now. An earlier existing deadline wins.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether cancellation or the deadline has already been observed.
    pub fn is_cancelled(&self) -> bool {
        let signalled = self.signal.as_ref().is_some_and(|rx| *rx.borrow());
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        signalled || expired
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        let signal = {
            let rx = self.signal.clone();
            async move {
                let Some(mut rx) = rx else {
                    return std::future::pending::<()>().await;
                };
                loop {
                    if *rx.borrow_and_update() {
                        return;
                    }
                    if rx.changed().await.is_err() {
                        // Handle dropped without cancelling.
                        return std::future::pending::<()>().await;
                    }
                }
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = signal => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => signal.await,
        }
    }

    /// Run `fut` unless the context is cancelled first.
    pub async fn run<T, F>(&self, fut: F) -> GateResult<T>
    where
        F: Future<Output = GateResult<T>>,
    {
        if self.is_cancelled() {
            return Err(GateError::Canceled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(GateError::Canceled),
            result = fut => result,
        }
    }
}
