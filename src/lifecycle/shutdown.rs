//! Shutdown coordination for a mint run.

use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that long-running loops subscribe to.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
            triggered: false,
            closed: false,
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of live subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half held by a run loop.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
    triggered: bool,
    /// Every `Shutdown` handle is gone, so no signal can arrive.
    closed: bool,
}

impl ShutdownSignal {
    /// Whether shutdown has been requested, without waiting.
    pub fn is_triggered(&mut self) -> bool {
        if !self.triggered && !self.closed {
            match self.rx.try_recv() {
                Ok(()) | Err(TryRecvError::Lagged(_)) => self.triggered = true,
                Err(TryRecvError::Closed) => self.closed = true,
                Err(TryRecvError::Empty) => {}
            }
        }
        self.triggered
    }

    /// Sleep for `duration` unless shutdown arrives first.
    ///
    /// Returns `true` if the full duration elapsed.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }

        let sleep = tokio::time::sleep(duration);
        tokio::pin!(sleep);
        loop {
            tokio::select! {
                _ = &mut sleep => return true,
                res = self.rx.recv(), if !self.closed => match res {
                    Ok(()) | Err(RecvError::Lagged(_)) => {
                        self.triggered = true;
                        return false;
                    }
                    Err(RecvError::Closed) => self.closed = true,
                },
            }
        }
    }
}
