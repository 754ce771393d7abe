//! Shutdown coordination for hosted routers.
//!
//! # Design Decisions
//! - Each `HttpServer::run` holds one receiver until it stops accepting connections
//! - `drain` triggers and then waits for those receivers to be released

use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Coordinator for graceful shutdown of one or more servers.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe a server (or any long-running task) to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber without waiting.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of subscribers that have not yet released their receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Trigger shutdown and wait until every subscriber has released its receiver.
    ///
    /// Returns `false` if subscribers remain after `timeout`.
    pub async fn drain(&self, timeout: Duration) -> bool {
        self.trigger();
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = self.receiver_count();
            if remaining == 0 {
                tracing::info!("All servers drained");
                return true;
            }
            if Instant::now() >= deadline {
                tracing::warn!(remaining, timeout_ms = timeout.as_millis() as u64, "Shutdown drain timed out");
                return false;
            }
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
