//! Periodic reachability checks for the configured provider.

use crate::gateway::Gateway;
use gateway_core::{ConnectionStatus, ProviderConfig, ProviderKind};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Polling interval used for the local provider.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Background task publishing the [`ConnectionStatus`] of one configuration.
///
/// Every provider is checked once at start. The local provider is polled
/// afterwards, since a model server started later should be noticed; hosted
/// providers are only re-checked through [`ConnectionMonitor::check_now`].
#[derive(Debug)]
pub struct ConnectionMonitor {
    status: watch::Receiver<ConnectionStatus>,
    recheck: tokio::sync::mpsc::Sender<()>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ConnectionMonitor {
    /// Spawn the monitor on the current runtime.
    pub fn start(gateway: Gateway, config: ProviderConfig, interval: Duration) -> Self {
        let (status_tx, status) = watch::channel(ConnectionStatus::Checking);
        let (recheck, mut recheck_rx) = tokio::sync::mpsc::channel(1);
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let polls = config.provider == ProviderKind::Local;

        let handle = tokio::spawn(async move {
            info!(provider = %config.provider, polls, interval = ?interval, "Connection monitor started");

            loop {
                status_tx.send_replace(ConnectionStatus::Checking);

                let probe = tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    probe = gateway.verify(&config) => probe,
                };

                let next = ConnectionStatus::from(&probe);
                let previous = status_tx.send_replace(next);
                debug!(status = %next, previous = %previous, message = %probe.message, "Connection checked");

                let wait = async {
                    if polls {
                        tokio::time::sleep(interval).await;
                    } else {
                        std::future::pending::<()>().await;
                    }
                };

                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = recheck_rx.recv() => {}
                    () = wait => {}
                }
            }

            info!("Connection monitor stopped");
        });

        Self {
            status,
            recheck,
            cancel,
            handle: Some(handle),
        }
    }

    /// Latest published status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Receiver that observes every status change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    /// Request an immediate re-check.
    ///
    /// Requests made while one is already queued are coalesced.
    pub fn check_now(&self) {
        let _ = self.recheck.try_send(());
    }

    /// Stop polling. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether [`ConnectionMonitor::stop`] has been called.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop polling and wait for the task to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                debug!(error = %err, "Connection monitor task ended abnormally");
            }
        }
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
