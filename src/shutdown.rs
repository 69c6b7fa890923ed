// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use anyhow::Result;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use crate::cache::Cancellation;

/// Process wide shutdown signal.
///
/// Both listeners stop gracefully once it fires, and every certificate cache
/// call derived from [`Shutdown::cancellation`] returns as cancelled.
pub struct Shutdown {
    cancel: Cancellation,
}

impl Shutdown {
    pub fn new() -> Self {
        Self {
            cancel: Cancellation::new(),
        }
    }

    /// Root token; derive per call tokens from it.
    pub fn cancellation(&self) -> Cancellation {
        self.cancel.clone()
    }

    pub fn shutdown(&self) {
        info!("Shutdown signal received, stopping server...");
        self.cancel.cancel();
    }

    /// Future for poem's graceful shutdown.
    pub fn signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let cancel = self.cancel.clone();
        async move {
            cancel.cancelled().await;
        }
    }

    pub fn enable_shutdown_with_signals(&self) -> Result<()> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("SIGTERM received, shutting down..."),
                _ = sigint.recv() => info!("SIGINT received, shutting down..."),
            }
            cancel.cancel();
        });
        Ok(())
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
