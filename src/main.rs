// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::sync::Arc;

use betterlog::server::{self, health};
use betterlog::{utils, Config, Shutdown};
use clap::Parser;
use tracing::error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    utils::setup_logging(config.debug)?;
    config.validate()?;

    let shutdown = Shutdown::new();
    shutdown.enable_shutdown_with_signals()?;

    let healthz_listen = config.healthz_listen();
    let healthz_signal = shutdown.signal();
    let healthz = tokio::spawn(async move {
        let check = Arc::new(health::AlwaysHealthy);
        if let Err(e) =
            health::start(&healthz_listen, check, utils::hostname(), healthz_signal).await
        {
            error!("Health check listener failed: {}", e);
        }
    });

    let result = server::start(&config, &shutdown).await;
    // the health listener follows the main server down
    shutdown.shutdown();
    let _ = healthz.await;
    result
}
