// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

pub fn setup_logging(debug: bool) -> anyhow::Result<()> {
    let log_level = if debug { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        // stdout carries the relayed log lines, so our own tracing goes to stderr
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Name reported by the health endpoint.
pub fn hostname() -> String {
    if let Ok(hostname) = std::env::var("HOSTNAME") {
        if !hostname.trim().is_empty() {
            return hostname.trim().to_string();
        }
    }
    match std::fs::read_to_string("/etc/hostname") {
        Ok(hostname) if !hostname.trim().is_empty() => hostname.trim().to_string(),
        _ => "unknown".to_string(),
    }
}
