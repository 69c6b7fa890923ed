// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

pub mod auth;
pub mod health;
pub mod log;
pub mod tls;


use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use poem::endpoint::BoxEndpoint;
use poem::listener::TcpListener;
use poem::middleware::Tracing;
use poem::{post, EndpointExt, Route, Server};
use tracing::info;

use crate::cache::{AcmeCache, RemoteCertCache};
use crate::config::Config;
use crate::shutdown::Shutdown;
use crate::store::open_store;

use self::auth::BasicAuth;
use self::log::{LogSink, StdoutSink};
use self::tls::AcmeTlsAcceptor;

const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// The log endpoint, behind basic auth when credentials are configured.
pub fn app(config: &Config, sink: Arc<dyn LogSink>) -> BoxEndpoint<'static> {
    let route = Route::new().at("/log", post(log::post_log)).data(sink);
    match config.credentials() {
        Some(credentials) => {
            info!("Configuring HTTP Auth access control");
            route
                .with(BasicAuth::new(&config.http_realm, credentials))
                .with(Tracing)
                .boxed()
        }
        None => route.with(Tracing).boxed(),
    }
}

/// Runs the log endpoint until shutdown, over ACME TLS when `ssl` is set.
pub async fn start(config: &Config, shutdown: &Shutdown) -> Result<()> {
    let app = app(config, Arc::new(StdoutSink::new()));
    let listen = config.listen();

    if config.ssl {
        info!("Starting SSL AutoTLS service on {}", listen);
        let store = open_store(&config.redis_url)?;
        let cache = RemoteCertCache::new(store, &config.redis_prefix);
        let cache = AcmeCache::new(cache, shutdown.cancellation(), config.cache_timeout());
        let state = tls::acme_state(config, cache);
        let acceptor = AcmeTlsAcceptor::bind(&listen, state, shutdown.cancellation()).await?;
        Server::new_with_acceptor(acceptor)
            .run_with_graceful_shutdown(app, shutdown.signal(), Some(GRACEFUL_SHUTDOWN_TIMEOUT))
            .await?;
    } else {
        info!("Starting server on {}", listen);
        Server::new(TcpListener::bind(listen))
            .run_with_graceful_shutdown(app, shutdown.signal(), Some(GRACEFUL_SHUTDOWN_TIMEOUT))
            .await?;
    }

    info!("Server stopped");
    Ok(())
}
