// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

//! TLS listener with certificates from ACME (TLS-ALPN-01).
//!
//! Handshakes run on their own tasks so a slow client never holds up the
//! accept loop; finished streams are handed to poem through a channel.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use poem::http::uri::Scheme;
use poem::listener::Acceptor;
use poem::web::{LocalAddr, RemoteAddr};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use rustls::ServerConfig;
use tokio_rustls_acme::tokio_rustls::server::TlsStream;
use tokio_rustls_acme::{AcmeAcceptor, AcmeConfig, AcmeState, ResolvesServerCertAcme};
use tracing::{debug, error, info, warn};

use crate::cache::{AcmeCache, Cancellation, RemoteCertCache};
use crate::config::Config;
use crate::types::CacheError;

const PENDING_CONNECTIONS: usize = 128;
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);
/// Time a client gets to finish the TLS handshake, challenges included.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

pub type CertState = AcmeState<CacheError, CacheError>;

/// Certificate manager state for the configured domains, persisting through
/// `cache`. Nothing talks to the CA until the state is polled.
pub fn acme_state(config: &Config, cache: AcmeCache<RemoteCertCache>) -> CertState {
    AcmeConfig::new(config.domains())
        .contact(config.acme_contact.iter().filter(|c| !c.trim().is_empty()))
        .cache(cache)
        .directory_lets_encrypt(config.acme_production)
        .state()
}

pub fn server_config(resolver: Arc<ResolvesServerCertAcme>) -> anyhow::Result<Arc<ServerConfig>> {
    let mut config =
        ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_no_client_auth()
            .with_cert_resolver(resolver);
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(Arc::new(config))
}

pub struct AcmeTlsAcceptor {
    local_addr: SocketAddr,
    incoming: mpsc::Receiver<(TlsStream<TcpStream>, SocketAddr)>,
}

impl AcmeTlsAcceptor {
    /// Binds `listen` and starts driving certificate issuance and renewal
    /// until `shutdown` fires.
    pub async fn bind(
        listen: &str,
        state: CertState,
        shutdown: Cancellation,
    ) -> anyhow::Result<Self> {
        let tls_config = server_config(state.resolver())?;
        let acme_acceptor = Arc::new(state.acceptor());
        tokio::spawn(drive_state(state, shutdown.clone()));

        let listener = TcpListener::bind(listen).await?;
        let local_addr = listener.local_addr()?;
        let (tx, incoming) = mpsc::channel(PENDING_CONNECTIONS);
        tokio::spawn(accept_loop(listener, acme_acceptor, tls_config, tx, shutdown));

        info!("TLS listener bound to {}", local_addr);
        Ok(Self {
            local_addr,
            incoming,
        })
    }
}

async fn drive_state(state: CertState, shutdown: Cancellation) {
    let mut state = Box::pin(state);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = state.next() => match event {
                Some(Ok(ok)) => info!("acme event: {:?}", ok),
                Some(Err(err)) => error!("acme error: {:?}", err),
                None => break,
            },
        }
    }
    debug!("Stopped certificate manager");
}

/// Answers a TLS-ALPN-01 challenge or completes the TLS handshake on `tcp`,
/// failing with [`io::ErrorKind::TimedOut`] once `limit` passes. Challenge
/// connections give `Ok(None)`.
pub async fn handshake(
    acme_acceptor: &AcmeAcceptor,
    tls_config: Arc<ServerConfig>,
    tcp: TcpStream,
    limit: Duration,
) -> io::Result<Option<TlsStream<TcpStream>>> {
    let handshake = async {
        match acme_acceptor.accept(tcp).await? {
            Some(start) => start.into_stream(tls_config).await.map(Some),
            None => Ok(None),
        }
    };
    tokio::time::timeout(limit, handshake).await?
}

async fn accept_loop(
    listener: TcpListener,
    acme_acceptor: Arc<AcmeAcceptor>,
    tls_config: Arc<ServerConfig>,
    tx: mpsc::Sender<(TlsStream<TcpStream>, SocketAddr)>,
    shutdown: Cancellation,
) {
    loop {
        let (tcp, remote) = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Error accepting connection: {}", e);
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    continue;
                }
            },
        };

        let acme_acceptor = acme_acceptor.clone();
        let tls_config = tls_config.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            match handshake(&acme_acceptor, tls_config, tcp, HANDSHAKE_TIMEOUT).await {
                Ok(Some(stream)) => {
                    if tx.send((stream, remote)).await.is_err() {
                        debug!("Listener closed, dropping connection from {}", remote);
                    }
                }
                Ok(None) => info!("Answered TLS-ALPN-01 challenge from {}", remote),
                Err(e) => debug!("TLS handshake with {} failed: {}", remote, e),
            }
        });
    }
    debug!("Stopped accepting TLS connections");
}

impl Acceptor for AcmeTlsAcceptor {
    type Io = TlsStream<TcpStream>;

    fn local_addr(&self) -> Vec<LocalAddr> {
        vec![LocalAddr(self.local_addr.into())]
    }

    async fn accept(&mut self) -> io::Result<(Self::Io, LocalAddr, RemoteAddr, Scheme)> {
        match self.incoming.recv().await {
            Some((stream, remote)) => Ok((
                stream,
                LocalAddr(self.local_addr.into()),
                RemoteAddr(remote.into()),
                Scheme::HTTPS,
            )),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "TLS listener stopped",
            )),
        }
    }
}
