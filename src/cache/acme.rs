// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

//! Plugs a [`CertificateCache`] into `tokio-rustls-acme`.
//!
//! Certificates and ACME accounts are stored under `cert_<digest>` and
//! `account_<digest>`, where the digest is the unpadded url-safe base64 of
//! SHA-256 over the NUL separated domain (or contact) list followed by the
//! directory url.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use tokio_rustls_acme::{AccountCache, CertCache};
use tracing::{info, warn};

use crate::cache::context::Cancellation;
use crate::cache::types::CertificateCache;
use crate::types::CacheError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AcmeCache<C> {
    cache: C,
    shutdown: Cancellation,
    timeout: Duration,
}

impl<C: CertificateCache> AcmeCache<C> {
    /// Every call gets a token derived from `shutdown` that also expires
    /// after `timeout`.
    pub fn new(cache: C, shutdown: Cancellation, timeout: Duration) -> Self {
        Self {
            cache,
            shutdown,
            timeout,
        }
    }

    pub fn cert_key(domains: &[String], directory_url: &str) -> String {
        digest_key("cert", domains, directory_url)
    }

    pub fn account_key(contact: &[String], directory_url: &str) -> String {
        digest_key("account", contact, directory_url)
    }

    /// Drops a cached certificate, e.g. after it was revoked.
    pub async fn forget_cert(
        &self,
        domains: &[String],
        directory_url: &str,
    ) -> Result<(), CacheError> {
        let key = Self::cert_key(domains, directory_url);
        self.cache.delete(&self.call_token(), &key).await?;
        info!("Removed cached certificate for {}", domains.join(","));
        Ok(())
    }

    fn call_token(&self) -> Cancellation {
        self.shutdown.child_with_timeout(self.timeout)
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        match self.cache.get(&self.call_token(), key).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.is_miss() => Ok(None),
            Err(e) => {
                warn!("Could not load {} code={}: {}", key, e.error_code(), e);
                Err(e)
            }
        }
    }

    async fn store(&self, key: &str, data: &[u8]) -> Result<(), CacheError> {
        self.cache
            .put(&self.call_token(), key, data)
            .await
            .inspect_err(|e| warn!("Could not store {} code={}: {}", key, e.error_code(), e))
    }
}

fn digest_key(kind: &str, parts: &[String], directory_url: &str) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hasher.update(directory_url.as_bytes());
    format!("{}_{}", kind, URL_SAFE_NO_PAD.encode(hasher.finalize()))
}

#[async_trait]
impl<C: CertificateCache> CertCache for AcmeCache<C> {
    type EC = CacheError;

    async fn load_cert(
        &self,
        domains: &[String],
        directory_url: &str,
    ) -> Result<Option<Vec<u8>>, Self::EC> {
        let key = Self::cert_key(domains, directory_url);
        let cert = self.load(&key).await?;
        if cert.is_none() {
            info!("No cached certificate for {}", domains.join(","));
        }
        Ok(cert)
    }

    async fn store_cert(
        &self,
        domains: &[String],
        directory_url: &str,
        cert: &[u8],
    ) -> Result<(), Self::EC> {
        let key = Self::cert_key(domains, directory_url);
        self.store(&key, cert).await?;
        info!("Cached certificate for {}", domains.join(","));
        Ok(())
    }
}

#[async_trait]
impl<C: CertificateCache> AccountCache for AcmeCache<C> {
    type EA = CacheError;

    async fn load_account(
        &self,
        contact: &[String],
        directory_url: &str,
    ) -> Result<Option<Vec<u8>>, Self::EA> {
        let key = Self::account_key(contact, directory_url);
        self.load(&key).await
    }

    async fn store_account(
        &self,
        contact: &[String],
        directory_url: &str,
        account: &[u8],
    ) -> Result<(), Self::EA> {
        let key = Self::account_key(contact, directory_url);
        self.store(&key, account).await
    }
}
