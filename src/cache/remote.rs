// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::context::Cancellation;
use crate::cache::types::CertificateCache;
use crate::store::KvStore;
use crate::types::{CacheError, CacheOp, CancelReason, StoreError};

/// Joins the configured prefix and the caller's key. Hostnames and ACME
/// tokens never contain it.
pub const KEY_SEPARATOR: char = '/';

/// Certificate cache on top of a shared [`KvStore`].
///
/// Keys are stored as `prefix/key`, so several deployments can share one
/// store. Each call runs the store request on its own task and races it
/// against the cancellation token; a cancelled call returns right away and
/// leaves the request running detached.
#[derive(Clone)]
pub struct RemoteCertCache {
    store: Arc<dyn KvStore>,
    prefix: Arc<str>,
}

impl RemoteCertCache {
    pub fn new(store: Arc<dyn KvStore>, prefix: &str) -> Self {
        Self {
            store,
            prefix: Arc::from(prefix),
        }
    }

    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}{}", self.prefix, KEY_SEPARATOR, key)
    }

    fn prepare(&self, cancel: &Cancellation, op: CacheOp, key: &str) -> Result<String, CacheError> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }
        if let Some(reason) = cancel.reason() {
            debug!("cache {} key={} already cancelled: {}", op, key, reason);
            return Err(cancelled(op, key, reason));
        }
        let full_key = self.full_key(key);
        debug!("cache {} key={}", op, full_key);
        Ok(full_key)
    }

    /// Waits for whichever comes first: the store task or the token.
    async fn race<T>(
        &self,
        cancel: &Cancellation,
        op: CacheOp,
        key: &str,
        task: JoinHandle<Result<T, StoreError>>,
    ) -> Result<T, CacheError> {
        tokio::select! {
            biased;
            reason = cancel.cancelled() => {
                debug!("cache {} key={} cancelled: {}", op, key, reason);
                Err(cancelled(op, key, reason))
            }
            joined = task => {
                let source = match joined {
                    Ok(Ok(value)) => return Ok(value),
                    Ok(Err(source)) => source,
                    Err(e) => StoreError::Task { message: e.to_string() },
                };
                warn!(
                    "cache {} key={} failed code={}: {}",
                    op, key, source.error_code(), source
                );
                Err(CacheError::Store {
                    op,
                    key: key.to_string(),
                    source,
                })
            }
        }
    }
}

fn cancelled(op: CacheOp, key: &str, reason: CancelReason) -> CacheError {
    CacheError::Cancelled {
        op,
        key: key.to_string(),
        reason,
    }
}

#[async_trait]
impl CertificateCache for RemoteCertCache {
    async fn get(&self, cancel: &Cancellation, key: &str) -> Result<Vec<u8>, CacheError> {
        let full_key = self.prepare(cancel, CacheOp::Get, key)?;
        let store = self.store.clone();
        let task = tokio::spawn(async move { store.get(&full_key).await });

        match self.race(cancel, CacheOp::Get, key, task).await? {
            Some(data) => Ok(data),
            None => Err(CacheError::CacheMiss {
                key: key.to_string(),
            }),
        }
    }

    async fn put(&self, cancel: &Cancellation, key: &str, data: &[u8]) -> Result<(), CacheError> {
        let full_key = self.prepare(cancel, CacheOp::Put, key)?;
        let store = self.store.clone();
        let data = data.to_vec();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            // The store re-checks the token before every attempt, retries
            // included, so an abandoned put never reaches it.
            match store.set(&full_key, &data, &task_cancel).await {
                Ok(()) => Ok(None),
                Err(StoreError::Cancelled { reason }) => Ok(Some(reason)),
                Err(e) => Err(e),
            }
        });

        match self.race(cancel, CacheOp::Put, key, task).await? {
            Some(reason) => Err(cancelled(CacheOp::Put, key, reason)),
            None => Ok(()),
        }
    }

    async fn delete(&self, cancel: &Cancellation, key: &str) -> Result<(), CacheError> {
        let full_key = self.prepare(cancel, CacheOp::Delete, key)?;
        let store = self.store.clone();
        let task = tokio::spawn(async move { store.delete(&full_key).await });

        self.race(cancel, CacheOp::Delete, key, task).await
    }
}
