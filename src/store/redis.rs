// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::future::Future;
use std::time::Duration;

use crate::cache::Cancellation;
use crate::store::traits::KvStore;
use crate::types::StoreError;
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisError, RedisResult};
use tracing::{debug, warn};

pub const MAX_RETRIES: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

pub struct RedisStore {
    client: redis::Client,
    max_retries: u32,
}

impl RedisStore {
    pub fn new(url: &str) -> Result<Self, StoreError> {
        debug!("Creating redis store with url: {}", url);
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Runs `command` on a fresh multiplexed connection, retrying transient
    /// connection failures up to `max_retries` times.
    ///
    /// With `cancel` set, the token is checked before every attempt and again
    /// once the connection is up, so no command is sent after it fired.
    async fn run<T, F, Fut>(
        &self,
        what: &str,
        key: &str,
        cancel: Option<&Cancellation>,
        command: F,
    ) -> Result<T, StoreError>
    where
        F: Fn(MultiplexedConnection) -> Fut + Send + Sync,
        Fut: Future<Output = RedisResult<T>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            abandon_if_cancelled(what, key, cancel)?;
            let result = match self.client.get_multiplexed_async_connection().await {
                Ok(connection) => {
                    abandon_if_cancelled(what, key, cancel)?;
                    command(connection).await
                }
                Err(e) => Err(e),
            };
            match result {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_retries && is_transient(&e) => {
                    attempt += 1;
                    warn!(
                        "Redis {} key={} failed (attempt {}/{}): {}",
                        what, key, attempt, self.max_retries, e
                    );
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn abandon_if_cancelled(
    what: &str,
    key: &str,
    cancel: Option<&Cancellation>,
) -> Result<(), StoreError> {
    match cancel.and_then(Cancellation::reason) {
        Some(reason) => {
            debug!("Redis {} key={} abandoned: {}", what, key, reason);
            Err(StoreError::Cancelled { reason })
        }
        None => Ok(()),
    }
}

fn is_transient(error: &RedisError) -> bool {
    error.is_io_error()
        || error.is_connection_dropped()
        || error.is_connection_refusal()
        || error.is_timeout()
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.run("GET", key, None, move |mut connection| async move {
            connection.get::<&str, Option<Vec<u8>>>(key).await
        })
        .await
    }

    async fn set(&self, key: &str, value: &[u8], cancel: &Cancellation) -> Result<(), StoreError> {
        self.run("SET", key, Some(cancel), move |mut connection| async move {
            connection.set::<&str, &[u8], ()>(key, value).await
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.run("DEL", key, None, move |mut connection| async move {
            connection.del::<&str, ()>(key).await
        })
        .await
    }
}
