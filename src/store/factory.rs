// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use std::sync::Arc;

use tracing::info;

use crate::store::memory::MemoryStore;
use crate::store::redis::RedisStore;
use crate::store::traits::KvStore;
use crate::types::StoreError;

/// Opens the store a connection string points at. `redis://` and `rediss://`
/// go to redis, `memory://` keeps everything in process.
pub fn open_store(url: &str) -> Result<Arc<dyn KvStore>, StoreError> {
    let scheme = url.split("://").next().unwrap_or_default();
    let store: Arc<dyn KvStore> = match scheme {
        "redis" | "rediss" | "redis+unix" | "unix" => Arc::new(RedisStore::new(url)?),
        "memory" => Arc::new(MemoryStore::new()),
        _ => {
            return Err(StoreError::UnsupportedUrl {
                url: url.to_string(),
            })
        }
    };
    info!("Opened {} store", scheme);
    Ok(store)
}
