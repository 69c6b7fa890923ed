// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use async_trait::async_trait;

use crate::cache::Cancellation;
use crate::types::StoreError;

/// A network reachable key-value store.
///
/// `get` returns `Ok(None)` when the key is absent, and `delete` of an absent
/// key is not an error. `set` must check `cancel` right before every attempt
/// it issues, retries included, and return [`StoreError::Cancelled`] instead
/// of writing once it has fired.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
    async fn set(&self, key: &str, value: &[u8], cancel: &Cancellation) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
