// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

use async_trait::async_trait;

use crate::cache::context::Cancellation;
use crate::types::CacheError;

/// Persistence used by the automatic TLS certificate manager.
///
/// `get` distinguishes a missing key ([`CacheError::CacheMiss`]) from a
/// broken store, and every call returns [`CacheError::Cancelled`] as soon as
/// the token fires.
#[async_trait]
pub trait CertificateCache: Send + Sync {
    async fn get(&self, cancel: &Cancellation, key: &str) -> Result<Vec<u8>, CacheError>;
    async fn put(&self, cancel: &Cancellation, key: &str, data: &[u8]) -> Result<(), CacheError>;
    async fn delete(&self, cancel: &Cancellation, key: &str) -> Result<(), CacheError>;
}
