// (C) Coralbits SL 2025
// This file is part of Betterlog and is licensed under the
// GNU Affero General Public License v3.0.
// A commercial license on request is also available;
// contact info@coralbits.com for details.

pub mod cache;
pub mod config;
pub mod server;
pub mod shutdown;
pub mod store;
pub mod types;
pub mod utils;

pub use cache::{AcmeCache, Cancellation, CertificateCache, RemoteCertCache, KEY_SEPARATOR};
pub use config::*;
pub use shutdown::*;
pub use store::{open_store, KvStore, MemoryStore, RedisStore};
pub use types::*;
